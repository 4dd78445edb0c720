//! Controller rays and ray/rectangle intersection.
//!
//! Rectangles are planar quads centered on their transform origin,
//! spanning [-w/2, w/2] x [-h/2, h/2] in the local XY plane (normal +Z).

use super::scene::{Mat4, Vec3};

/// Below this local-space direction component the ray is treated as
/// parallel to the surface plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A ray in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray cast by a controller: the pose applied to the local origin,
    /// pointing along the pose's local forward (-Z).
    pub fn from_pose(pose: &Mat4) -> Self {
        Self::new(
            pose.transform_point(Vec3::ZERO),
            pose.transform_direction(Vec3::FORWARD),
        )
    }
}

/// Result of a ray reaching the plane of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadHit {
    /// World-space intersection with the plane.
    pub point: Vec3,
    /// Whether `point` lies inside the rectangle bounds.
    pub within_bounds: bool,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Intersect `ray` with the plane of a `width` x `height` rectangle placed
/// by `transform`.
///
/// Returns `None` when the ray is parallel to the plane, the plane lies
/// behind the origin, the rectangle has no area, or `transform` is
/// singular. A plane hit outside the rectangle is reported with
/// `within_bounds == false`.
pub fn ray_quad_intersection(
    ray: &Ray,
    transform: &Mat4,
    width: f32,
    height: f32,
) -> Option<QuadHit> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    // Transform ray into surface-local space
    let inv_model = transform.inverse()?;
    let local_origin = inv_model.transform_point(ray.origin);
    let local_dir = inv_model.transform_direction(ray.direction);

    // Ray-plane intersection: plane is Z=0, normal is (0,0,1)
    if local_dir.z.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t_local = -local_origin.z / local_dir.z;
    if t_local < 0.0 {
        return None; // Intersection behind ray
    }

    let local_hit = local_origin + local_dir * t_local;
    let hw = width * 0.5;
    let hh = height * 0.5;
    let within_bounds =
        local_hit.x >= -hw && local_hit.x <= hw && local_hit.y >= -hh && local_hit.y <= hh;

    let point = transform.transform_point(Vec3::new(local_hit.x, local_hit.y, 0.0));
    let distance = (point - ray.origin).length();

    Some(QuadHit {
        point,
        within_bounds,
        distance,
    })
}

// ── Tests ────────────────────────────────────────────────────
