//! Interactive rectangular surfaces (widgets) placed in the 3D scene.
//!
//! A surface has a pixel resolution and a world-space size derived from
//! it through a fixed world/pixel ratio. Its rectangle is centered on its
//! transform origin, facing +Z.

use std::fmt;

use super::ray::{ray_quad_intersection, QuadHit, Ray};
use super::scene::{Mat4, Vec2, Vec3};

/// Stable identifier of a registered surface. `SurfaceHandle::NONE` (0)
/// never names a live surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SurfaceHandle(pub u32);

impl SurfaceHandle {
    pub const NONE: Self = Self(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Surface kind ─────────────────────────────────────────────

/// What a surface shows. The numeric codes are shared with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Browser,
    UrlBar,
    MoreMenu,
    Tray,
}

impl SurfaceKind {
    pub fn code(self) -> i32 {
        match self {
            Self::Browser => 0,
            Self::UrlBar => 1,
            Self::MoreMenu => 2,
            Self::Tray => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Browser),
            1 => Some(Self::UrlBar),
            2 => Some(Self::MoreMenu),
            3 => Some(Self::Tray),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::UrlBar => "url-bar",
            Self::MoreMenu => "more-menu",
            Self::Tray => "tray",
        }
    }
}

// ── Placement ────────────────────────────────────────────────

/// Request to attach a new surface relative to an existing one.
///
/// Sizes and the offset are in density-independent pixels. Anchors are
/// normalized: (0, 0) is the bottom-left corner, (1, 1) the top-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub parent: SurfaceHandle,
    pub kind: SurfaceKind,
    pub width: f32,
    pub height: f32,
    pub anchor: Vec2,
    pub parent_anchor: Vec2,
    pub translation: Vec3,
}

impl Placement {
    /// Local offset of a `world_width` x `world_height` child from the
    /// parent's origin, in world units.
    pub fn offset(
        &self,
        parent_world: (f32, f32),
        world_width: f32,
        world_height: f32,
        world_dpi_ratio: f32,
    ) -> Vec3 {
        let (parent_width, parent_height) = parent_world;
        let mut offset = self.translation * world_dpi_ratio;
        // Child anchor onto the origin
        offset = offset
            - Vec3::new(
                (self.anchor.x - 0.5) * world_width,
                (self.anchor.y - 0.5) * world_height,
                0.0,
            );
        // Origin onto the parent anchor
        offset
            + Vec3::new(
                (self.parent_anchor.x - 0.5) * parent_width,
                (self.parent_anchor.y - 0.5) * parent_height,
                0.0,
            )
    }
}

// ── Surface ──────────────────────────────────────────────────

/// A rectangular interactive plane.
#[derive(Debug, Clone)]
pub struct Surface {
    handle: SurfaceHandle,
    kind: SurfaceKind,
    transform: Mat4,
    pixel_width: u32,
    pixel_height: u32,
    world_per_pixel: f32,
    visible: bool,
    pointer_active: bool,
    placement: Option<Placement>,
    callback_id: i32,
}

impl Surface {
    pub fn new(
        handle: SurfaceHandle,
        kind: SurfaceKind,
        pixel_width: u32,
        pixel_height: u32,
        world_per_pixel: f32,
    ) -> Self {
        Self {
            handle,
            kind,
            transform: Mat4::IDENTITY,
            pixel_width,
            pixel_height,
            world_per_pixel,
            visible: true,
            pointer_active: false,
            placement: None,
            callback_id: 0,
        }
    }

    pub fn handle(&self) -> SurfaceHandle {
        self.handle
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }

    pub fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.pixel_width = width;
        self.pixel_height = height;
    }

    /// World-space size, always pixel size x world/pixel ratio.
    pub fn world_size(&self) -> (f32, f32) {
        (
            self.pixel_width as f32 * self.world_per_pixel,
            self.pixel_height as f32 * self.world_per_pixel,
        )
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_pointer_active(&self) -> bool {
        self.pointer_active
    }

    /// Highlight toggle for the next draw. Has no effect on hit testing.
    pub fn set_pointer_active(&mut self, active: bool) {
        self.pointer_active = active;
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub(crate) fn set_placement(&mut self, placement: Placement, callback_id: i32) {
        self.placement = Some(placement);
        self.callback_id = callback_id;
    }

    pub fn callback_id(&self) -> i32 {
        self.callback_id
    }

    /// Intersect a controller ray with this surface. Hidden surfaces never
    /// intersect.
    pub fn test_intersection(&self, ray: &Ray) -> Option<QuadHit> {
        if !self.visible {
            return None;
        }
        let (width, height) = self.world_size();
        ray_quad_intersection(ray, &self.transform, width, height)
    }

    /// Map a world point lying on the surface to pixel coordinates,
    /// (0, 0) at the top-left corner.
    pub fn to_local(&self, world_point: Vec3) -> Vec2 {
        let (width, height) = self.world_size();
        if width <= 0.0 || height <= 0.0 {
            return Vec2::ZERO;
        }
        let Some(inverse) = self.transform.inverse() else {
            return Vec2::ZERO;
        };
        let local = inverse.transform_point(world_point);

        let u = ((local.x + width * 0.5) / width).clamp(0.0, 1.0);
        let v = ((height * 0.5 - local.y) / height).clamp(0.0, 1.0); // Y-flip for screen coordinates
        Vec2::new(u * self.pixel_width as f32, v * self.pixel_height as f32)
    }
}

// ── Tests ────────────────────────────────────────────────────
