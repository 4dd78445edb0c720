//! Surface registry: the ordered set of live surfaces.
//!
//! Registration order is hit-test order, so it decides exact distance
//! ties. Handles come from a per-registry counter and are never reused.

use tracing::{debug, info};

use super::scene::{Mat4, Vec3};
use super::surface::{Placement, Surface, SurfaceHandle, SurfaceKind};
use crate::error::WorldError;

pub struct SurfaceRegistry {
    surfaces: Vec<Surface>,
    next_handle: u32,
    world_per_pixel: f32,
}

impl SurfaceRegistry {
    /// `world_per_pixel` converts device pixels into world units for every
    /// surface created through this registry.
    pub fn new(world_per_pixel: f32) -> Self {
        Self {
            surfaces: Vec::new(),
            next_handle: 1,
            world_per_pixel,
        }
    }

    pub fn world_per_pixel(&self) -> f32 {
        self.world_per_pixel
    }

    /// Allocate a fresh handle. Also used for the tray, which lives
    /// outside the ordered list but shares the handle space.
    pub fn allocate_handle(&mut self) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Register a root surface at `position`.
    pub fn create(
        &mut self,
        kind: SurfaceKind,
        pixel_width: u32,
        pixel_height: u32,
        position: Vec3,
    ) -> SurfaceHandle {
        let handle = self.allocate_handle();
        let mut surface = Surface::new(handle, kind, pixel_width, pixel_height, self.world_per_pixel);
        surface.set_transform(Mat4::translation(position.x, position.y, position.z));
        self.surfaces.push(surface);
        info!(
            "surface {} ({}) created: {}x{} px",
            handle,
            kind.as_str(),
            pixel_width,
            pixel_height
        );
        handle
    }

    /// Register a surface attached to `placement.parent`.
    ///
    /// `display_density` converts the placement's dp size into device
    /// pixels; `world_dpi_ratio` converts dp offsets into world units.
    pub fn attach(
        &mut self,
        placement: Placement,
        callback_id: i32,
        display_density: f32,
        world_dpi_ratio: f32,
    ) -> Result<SurfaceHandle, WorldError> {
        let parent = self
            .get(placement.parent)
            .ok_or(WorldError::UnknownParent(placement.parent))?;
        let parent_transform = *parent.transform();
        let parent_world = parent.world_size();

        let pixel_width = (placement.width * display_density) as u32;
        let pixel_height = (placement.height * display_density) as u32;

        let handle = self.allocate_handle();
        let mut surface = Surface::new(
            handle,
            placement.kind,
            pixel_width,
            pixel_height,
            self.world_per_pixel,
        );
        let (world_width, world_height) = surface.world_size();
        let offset = placement.offset(parent_world, world_width, world_height, world_dpi_ratio);
        surface.set_transform(parent_transform.mul(&Mat4::translation(offset.x, offset.y, offset.z)));
        surface.set_placement(placement, callback_id);
        self.surfaces.push(surface);

        info!(
            "surface {} ({}) attached to {}: {}x{} px",
            handle,
            placement.kind.as_str(),
            placement.parent,
            pixel_width,
            pixel_height
        );
        Ok(handle)
    }

    /// Detach and drop a surface. Its handle stays retired.
    pub fn remove(&mut self, handle: SurfaceHandle) -> Result<Surface, WorldError> {
        let pos = self
            .surfaces
            .iter()
            .position(|s| s.handle() == handle)
            .ok_or(WorldError::UnknownSurface(handle))?;
        let surface = self.surfaces.remove(pos);
        info!("surface {} removed", handle);
        Ok(surface)
    }

    pub fn set_visible(&mut self, handle: SurfaceHandle, visible: bool) -> Result<(), WorldError> {
        let surface = self
            .get_mut(handle)
            .ok_or(WorldError::UnknownSurface(handle))?;
        surface.set_visible(visible);
        debug!("surface {} visible={}", handle, visible);
        Ok(())
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&Surface> {
        self.find(|s| s.handle() == handle)
    }

    pub fn get_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|s| s.handle() == handle)
    }

    pub fn find(&self, condition: impl Fn(&Surface) -> bool) -> Option<&Surface> {
        self.surfaces.iter().find(|s| condition(*s))
    }

    /// Surfaces in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.surfaces.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::scene::Vec2;

    fn menu_on(parent: SurfaceHandle) -> Placement {
        Placement {
            parent,
            kind: SurfaceKind::MoreMenu,
            width: 100.0,
            height: 40.0,
            anchor: Vec2::new(0.5, 0.5),
            parent_anchor: Vec2::new(0.5, 0.5),
            translation: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    #[test]
    fn test_handles_are_unique_and_not_reused() {
        let mut registry = SurfaceRegistry::new(0.01);
        let a = registry.create(SurfaceKind::Browser, 200, 100, Vec3::ZERO);
        let b = registry.create(SurfaceKind::UrlBar, 200, 50, Vec3::ZERO);
        assert_ne!(a, b);

        registry.remove(b).unwrap();
        let c = registry.create(SurfaceKind::UrlBar, 200, 50, Vec3::ZERO);
        assert_ne!(c, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_attach_requires_parent() {
        let mut registry = SurfaceRegistry::new(0.01);
        let result = registry.attach(menu_on(SurfaceHandle(99)), 7, 1.0, 0.01);
        assert_eq!(result, Err(WorldError::UnknownParent(SurfaceHandle(99))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_scales_size_and_follows_parent() {
        let mut registry = SurfaceRegistry::new(0.01);
        let parent = registry.create(SurfaceKind::Browser, 200, 100, Vec3::new(0.0, 0.0, -5.0));
        let child = registry.attach(menu_on(parent), 7, 2.0, 0.01).unwrap();

        let surface = registry.get(child).unwrap();
        assert_eq!(surface.pixel_size(), (200, 80));
        assert_eq!(surface.callback_id(), 7);
        let origin = surface.transform().get_translation();
        // Centered on the parent, pushed 10dp * 0.01 toward the viewer.
        assert!((origin - Vec3::new(0.0, 0.0, -4.9)).length() < 1e-5, "{:?}", origin);
    }

    #[test]
    fn test_remove_unknown_is_error() {
        let mut registry = SurfaceRegistry::new(0.01);
        assert!(registry.remove(SurfaceHandle(3)).is_err());
        assert!(registry.set_visible(SurfaceHandle(3), false).is_err());
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let mut registry = SurfaceRegistry::new(0.01);
        let a = registry.create(SurfaceKind::Browser, 10, 10, Vec3::ZERO);
        let b = registry.create(SurfaceKind::UrlBar, 10, 10, Vec3::ZERO);
        let order: Vec<_> = registry.iter().map(|s| s.handle()).collect();
        assert_eq!(order, vec![a, b]);
    }
}
