//! World: owns the surfaces, the controllers, the tray and the device,
//! and drives one interaction pass per frame.

use tracing::{debug, info, warn};

use crate::config::WorldConfig;
use crate::device::DeviceDelegate;
use crate::event::{EventSink, WorldEvent};
use crate::vr::controller::ControllerContainer;
use crate::vr::interaction::InteractionResolver;
use crate::vr::registry::SurfaceRegistry;
use crate::vr::scene::Quat;
use crate::vr::surface::{Placement, SurfaceHandle, SurfaceKind};
use crate::vr::tray::Tray;

/// Callback id reported for surfaces the world creates on its own.
pub const NO_CALLBACK: i32 = -1;

pub struct World<S: EventSink> {
    config: WorldConfig,
    resolver: InteractionResolver,
    registry: SurfaceRegistry,
    controllers: ControllerContainer,
    tray: Option<Tray>,
    device: Option<Box<dyn DeviceDelegate>>,
    sink: S,
    paused: bool,
    initialized: bool,
    frame: u64,
}

impl<S: EventSink> World<S> {
    /// A new world starts paused, with no device and no surfaces.
    pub fn new(config: WorldConfig, sink: S) -> Self {
        let resolver = InteractionResolver::new(config.scroll_factor, config.far_clip);
        let registry = SurfaceRegistry::new(config.world_per_pixel());
        Self {
            config,
            resolver,
            registry,
            controllers: ControllerContainer::new(),
            tray: None,
            device: None,
            sink,
            paused: true,
            initialized: false,
            frame: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Create the default windows, the controller visuals and the tray.
    /// Later calls do nothing.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let windows = [
            (SurfaceKind::Browser, self.config.browser.clone()),
            (SurfaceKind::UrlBar, self.config.url_bar.clone()),
        ];
        for (kind, window) in windows {
            let width = self.config.to_pixels(window.width);
            let height = self.config.to_pixels(window.height);
            let surface = self.registry.create(kind, width, height, window.position());
            self.sink.send(WorldEvent::SurfaceCreated {
                kind,
                surface,
                width,
                height,
                callback_id: NO_CALLBACK,
            });
        }

        if let Some(device) = self.device.as_ref() {
            for index in 0..device.controller_model_count() {
                if let Some(name) = device.controller_model_name(index) {
                    self.controllers.set_model_name(index, Some(name));
                }
            }
        }
        self.controllers.create_pointer_beam();

        let tray_config = &self.config.tray;
        let mut tray = Tray::new(
            self.registry.allocate_handle(),
            tray_config.pixel_width,
            tray_config.pixel_height,
            tray_config.world_per_pixel(),
        );
        tray.set_transform(tray_config.transform());
        self.tray = Some(tray);

        self.initialized = true;
        info!("world initialized: {} surfaces", self.registry.len());
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Install a device, or detach the current one with `None`.
    ///
    /// Detaching resets every controller slot and releases the previous
    /// device's hold on them. The previous device is handed back.
    pub fn register_device(
        &mut self,
        device: Option<Box<dyn DeviceDelegate>>,
    ) -> Option<Box<dyn DeviceDelegate>> {
        let mut previous = self.device.take();
        match device {
            Some(mut device) => {
                device.set_clip_planes(self.config.near_clip, self.config.far_clip);
                self.device = Some(device);
                info!("device registered");
            }
            None => {
                if let Some(previous) = previous.as_mut() {
                    self.controllers.reset_all();
                    previous.release_controller_delegate();
                    info!("device released");
                }
            }
        }
        previous
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn pause(&mut self) {
        self.paused = true;
        info!("world paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        info!("world resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of frames actually processed.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Run one frame: poll the device, resolve controller interaction
    /// and publish the listener pose.
    pub fn frame(&mut self) {
        let Some(device) = self.device.as_mut() else {
            debug!("frame skipped: no device");
            return;
        };
        if self.paused {
            debug!("frame skipped: paused");
            return;
        }

        self.frame += 1;
        self.sink.begin_frame(self.frame);
        device.process_events(&mut self.controllers);
        self.resolver.resolve(
            &mut self.controllers,
            &mut self.registry,
            self.tray.as_mut(),
            device.gestures(),
            &mut self.sink,
        );

        if self.config.audio_pose {
            let head = device.head_transform();
            self.sink.send(WorldEvent::HeadPose {
                orientation: Quat::from_mat4(&head),
                position: head.get_translation(),
            });
        }
    }

    /// Attach a new surface to an existing one. Returns `None` (and
    /// emits nothing) when the parent is unknown.
    pub fn add_surface(&mut self, placement: Placement, callback_id: i32) -> Option<SurfaceHandle> {
        match self.registry.attach(
            placement,
            callback_id,
            self.config.display_density,
            self.config.world_dpi_ratio,
        ) {
            Ok(surface) => {
                let (width, height) = self
                    .registry
                    .get(surface)
                    .map(|s| s.pixel_size())
                    .unwrap_or_default();
                self.sink.send(WorldEvent::SurfaceCreated {
                    kind: placement.kind,
                    surface,
                    width,
                    height,
                    callback_id,
                });
                Some(surface)
            }
            Err(e) => {
                warn!("add surface rejected: {}", e);
                None
            }
        }
    }

    pub fn set_surface_visible(&mut self, handle: SurfaceHandle, visible: bool) {
        if let Err(e) = self.registry.set_visible(handle, visible) {
            warn!("set visible ignored: {}", e);
        }
    }

    pub fn remove_surface(&mut self, handle: SurfaceHandle) {
        match self.registry.remove(handle) {
            Ok(_) => self.sink.send(WorldEvent::SurfaceRemoved { surface: handle }),
            Err(e) => warn!("remove ignored: {}", e),
        }
    }

    pub fn set_tray_visible(&mut self, visible: bool) {
        match self.tray.as_mut() {
            Some(tray) => tray.toggle(visible),
            None => debug!("no tray to toggle"),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn controllers(&self) -> &ControllerContainer {
        &self.controllers
    }

    pub fn tray(&self) -> Option<&Tray> {
        self.tray.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCommand, ScriptedDevice};
    use crate::vr::scene::{Vec2, Vec3};

    fn world() -> World<Vec<WorldEvent>> {
        World::new(WorldConfig::default(), Vec::new())
    }

    fn menu_on(parent: SurfaceHandle) -> Placement {
        Placement {
            parent,
            kind: SurfaceKind::MoreMenu,
            width: 100.0,
            height: 40.0,
            anchor: Vec2::new(0.5, 0.0),
            parent_anchor: Vec2::new(0.5, 1.0),
            translation: Vec3::ZERO,
        }
    }

    #[test]
    fn test_initialize_creates_default_layout_once() {
        let mut world = world();
        assert!(!world.is_initialized());
        world.initialize();
        world.initialize();
        assert!(world.is_initialized());
        assert_eq!(world.registry().len(), 2);
        let kinds: Vec<_> = world.registry().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SurfaceKind::Browser, SurfaceKind::UrlBar]);
        assert!(world.tray().unwrap().is_visible());
        assert_eq!(world.sink().len(), 2);
        assert!(matches!(
            world.sink()[1],
            WorldEvent::SurfaceCreated { kind: SurfaceKind::UrlBar, width: 720, height: 103, callback_id: NO_CALLBACK, .. }
        ));
    }

    #[test]
    fn test_starts_paused_and_needs_device() {
        let mut world = world();
        assert!(world.is_paused());
        world.frame();
        assert_eq!(world.frame_count(), 0);

        world.register_device(Some(Box::new(ScriptedDevice::default())));
        world.frame();
        assert_eq!(world.frame_count(), 0);

        world.resume();
        world.frame();
        assert_eq!(world.frame_count(), 1);
        // Only the listener pose.
        assert!(matches!(world.sink()[0], WorldEvent::HeadPose { .. }));

        world.pause();
        world.frame();
        assert_eq!(world.frame_count(), 1);
    }

    #[test]
    fn test_add_surface_emits_created() {
        let mut world = world();
        world.initialize();
        let browser = world.registry().iter().next().unwrap().handle();
        let menu = world.add_surface(menu_on(browser), 42).unwrap();
        assert_eq!(
            world.sink().last(),
            Some(&WorldEvent::SurfaceCreated {
                kind: SurfaceKind::MoreMenu,
                surface: menu,
                width: 100,
                height: 40,
                callback_id: 42
            })
        );
    }

    #[test]
    fn test_added_surface_keeps_placement_and_visibility() {
        let mut world = world();
        world.initialize();
        let browser = world.registry().iter().next().unwrap().handle();
        let menu = world.add_surface(menu_on(browser), 7).unwrap();
        let placed = world.registry().get(menu).unwrap();
        assert_eq!(placed.placement().map(|p| p.parent), Some(browser));
        assert!(placed.is_visible());

        world.set_surface_visible(menu, false);
        assert!(!world.registry().get(menu).unwrap().is_visible());
        // Unknown handles are ignored.
        world.set_surface_visible(SurfaceHandle(99), false);
    }

    #[test]
    fn test_add_surface_with_unknown_parent_is_ignored() {
        let mut world = world();
        world.initialize();
        let before = world.sink().len();
        assert_eq!(world.add_surface(menu_on(SurfaceHandle(77)), 1), None);
        assert_eq!(world.registry().len(), 2);
        assert_eq!(world.sink().len(), before);
    }

    #[test]
    fn test_remove_surface() {
        let mut world = world();
        world.initialize();
        let url_bar = world.registry().iter().nth(1).unwrap().handle();
        world.remove_surface(url_bar);
        assert_eq!(world.registry().len(), 1);
        assert_eq!(world.sink().last(), Some(&WorldEvent::SurfaceRemoved { surface: url_bar }));

        let before = world.sink().len();
        world.remove_surface(url_bar);
        assert_eq!(world.sink().len(), before);
    }

    #[test]
    fn test_unregister_resets_controllers() {
        let mut world = world();
        world.register_device(Some(Box::new(ScriptedDevice::new(vec![vec![
            DeviceCommand::Connect { controller: 0, model: None },
            DeviceCommand::Enable { controller: 0, enabled: true },
        ]]))));
        world.resume();
        world.frame();
        assert!(world.controllers().get(0).unwrap().is_active());

        let previous = world.register_device(None);
        assert!(previous.is_some());
        assert!(!world.has_device());
        assert!(!world.controllers().get(0).unwrap().connected);
    }

    #[test]
    fn test_set_tray_visible() {
        let mut world = world();
        world.set_tray_visible(false);
        world.initialize();
        world.set_tray_visible(false);
        assert!(!world.tray().unwrap().is_visible());
        world.set_tray_visible(true);
        assert!(world.tray().unwrap().is_visible());
    }

    #[test]
    fn test_head_pose_can_be_disabled() {
        let config = WorldConfig {
            audio_pose: false,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Vec::new());
        world.register_device(Some(Box::new(ScriptedDevice::default())));
        world.resume();
        world.frame();
        assert!(world.sink().is_empty());
    }
}
