//! Interaction resolver: turns controller rays into UI events.
//!
//! Runs once per frame. For each active controller it casts the pose ray
//! at every visible surface and the tray, keeps the nearest in-bounds hit,
//! and advances that controller's pointer, scroll and touch-drag state.
//! Events are edge-triggered against the controller's last-dispatched
//! snapshot, except touch-drag scrolling which streams every frame the
//! touch persists.

use tracing::{debug, trace};

use super::controller::{Controller, ControllerContainer};
use super::ray::Ray;
use super::registry::SurfaceRegistry;
use super::scene::{Vec2, Vec3};
use super::surface::SurfaceHandle;
use super::tray::{Tray, TrayIcon};
use crate::device::GestureType;
use crate::event::{EventSink, WorldEvent};

/// What a controller ray landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Surface(SurfaceHandle),
    Tray,
}

/// Nearest valid hit of one controller in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub target: HitTarget,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct InteractionResolver {
    scroll_factor: f32,
    far_clip: f32,
}

impl InteractionResolver {
    pub fn new(scroll_factor: f32, far_clip: f32) -> Self {
        Self {
            scroll_factor,
            far_clip,
        }
    }

    pub fn scroll_factor(&self) -> f32 {
        self.scroll_factor
    }

    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    /// Nearest in-bounds hit closer than the far clip.
    ///
    /// Surfaces are tested in registration order with a strict `<`, so
    /// the first registered wins an exact tie. The tray is tested last
    /// and also wins ties.
    pub fn nearest_hit(
        &self,
        ray: &Ray,
        registry: &SurfaceRegistry,
        tray: Option<&Tray>,
    ) -> Option<Hit> {
        let mut best = None;
        let mut best_distance = self.far_clip;

        for surface in registry.iter() {
            let Some(hit) = surface.test_intersection(ray) else {
                continue;
            };
            if hit.within_bounds && hit.distance < best_distance {
                best_distance = hit.distance;
                best = Some(Hit {
                    target: HitTarget::Surface(surface.handle()),
                    point: hit.point,
                    distance: hit.distance,
                });
            }
        }

        if let Some(hit) = tray.and_then(|t| t.test_intersection(ray)) {
            if hit.within_bounds && hit.distance <= best_distance && hit.distance < self.far_clip {
                best = Some(Hit {
                    target: HitTarget::Tray,
                    point: hit.point,
                    distance: hit.distance,
                });
            }
        }

        best
    }

    /// Resolve one frame.
    pub fn resolve(
        &self,
        controllers: &mut ControllerContainer,
        registry: &mut SurfaceRegistry,
        mut tray: Option<&mut Tray>,
        gestures: &[GestureType],
        sink: &mut dyn EventSink,
    ) {
        let mut active = Vec::new();

        for (index, controller) in controllers.iter_mut() {
            if !controller.is_active() {
                continue;
            }
            let ray = Ray::from_pose(&controller.transform);

            for surface in registry.iter_mut() {
                surface.set_pointer_active(false);
            }
            let hit = self.nearest_hit(&ray, registry, tray.as_deref());
            trace!("controller {} hit {:?}", index, hit.map(|h| h.target));

            if let Some(tray) = tray.as_deref_mut() {
                let tray_point = match hit {
                    Some(Hit {
                        target: HitTarget::Tray,
                        point,
                        ..
                    }) => Some(point),
                    _ => None,
                };
                if let Some(icon) = tray.process_events(index, tray_point, controller.pressed) {
                    if icon == TrayIcon::Hide {
                        tray.toggle(false);
                    }
                    sink.send(WorldEvent::OverlayAction { code: icon.code() });
                }
            }

            let Some(Hit {
                target: HitTarget::Surface(handle),
                point,
                ..
            }) = hit
            else {
                continue;
            };
            let Some(surface) = registry.get(handle) else {
                continue;
            };
            active.push(handle);
            let local = surface.to_local(point);

            self.dispatch_pointer(index, controller, handle, local, sink);
            self.dispatch_scroll(index, controller, handle, sink);
        }

        for handle in active {
            if let Some(surface) = registry.get_mut(handle) {
                surface.set_pointer_active(true);
            }
        }

        for gesture in gestures {
            match gesture.output_code() {
                Some(code) => sink.send(WorldEvent::Gesture { code }),
                None => debug!("gesture {:?} dropped", gesture),
            }
        }
    }

    /// Emit a pointer event when anything differs from the last one sent.
    fn dispatch_pointer(
        &self,
        index: usize,
        controller: &mut Controller,
        handle: SurfaceHandle,
        local: Vec2,
        sink: &mut dyn EventSink,
    ) {
        if controller.pointer == local
            && controller.pressed == controller.was_pressed
            && controller.surface == handle
        {
            return;
        }
        sink.send(WorldEvent::Pointer {
            surface: handle,
            controller: index,
            pressed: controller.pressed,
            x: local.x,
            y: local.y,
        });
        controller.surface = handle;
        controller.pointer = local;
        controller.was_pressed = controller.pressed;
    }

    /// One-shot scroll delta first, then touch-drag scrolling while the
    /// button is up. Both may fire in the same frame.
    fn dispatch_scroll(
        &self,
        index: usize,
        controller: &mut Controller,
        handle: SurfaceHandle,
        sink: &mut dyn EventSink,
    ) {
        if controller.scroll_delta != Vec2::ZERO {
            sink.send(WorldEvent::Scroll {
                surface: handle,
                controller: index,
                dx: controller.scroll_delta.x,
                dy: controller.scroll_delta.y,
            });
            controller.scroll_delta = Vec2::ZERO;
        }

        if controller.pressed {
            return;
        }
        if controller.touched {
            if controller.was_touched {
                sink.send(WorldEvent::Scroll {
                    surface: handle,
                    controller: index,
                    dx: (controller.touch.x - controller.last_touch.x) * self.scroll_factor,
                    dy: (controller.touch.y - controller.last_touch.y) * self.scroll_factor,
                });
            } else {
                controller.was_touched = true;
            }
            controller.last_touch = controller.touch;
        } else {
            controller.was_touched = false;
            controller.last_touch = Vec2::ZERO;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
