//! Tray overlay: a small icon strip floating close to the viewer.
//!
//! The tray takes part in hit arbitration like any surface but owns its
//! own click state machine: an icon fires once when a press that began on
//! it is released while the ray is still over it.

use std::collections::HashMap;

use tracing::debug;

use super::ray::{QuadHit, Ray};
use super::scene::{Mat4, Vec3};
use super::surface::{Surface, SurfaceHandle, SurfaceKind};

/// Tray icons, left to right. The codes are shared with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayIcon {
    Hide,
    Help,
    Settings,
    Private,
    Notifications,
}

impl TrayIcon {
    pub const ALL: [TrayIcon; 5] = [
        Self::Hide,
        Self::Help,
        Self::Settings,
        Self::Private,
        Self::Notifications,
    ];

    pub fn code(self) -> i32 {
        match self {
            Self::Hide => 0,
            Self::Help => 1,
            Self::Settings => 2,
            Self::Private => 3,
            Self::Notifications => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Help => "help",
            Self::Settings => "settings",
            Self::Private => "private",
            Self::Notifications => "notifications",
        }
    }
}

/// Click tracking for one controller.
#[derive(Debug, Clone, Copy, Default)]
struct IconPress {
    hovered: Option<TrayIcon>,
    pressed_on: Option<TrayIcon>,
    was_pressed: bool,
}

pub struct Tray {
    surface: Surface,
    presses: HashMap<usize, IconPress>,
}

impl Tray {
    pub fn new(handle: SurfaceHandle, pixel_width: u32, pixel_height: u32, world_per_pixel: f32) -> Self {
        Self {
            surface: Surface::new(handle, SurfaceKind::Tray, pixel_width, pixel_height, world_per_pixel),
            presses: HashMap::new(),
        }
    }

    pub fn handle(&self) -> SurfaceHandle {
        self.surface.handle()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.surface.set_transform(transform);
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_visible()
    }

    /// Show or hide the tray. Hiding drops any in-flight clicks.
    pub fn toggle(&mut self, visible: bool) {
        self.surface.set_visible(visible);
        if !visible {
            self.presses.clear();
        }
        debug!("tray visible={}", visible);
    }

    pub fn test_intersection(&self, ray: &Ray) -> Option<QuadHit> {
        self.surface.test_intersection(ray)
    }

    /// Icon under a world point on the tray.
    pub fn icon_at(&self, point: Vec3) -> Option<TrayIcon> {
        let (width, _) = self.surface.pixel_size();
        if width == 0 {
            return None;
        }
        let local = self.surface.to_local(point);
        let cell = width as f32 / TrayIcon::ALL.len() as f32;
        let index = ((local.x / cell) as usize).min(TrayIcon::ALL.len() - 1);
        Some(TrayIcon::ALL[index])
    }

    /// Advance the click state machine for `controller`.
    ///
    /// `hit` is the tray hit point when the tray won this controller's
    /// arbitration (`active`), `None` otherwise. Returns the icon clicked
    /// this frame, at most once per click.
    pub fn process_events(
        &mut self,
        controller: usize,
        hit: Option<Vec3>,
        pressed: bool,
    ) -> Option<TrayIcon> {
        let hovered = hit.and_then(|point| self.icon_at(point));
        let state = self.presses.entry(controller).or_default();
        state.hovered = hovered;

        let mut clicked = None;
        if pressed && !state.was_pressed {
            state.pressed_on = hovered;
        } else if !pressed && state.was_pressed {
            if let Some(icon) = state.pressed_on.take() {
                if hovered == Some(icon) {
                    clicked = Some(icon);
                }
            }
        }
        state.was_pressed = pressed;

        if let Some(icon) = clicked {
            debug!("tray icon {} clicked by controller {}", icon.as_str(), controller);
        }
        clicked
    }

    /// Icon currently under `controller`'s ray, if any.
    pub fn hovered_icon(&self, controller: usize) -> Option<TrayIcon> {
        self.presses.get(&controller).and_then(|p| p.hovered)
    }
}

// ── Tests ────────────────────────────────────────────────────
