//! Headless device: a desktop stand-in for tracked hardware.
//!
//! A single controller (index 0) is driven by a 2D pointer over a virtual
//! viewport: its pose is a ray from the head through the pointer pixel.
//! Touch-down presses the button, the wheel feeds the one-shot scroll
//! channel, and the head can be turned and moved like a desktop camera.

use tracing::{debug, info};

use super::{ControllerDelegate, DeviceDelegate, GestureType};
use crate::vr::scene::{Mat4, Vec2, Vec3};

const CONTROLLER_INDEX: usize = 0;

/// Viewport and projection of the headless device.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Virtual viewport width in pixels.
    pub width: u32,
    /// Virtual viewport height in pixels.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fov_y: 60.0,
        }
    }
}

impl HeadlessConfig {
    /// Parse a "WxH" viewport string. Returns (width, height) or None.
    pub fn parse_viewport(s: &str) -> Option<(u32, u32)> {
        let (w, h) = s.split_once('x')?;
        let w = w.parse::<u32>().ok()?;
        let h = h.parse::<u32>().ok()?;
        if w > 0 && h > 0 {
            Some((w, h))
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct HeadlessDevice {
    config: HeadlessConfig,
    heading: f32,
    position: Vec3,
    pointer: Vec2,
    pressed: bool,
    wheel: Vec2,
    pending_gestures: Vec<GestureType>,
    gestures: Vec<GestureType>,
    created: bool,
    clip_planes: (f32, f32),
}

impl HeadlessDevice {
    pub fn new(config: HeadlessConfig) -> Self {
        let pointer = Vec2::new(config.width as f32 / 2.0, config.height as f32 / 2.0);
        Self {
            config,
            heading: 0.0,
            position: Vec3::ZERO,
            pointer,
            pressed: false,
            wheel: Vec2::ZERO,
            pending_gestures: Vec::new(),
            gestures: Vec::new(),
            created: false,
            clip_planes: (0.1, 100.0),
        }
    }

    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Resize the viewport. Zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        debug!("headless viewport {}x{}", width, height);
    }

    pub fn set_fov(&mut self, fov_y: f32) {
        self.config.fov_y = fov_y;
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Turn the head about +Y by `delta` radians.
    pub fn rotate_heading(&mut self, delta: f32) {
        self.heading += delta;
    }

    /// Move the head along `axis`, expressed in the head's own frame
    /// (-Z forward, +X right).
    pub fn move_axis(&mut self, axis: Vec3) {
        let rotation = Mat4::rotation(Vec3::new(0.0, 1.0, 0.0), self.heading);
        self.position = self.position + rotation.transform_direction(axis);
    }

    /// Move the pointer to a viewport pixel.
    pub fn move_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }

    /// Touch/mouse button at a viewport pixel; a touch-down presses.
    pub fn touch_event(&mut self, down: bool, x: f32, y: f32) {
        self.move_pointer(x, y);
        self.pressed = down;
    }

    /// Accumulate wheel motion, delivered as one scroll delta next frame.
    pub fn wheel(&mut self, dx: f32, dy: f32) {
        self.wheel = Vec2::new(self.wheel.x + dx, self.wheel.y + dy);
    }

    /// Queue a gesture for the next frame.
    pub fn swipe(&mut self, gesture: GestureType) {
        self.pending_gestures.push(gesture);
    }

    pub fn clip_planes(&self) -> (f32, f32) {
        self.clip_planes
    }

    fn head(&self) -> Mat4 {
        let p = self.position;
        Mat4::translation(p.x, p.y, p.z).mul(&Mat4::rotation(Vec3::new(0.0, 1.0, 0.0), self.heading))
    }

    /// Pose of a controller at the head, aimed through the pointer pixel.
    pub fn pointer_pose(&self) -> Mat4 {
        let width = self.config.width.max(1) as f32;
        let height = self.config.height.max(1) as f32;
        let tan_half = (self.config.fov_y.to_radians() / 2.0).tan();
        let ndc_x = 2.0 * self.pointer.x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * self.pointer.y / height;
        let local = Vec3::new(ndc_x * tan_half * width / height, ndc_y * tan_half, -1.0);

        let head = self.head();
        let direction = head.transform_direction(local);
        let p = self.position;
        Mat4::translation(p.x, p.y, p.z).mul(&Mat4::looking_along(direction, Vec3::new(0.0, 1.0, 0.0)))
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl DeviceDelegate for HeadlessDevice {
    fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.clip_planes = (near, far);
    }

    fn process_events(&mut self, controllers: &mut dyn ControllerDelegate) {
        if !self.created {
            controllers.create_controller(CONTROLLER_INDEX, None);
            controllers.set_enabled(CONTROLLER_INDEX, true);
            self.created = true;
            info!(
                "headless controller ready ({}x{}, fov {})",
                self.config.width, self.config.height, self.config.fov_y
            );
        }
        controllers.set_transform(CONTROLLER_INDEX, self.pointer_pose());
        controllers.set_button_state(CONTROLLER_INDEX, 0, self.pressed);
        if self.wheel != Vec2::ZERO {
            controllers.set_scrolled_delta(CONTROLLER_INDEX, self.wheel.x, self.wheel.y);
            self.wheel = Vec2::ZERO;
        }
        self.gestures = std::mem::take(&mut self.pending_gestures);
    }

    fn gestures(&self) -> &[GestureType] {
        &self.gestures
    }

    fn head_transform(&self) -> Mat4 {
        self.head()
    }

    fn release_controller_delegate(&mut self) {
        self.created = false;
    }
}

// ── Tests ────────────────────────────────────────────────────
