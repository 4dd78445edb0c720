//! Device layer seam: where tracked hardware (or a stand-in) meets the
//! world.
//!
//! A `DeviceDelegate` polls its hardware once per frame and writes into
//! the controller slots through `ControllerDelegate`. It also buffers the
//! discrete gestures recognized during that frame.

use serde::Deserialize;

use crate::vr::scene::Mat4;

pub mod headless;
pub mod scripted;

pub use headless::HeadlessDevice;
pub use scripted::{DeviceCommand, ScriptedDevice};

/// Write interface into controller state. Every call with an index that
/// was never created is a silent no-op.
pub trait ControllerDelegate {
    /// Create (or re-connect) the slot at `index`, attaching the visual
    /// for `model_index` the first time one is given.
    fn create_controller(&mut self, index: usize, model_index: Option<usize>);
    fn destroy_controller(&mut self, index: usize);
    fn set_enabled(&mut self, index: usize, enabled: bool);
    fn set_visible(&mut self, index: usize, visible: bool);
    fn set_transform(&mut self, index: usize, transform: Mat4);
    /// All buttons drive the single press flag.
    fn set_button_state(&mut self, index: usize, button: u32, pressed: bool);
    fn set_touch_position(&mut self, index: usize, x: f32, y: f32);
    fn end_touch(&mut self, index: usize);
    fn set_scrolled_delta(&mut self, index: usize, dx: f32, dy: f32);
}

/// Discrete gestures a device may recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureType {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
}

impl GestureType {
    /// Code forwarded to the UI layer, or `None` for gestures the UI does
    /// not handle.
    pub fn output_code(self) -> Option<i32> {
        match self {
            Self::SwipeLeft => Some(0),
            Self::SwipeRight => Some(1),
            Self::SwipeUp | Self::SwipeDown => None,
        }
    }
}

/// A pose/button source.
pub trait DeviceDelegate {
    fn set_clip_planes(&mut self, _near: f32, _far: f32) {}

    fn controller_model_count(&self) -> usize {
        0
    }

    /// Model file for `index`, `None` if the device has none.
    fn controller_model_name(&self, _index: usize) -> Option<String> {
        None
    }

    /// Poll hardware and update controller state for the coming frame.
    fn process_events(&mut self, controllers: &mut dyn ControllerDelegate);

    /// Gestures recognized by the last `process_events` call.
    fn gestures(&self) -> &[GestureType] {
        &[]
    }

    fn head_transform(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// The world is letting go of this device.
    fn release_controller_delegate(&mut self) {}
}
