//! Controller state: one slot per tracked pointing device.
//!
//! The device layer writes into the slots through `ControllerDelegate`;
//! the interaction resolver reads them once per frame. Slots are indexed
//! by the device's controller index and survive disconnects (they are
//! reset, never removed), so stale indices stay harmless.

use std::rc::Rc;

use tracing::{debug, info, warn};

use super::scene::{Mat4, Vec2};
use super::surface::SurfaceHandle;
use crate::device::ControllerDelegate;

/// Highest controller slot count a device may address.
pub const MAX_CONTROLLERS: usize = 16;
/// Highest number of distinct controller model groups.
pub const MAX_MODELS: usize = 16;

// ── Visual models ────────────────────────────────────────────

/// Shared model group for every controller using the same model index.
#[derive(Debug, PartialEq)]
pub struct ModelGroup {
    pub index: usize,
    /// Model file the device named for this index. `None` when the device
    /// has no model for it; the group is then an empty placeholder.
    pub file_name: Option<String>,
}

/// Scene attachment of a controller: its model group and pointer beam.
#[derive(Debug, Clone)]
pub struct ControllerVisual {
    pub model: Rc<ModelGroup>,
    pub pointer_beam: bool,
    pub visible: bool,
}

// ── Controller ───────────────────────────────────────────────

/// Per-controller record.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    pub connected: bool,
    pub enabled: bool,
    pub transform: Mat4,
    pub pressed: bool,
    pub was_pressed: bool,
    pub touched: bool,
    pub was_touched: bool,
    pub touch: Vec2,
    pub last_touch: Vec2,
    pub scroll_delta: Vec2,
    /// Last pointer position sent to the event sink.
    pub pointer: Vec2,
    /// Last surface a pointer event was sent to.
    pub surface: SurfaceHandle,
    pub visual: Option<ControllerVisual>,
}

impl Controller {
    /// Clear everything the device or the resolver wrote, keeping the
    /// connection and the scene attachment.
    pub fn reset_transient(&mut self) {
        self.pressed = false;
        self.was_pressed = false;
        self.touched = false;
        self.was_touched = false;
        self.touch = Vec2::ZERO;
        self.last_touch = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
        self.pointer = Vec2::ZERO;
        self.surface = SurfaceHandle::NONE;
        self.transform = Mat4::IDENTITY;
    }

    /// Back to a disconnected default slot; the visual is detached.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.connected && self.enabled
    }
}

// ── Container ────────────────────────────────────────────────

#[derive(Default)]
pub struct ControllerContainer {
    list: Vec<Controller>,
    models: Vec<Option<Rc<ModelGroup>>>,
    model_names: Vec<Option<String>>,
    pointer_beam: bool,
}

impl ControllerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the model file the device offers for `index`. Groups are
    /// still only instantiated when a controller first uses the index.
    pub fn set_model_name(&mut self, index: usize, file_name: Option<String>) {
        if index >= MAX_MODELS {
            warn!("model index {} out of range, name ignored", index);
            return;
        }
        if self.model_names.len() <= index {
            self.model_names.resize(index + 1, None);
        }
        self.model_names[index] = file_name;
    }

    /// Create the pointer beam visual and attach it to every controller
    /// that already has a visual.
    pub fn create_pointer_beam(&mut self) {
        if self.pointer_beam {
            return;
        }
        self.pointer_beam = true;
        for visual in self.list.iter_mut().filter_map(|c| c.visual.as_mut()) {
            visual.pointer_beam = true;
        }
    }

    fn model_group(&mut self, index: usize) -> Rc<ModelGroup> {
        if self.models.len() <= index {
            self.models.resize(index + 1, None);
        }
        let file_name = self.model_names.get(index).cloned().flatten();
        let group = self.models[index].get_or_insert_with(|| {
            debug!("controller model group {} created ({:?})", index, file_name);
            Rc::new(ModelGroup { index, file_name })
        });
        Rc::clone(group)
    }

    /// Number of distinct model groups instantiated so far.
    pub fn model_group_count(&self) -> usize {
        self.models.iter().filter(|m| m.is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&Controller> {
        self.list.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Controller> {
        self.list.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Controller)> {
        self.list.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Controller)> {
        self.list.iter_mut().enumerate()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Reset every slot and detach all visuals (device released).
    pub fn reset_all(&mut self) {
        for controller in &mut self.list {
            controller.reset();
        }
    }
}

impl ControllerDelegate for ControllerContainer {
    fn create_controller(&mut self, index: usize, model_index: Option<usize>) {
        if index >= MAX_CONTROLLERS {
            warn!("controller index {} out of range, ignored", index);
            return;
        }
        if model_index.is_some_and(|m| m >= MAX_MODELS) {
            warn!("controller {}: model index {:?} out of range, ignored", index, model_index);
            return;
        }
        if index >= self.list.len() {
            self.list.resize_with(index + 1, Controller::default);
        }
        let needs_visual = self.list[index].visual.is_none();
        if let (true, Some(model_index)) = (needs_visual, model_index) {
            let model = self.model_group(model_index);
            if model.file_name.is_none() {
                warn!("controller {}: no model file for model index {}", index, model_index);
            }
            self.list[index].visual = Some(ControllerVisual {
                model,
                pointer_beam: self.pointer_beam,
                visible: false,
            });
        }
        self.list[index].connected = true;
        info!("controller {} created (model {:?})", index, model_index);
    }

    fn destroy_controller(&mut self, index: usize) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.reset();
            info!("controller {} destroyed", index);
        }
    }

    fn set_enabled(&mut self, index: usize, enabled: bool) {
        let Some(controller) = self.list.get_mut(index) else {
            return;
        };
        controller.enabled = enabled;
        if !enabled {
            controller.reset_transient();
            self.set_visible(index, false);
        }
        debug!("controller {} enabled={}", index, enabled);
    }

    fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(visual) = self.list.get_mut(index).and_then(|c| c.visual.as_mut()) {
            visual.visible = visible;
        }
    }

    fn set_transform(&mut self, index: usize, transform: Mat4) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.transform = transform;
        }
    }

    fn set_button_state(&mut self, index: usize, _button: u32, pressed: bool) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.pressed = pressed;
        }
    }

    fn set_touch_position(&mut self, index: usize, x: f32, y: f32) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.touched = true;
            controller.touch = Vec2::new(x, y);
        }
    }

    fn end_touch(&mut self, index: usize) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.touched = false;
        }
    }

    fn set_scrolled_delta(&mut self, index: usize, dx: f32, dy: f32) {
        if let Some(controller) = self.list.get_mut(index) {
            controller.scroll_delta = Vec2::new(dx, dy);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
