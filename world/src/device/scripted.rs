//! Scripted device: replays pre-defined per-frame command lists.
//!
//! Drives the world deterministically in integration tests and in the
//! headless runner. Scripts can be built in code or loaded from TOML:
//!
//! ```toml
//! models = ["controller.obj"]
//!
//! [[frame]]
//! commands = [
//!   { op = "connect", controller = 0, model = 0 },
//!   { op = "enable", controller = 0, enabled = true },
//!   { op = "aim", controller = 0, from = [0.0, 0.0, 0.0], to = [0.0, 0.0, -18.0] },
//! ]
//!
//! [[frame]]
//! repeat = 3
//! commands = [{ op = "button", controller = 0, pressed = true }]
//! ```

use std::collections::VecDeque;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{ControllerDelegate, DeviceDelegate, GestureType};
use crate::vr::scene::{Mat4, Vec3};

/// One write into the device layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DeviceCommand {
    Connect {
        controller: usize,
        #[serde(default)]
        model: Option<usize>,
    },
    Disconnect {
        controller: usize,
    },
    Enable {
        controller: usize,
        enabled: bool,
    },
    Visible {
        controller: usize,
        visible: bool,
    },
    /// Raw pose matrix (code-built scripts only).
    #[serde(skip)]
    Pose {
        controller: usize,
        transform: Mat4,
    },
    /// Pose placing the controller at `from`, pointing at `to`.
    Aim {
        controller: usize,
        from: [f32; 3],
        to: [f32; 3],
    },
    Button {
        controller: usize,
        #[serde(default)]
        button: u32,
        pressed: bool,
    },
    Touch {
        controller: usize,
        x: f32,
        y: f32,
    },
    EndTouch {
        controller: usize,
    },
    Scroll {
        controller: usize,
        dx: f32,
        dy: f32,
    },
    Gesture {
        gesture: GestureType,
    },
}

impl DeviceCommand {
    /// Pose matrix for a controller at `from` aiming at `to`.
    pub fn aim_transform(from: Vec3, to: Vec3) -> Mat4 {
        let rotation = Mat4::looking_along(to - from, Vec3::new(0.0, 1.0, 0.0));
        Mat4::translation(from.x, from.y, from.z).mul(&rotation)
    }
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    models: Vec<String>,
    #[serde(default, rename = "frame")]
    frames: Vec<ScriptFrame>,
}

#[derive(Debug, Deserialize)]
struct ScriptFrame {
    #[serde(default)]
    repeat: Option<usize>,
    #[serde(default)]
    commands: Vec<DeviceCommand>,
}

/// A device that delivers one queued frame of commands per
/// `process_events` call. Once the queue is empty the device idles.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    frames: VecDeque<Vec<DeviceCommand>>,
    gestures: Vec<GestureType>,
    head: Mat4,
    model_names: Vec<String>,
    clip_planes: Option<(f32, f32)>,
}

impl ScriptedDevice {
    /// Create from a list of frames.
    pub fn new(frames: Vec<Vec<DeviceCommand>>) -> Self {
        Self {
            frames: VecDeque::from(frames),
            ..Default::default()
        }
    }

    pub fn with_models(mut self, model_names: Vec<String>) -> Self {
        self.model_names = model_names;
        self
    }

    pub fn with_head(mut self, head: Mat4) -> Self {
        self.head = head;
        self
    }

    /// Parse a TOML script.
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let script: Script = toml::from_str(source).context("invalid device script")?;
        let mut frames = Vec::new();
        for frame in script.frames {
            for _ in 0..frame.repeat.unwrap_or(1) {
                frames.push(frame.commands.clone());
            }
        }
        debug!("device script: {} frames, {} models", frames.len(), script.models.len());
        Ok(Self::new(frames).with_models(script.models))
    }

    /// Load a TOML script from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading device script {}", path.display()))?;
        Self::from_toml(&source).with_context(|| format!("parsing {}", path.display()))
    }

    /// Queue another frame.
    pub fn push_frame(&mut self, commands: Vec<DeviceCommand>) {
        self.frames.push_back(commands);
    }

    /// Number of frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn has_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn clip_planes(&self) -> Option<(f32, f32)> {
        self.clip_planes
    }

    fn apply(&mut self, command: DeviceCommand, controllers: &mut dyn ControllerDelegate) {
        trace!("device command {:?}", command);
        match command {
            DeviceCommand::Connect { controller, model } => {
                controllers.create_controller(controller, model)
            }
            DeviceCommand::Disconnect { controller } => controllers.destroy_controller(controller),
            DeviceCommand::Enable {
                controller,
                enabled,
            } => controllers.set_enabled(controller, enabled),
            DeviceCommand::Visible {
                controller,
                visible,
            } => controllers.set_visible(controller, visible),
            DeviceCommand::Pose {
                controller,
                transform,
            } => controllers.set_transform(controller, transform),
            DeviceCommand::Aim {
                controller,
                from,
                to,
            } => {
                let from = Vec3::new(from[0], from[1], from[2]);
                let to = Vec3::new(to[0], to[1], to[2]);
                controllers.set_transform(controller, DeviceCommand::aim_transform(from, to));
            }
            DeviceCommand::Button {
                controller,
                button,
                pressed,
            } => controllers.set_button_state(controller, button, pressed),
            DeviceCommand::Touch { controller, x, y } => {
                controllers.set_touch_position(controller, x, y)
            }
            DeviceCommand::EndTouch { controller } => controllers.end_touch(controller),
            DeviceCommand::Scroll { controller, dx, dy } => {
                controllers.set_scrolled_delta(controller, dx, dy)
            }
            DeviceCommand::Gesture { gesture } => self.gestures.push(gesture),
        }
    }
}

impl DeviceDelegate for ScriptedDevice {
    fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.clip_planes = Some((near, far));
    }

    fn controller_model_count(&self) -> usize {
        self.model_names.len()
    }

    fn controller_model_name(&self, index: usize) -> Option<String> {
        self.model_names
            .get(index)
            .filter(|name| !name.is_empty())
            .cloned()
    }

    fn process_events(&mut self, controllers: &mut dyn ControllerDelegate) {
        self.gestures.clear();
        let Some(commands) = self.frames.pop_front() else {
            return;
        };
        for command in commands {
            self.apply(command, controllers);
        }
    }

    fn gestures(&self) -> &[GestureType] {
        &self.gestures
    }

    fn head_transform(&self) -> Mat4 {
        self.head
    }
}

// ── Tests ────────────────────────────────────────────────────
