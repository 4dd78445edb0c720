//! Outbound events and the sinks that consume them.
//!
//! The world only produces events; delivery belongs to the `EventSink`.
//! Every event renders as a keyword s-expression for logs, the CLI and
//! recorded sessions.

use std::io::Write;

use tracing::{trace, warn};

use crate::vr::scene::{Quat, Vec3};
use crate::vr::surface::{SurfaceHandle, SurfaceKind};

/// Event sent to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// Pointer moved, pressed or released over a surface.
    Pointer {
        surface: SurfaceHandle,
        controller: usize,
        pressed: bool,
        x: f32,
        y: f32,
    },
    Scroll {
        surface: SurfaceHandle,
        controller: usize,
        dx: f32,
        dy: f32,
    },
    Gesture {
        code: i32,
    },
    /// Tray icon clicked.
    OverlayAction {
        code: i32,
    },
    SurfaceCreated {
        kind: SurfaceKind,
        surface: SurfaceHandle,
        width: u32,
        height: u32,
        callback_id: i32,
    },
    SurfaceRemoved {
        surface: SurfaceHandle,
    },
    /// Listener pose for spatial audio.
    HeadPose {
        orientation: Quat,
        position: Vec3,
    },
}

impl WorldEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pointer { .. } => "pointer",
            Self::Scroll { .. } => "scroll",
            Self::Gesture { .. } => "gesture",
            Self::OverlayAction { .. } => "overlay-action",
            Self::SurfaceCreated { .. } => "surface-created",
            Self::SurfaceRemoved { .. } => "surface-removed",
            Self::HeadPose { .. } => "head-pose",
        }
    }

    /// Surface the event targets, if any.
    pub fn surface(&self) -> Option<SurfaceHandle> {
        match self {
            Self::Pointer { surface, .. }
            | Self::Scroll { surface, .. }
            | Self::SurfaceCreated { surface, .. }
            | Self::SurfaceRemoved { surface } => Some(*surface),
            _ => None,
        }
    }

    /// Controller that produced the event, if any.
    pub fn controller(&self) -> Option<usize> {
        match self {
            Self::Pointer { controller, .. } | Self::Scroll { controller, .. } => Some(*controller),
            _ => None,
        }
    }

    /// Serialize to a keyword s-expression.
    pub fn to_sexp(&self) -> String {
        let body = match self {
            Self::Pointer {
                surface,
                controller,
                pressed,
                x,
                y,
            } => format!(
                ":surface {} :controller {} :pressed {} :x {:.2} :y {:.2}",
                surface,
                controller,
                if *pressed { "t" } else { "nil" },
                x,
                y
            ),
            Self::Scroll {
                surface,
                controller,
                dx,
                dy,
            } => format!(
                ":surface {} :controller {} :dx {:.2} :dy {:.2}",
                surface, controller, dx, dy
            ),
            Self::Gesture { code } | Self::OverlayAction { code } => format!(":code {}", code),
            Self::SurfaceCreated {
                kind,
                surface,
                width,
                height,
                callback_id,
            } => format!(
                ":kind :{} :surface {} :width {} :height {} :callback {}",
                kind.as_str(),
                surface,
                width,
                height,
                callback_id
            ),
            Self::SurfaceRemoved { surface } => format!(":surface {}", surface),
            Self::HeadPose {
                orientation: q,
                position: p,
            } => format!(
                ":orientation ({:.4} {:.4} {:.4} {:.4}) :position ({:.4} {:.4} {:.4})",
                q.x, q.y, q.z, q.w, p.x, p.y, p.z
            ),
        };
        format!("(:type :{} {})", self.type_name(), body)
    }
}

// ── Sinks ────────────────────────────────────────────────────

/// Consumer of outbound events. Called synchronously from the frame
/// loop; implementations must not call back into the world.
pub trait EventSink {
    fn send(&mut self, event: WorldEvent);

    /// A new frame is about to produce events.
    fn begin_frame(&mut self, _frame: u64) {}
}

impl EventSink for Vec<WorldEvent> {
    fn send(&mut self, event: WorldEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn send(&mut self, event: WorldEvent) {
        (**self).send(event);
    }

    fn begin_frame(&mut self, frame: u64) {
        (**self).begin_frame(frame);
    }
}

/// Writes every event as one s-expression line.
pub struct SexpWriter<W: Write> {
    out: W,
    skip_head_pose: bool,
}

impl<W: Write> SexpWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            skip_head_pose: false,
        }
    }

    /// Drop per-frame head pose events from the output.
    pub fn skip_head_pose(mut self, skip: bool) -> Self {
        self.skip_head_pose = skip;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for SexpWriter<W> {
    fn send(&mut self, event: WorldEvent) {
        if self.skip_head_pose && matches!(event, WorldEvent::HeadPose { .. }) {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", event.to_sexp()) {
            warn!("event output failed: {}", e);
        }
    }
}

// ── Recorder ─────────────────────────────────────────────────

/// An event stamped with the frame that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub frame: u64,
    pub event: WorldEvent,
}

impl RecordedEvent {
    pub fn to_sexp(&self) -> String {
        format!("(:frame {} :event {})", self.frame, self.event.to_sexp())
    }
}

/// Sink that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct EventRecorder {
    frame: u64,
    events: Vec<RecordedEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Take everything recorded so far.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        self.events.drain(..).map(|r| r.event).collect()
    }

    /// Events produced during `frame`.
    pub fn in_frame(&self, frame: u64) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|r| r.frame == frame)
            .map(|r| &r.event)
            .collect()
    }

    pub fn of_type(&self, type_name: &str) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .map(|r| &r.event)
            .filter(|e| e.type_name() == type_name)
            .collect()
    }

    pub fn pointer_events(&self) -> Vec<&WorldEvent> {
        self.of_type("pointer")
    }

    pub fn scroll_events(&self) -> Vec<&WorldEvent> {
        self.of_type("scroll")
    }

    /// Events produced by `controller`.
    pub fn for_controller(&self, controller: usize) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .map(|r| &r.event)
            .filter(|e| e.controller() == Some(controller))
            .collect()
    }

    /// Serialize the whole recording.
    pub fn to_sexp(&self) -> String {
        let mut out = format!("(:event-count {} :events (", self.events.len());
        for (i, recorded) in self.events.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&recorded.to_sexp());
        }
        out.push_str("))");
        out
    }
}

impl EventSink for EventRecorder {
    fn send(&mut self, event: WorldEvent) {
        trace!("recorded {}", event.type_name());
        self.events.push(RecordedEvent {
            frame: self.frame,
            event,
        });
    }

    fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }
}

// ── Tests ────────────────────────────────────────────────────
