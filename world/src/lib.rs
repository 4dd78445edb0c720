//! VR world library: controller pointing, surface hit testing and UI
//! event dispatch for a browser shown on floating panels.
//!
//! This library crate exposes the world's core modules for integration
//! testing. The binary entry point lives in `main.rs`.

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod vr;
pub mod world;

pub use config::WorldConfig;
pub use event::{EventRecorder, EventSink, WorldEvent};
pub use world::World;
