//! Scene-side interaction: math, rays, surfaces, controllers and the
//! per-frame resolver that ties them together.

pub mod controller;
pub mod interaction;
pub mod ray;
pub mod registry;
pub mod scene;
pub mod surface;
pub mod tray;
