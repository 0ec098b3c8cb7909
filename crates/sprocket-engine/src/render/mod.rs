//! Windowed platform backend: winit event pump plus a wgpu quad renderer.
//!
//! This module is feature-gated behind `renderer`. Everything an entity can
//! draw -- rectangles, circles, bitmap text -- is flattened into colored
//! quads by [`CommandSurface`](renderer::CommandSurface) and rendered in one
//! pass by [`QuadRenderer`](renderer::QuadRenderer). The engine keeps
//! ownership of the frame loop; winit events are pumped once per frame
//! through [`WindowedPlatform`](window::WindowedPlatform).

pub mod renderer;
pub mod text;
pub mod window;

pub use renderer::{CommandSurface, QuadRenderer, ScreenProjection};
pub use window::WindowedPlatform;
