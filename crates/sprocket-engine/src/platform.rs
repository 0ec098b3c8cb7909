//! Capability traits the engine drives a frame through, and the bundle
//! grouping one implementation of each.
//!
//! The engine never talks to an OS API directly. Everything platform-shaped
//! (pacing, input, the output window, audio, fonts) arrives as a trait
//! object inside a [`Platform`], so the same loop runs under a real window
//! (feature `renderer`) or the recording backends in [`crate::headless`].

use sprocket_core::capability::{FontProvider, Key, KeyboardState, SoundProvider};
use sprocket_core::draw::Surface;
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// InputEvent
// ---------------------------------------------------------------------------

/// One input event drained from the platform during the frame's event pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The user asked to close the window or otherwise end the program.
    Quit,
    KeyDown(Key),
    KeyUp(Key),
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Paces the loop and measures real elapsed time.
pub trait Clock {
    /// Return the milliseconds elapsed since the previous call, sleeping
    /// first if the frame finished ahead of the `target_fps` budget.
    /// The first call reports the time since the clock was created.
    fn tick(&mut self, target_fps: u32) -> f64;
}

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// Drains pending input events. Called exactly once per frame.
pub trait EventSource {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// The output target: a fixed-size pixel surface with a title bar.
pub trait Window {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn set_title(&mut self, title: &str);

    /// The surface draws accumulate on this frame.
    fn surface(&mut self) -> &mut dyn Surface;

    /// Flush the frame's accumulated draws to the screen.
    fn present(&mut self);
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// One implementation of every capability the engine needs.
///
/// The window, event source and clock are owned exclusively by the engine;
/// keyboard, audio and fonts are shared via `Rc` because every spawned
/// entity's context keeps a handle to them.
pub struct Platform {
    pub window: Box<dyn Window>,
    pub events: Box<dyn EventSource>,
    pub clock: Box<dyn Clock>,
    pub keyboard: Rc<dyn KeyboardState>,
    pub audio: Rc<dyn SoundProvider>,
    pub fonts: Rc<dyn FontProvider>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("window_width", &self.window.width())
            .field("window_height", &self.window.height())
            .finish_non_exhaustive()
    }
}
