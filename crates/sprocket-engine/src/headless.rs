//! Recording platform backends with no OS dependencies.
//!
//! Every implementation here records what the engine asked for instead of
//! doing it: draws append to an op log, presents bump a counter, sounds log
//! their loads and plays. Integration tests and the headless demo drive the
//! full engine through these and assert on the records afterwards.

use crate::platform::{EventSource, InputEvent, Platform, Window};
use sprocket_core::capability::{
    FontProvider, Key, KeyboardState, Sound, SoundBackend, SoundProvider,
};
use sprocket_core::CapabilityError;
use sprocket_core::draw::{Color, Font, Surface};
use sprocket_core::math::Vec2;
use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// DrawOp / RecordingSurface
// ---------------------------------------------------------------------------

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        color: Color,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f64,
        color: Color,
    },
    Text {
        text: String,
        anchor: Vec2,
        centered: bool,
        color: Color,
    },
}

/// Surface that appends every call to a shared op log. The log is a trace,
/// not a framebuffer: `fill` appends like any other op so tests can see the
/// clear color of every frame.
#[derive(Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Rc<RefCell<Vec<DrawOp>>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32, ops: Rc<RefCell<Vec<DrawOp>>>) -> Self {
        Self { width, height, ops }
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill(&mut self, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Fill { color });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Rect {
            origin,
            size,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_text(&mut self, _font: Font, text: &str, origin: Vec2, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Text {
            text: text.to_owned(),
            anchor: origin,
            centered: false,
            color,
        });
    }

    fn draw_text_centered(&mut self, _font: Font, text: &str, center: Vec2, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Text {
            text: text.to_owned(),
            anchor: center,
            centered: true,
            color,
        });
    }
}

// ---------------------------------------------------------------------------
// HeadlessWindow
// ---------------------------------------------------------------------------

/// Window whose surface records and whose presents count.
#[derive(Debug)]
pub struct HeadlessWindow {
    surface: RecordingSurface,
    titles: Rc<RefCell<Vec<String>>>,
    presented: Rc<Cell<u64>>,
}

impl HeadlessWindow {
    pub fn new(
        width: u32,
        height: u32,
        ops: Rc<RefCell<Vec<DrawOp>>>,
        titles: Rc<RefCell<Vec<String>>>,
        presented: Rc<Cell<u64>>,
    ) -> Self {
        Self {
            surface: RecordingSurface::new(width, height, ops),
            titles,
            presented,
        }
    }
}

impl Window for HeadlessWindow {
    fn width(&self) -> u32 {
        self.surface.width()
    }

    fn height(&self) -> u32 {
        self.surface.height()
    }

    fn set_title(&mut self, title: &str) {
        self.titles.borrow_mut().push(title.to_owned());
    }

    fn surface(&mut self) -> &mut dyn Surface {
        &mut self.surface
    }

    fn present(&mut self) {
        self.presented.set(self.presented.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// ScriptedEvents
// ---------------------------------------------------------------------------

/// Event source that replays pre-queued per-frame batches. Each poll pops
/// one batch; an exhausted script reports no events.
#[derive(Debug)]
pub struct ScriptedEvents {
    script: Rc<RefCell<VecDeque<Vec<InputEvent>>>>,
}

impl ScriptedEvents {
    pub fn new(script: Rc<RefCell<VecDeque<Vec<InputEvent>>>>) -> Self {
        Self { script }
    }
}

impl EventSource for ScriptedEvents {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.script.borrow_mut().pop_front().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// FakeKeyboard
// ---------------------------------------------------------------------------

/// Keyboard whose pressed set a test mutates directly.
#[derive(Debug)]
pub struct FakeKeyboard {
    keys: Rc<RefCell<HashSet<Key>>>,
}

impl FakeKeyboard {
    pub fn new(keys: Rc<RefCell<HashSet<Key>>>) -> Self {
        Self { keys }
    }
}

impl KeyboardState for FakeKeyboard {
    fn is_pressed(&self, key: Key) -> bool {
        self.keys.borrow().contains(&key)
    }
}

// ---------------------------------------------------------------------------
// NullAudio
// ---------------------------------------------------------------------------

/// Playback log shared between [`NullAudio`] and the handles it mints.
#[derive(Debug, Default)]
pub struct AudioLog {
    plays: RefCell<Vec<u64>>,
    stops: RefCell<Vec<u64>>,
}

impl AudioLog {
    pub fn play_count(&self, id: u64) -> usize {
        self.plays.borrow().iter().filter(|&&p| p == id).count()
    }

    pub fn stop_count(&self, id: u64) -> usize {
        self.stops.borrow().iter().filter(|&&s| s == id).count()
    }

    pub fn total_plays(&self) -> usize {
        self.plays.borrow().len()
    }
}

impl SoundBackend for AudioLog {
    fn play(&self, id: u64) {
        self.plays.borrow_mut().push(id);
    }

    fn stop(&self, id: u64) {
        self.stops.borrow_mut().push(id);
    }
}

/// Sound provider that produces no audio. Loads always succeed; every load
/// and playback request is recorded for inspection.
#[derive(Debug, Default)]
pub struct NullAudio {
    log: Rc<AudioLog>,
    loads: RefCell<Vec<String>>,
    next_id: Cell<u64>,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths loaded so far, in load order.
    pub fn loaded_paths(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }

    pub fn log(&self) -> Rc<AudioLog> {
        Rc::clone(&self.log)
    }
}

impl SoundProvider for NullAudio {
    fn load_sound(&self, relative_path: &str) -> Result<Sound, CapabilityError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.loads.borrow_mut().push(relative_path.to_owned());
        Ok(Sound::new(id, Rc::clone(&self.log) as Rc<dyn SoundBackend>))
    }
}

// ---------------------------------------------------------------------------
// BitmapFonts
// ---------------------------------------------------------------------------

/// Font provider that resolves every request to the built-in bitmap face.
/// File paths and system names are accepted but not read; the handle's size
/// selects the pixel scale.
#[derive(Debug, Default)]
pub struct BitmapFonts {
    next_id: Cell<u64>,
}

impl BitmapFonts {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self, size: u32) -> Font {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Font::new(id, size)
    }
}

impl FontProvider for BitmapFonts {
    fn load_font(&self, _relative_path: &str, size: u32) -> Result<Font, CapabilityError> {
        Ok(self.mint(size))
    }

    fn load_system_font(&self, _name: &str, size: u32) -> Result<Font, CapabilityError> {
        Ok(self.mint(size))
    }
}

// ---------------------------------------------------------------------------
// HeadlessPlatform
// ---------------------------------------------------------------------------

/// Builder for a fully headless [`Platform`], keeping handles to every
/// record so a test can inspect them after (or between) frames.
#[derive(Debug)]
pub struct HeadlessPlatform {
    width: u32,
    height: u32,
    dt_ms: f64,
    draw_ops: Rc<RefCell<Vec<DrawOp>>>,
    titles: Rc<RefCell<Vec<String>>>,
    presented: Rc<Cell<u64>>,
    keys: Rc<RefCell<HashSet<Key>>>,
    script: Rc<RefCell<VecDeque<Vec<InputEvent>>>>,
    audio: Rc<NullAudio>,
}

impl HeadlessPlatform {
    /// Headless platform with a 16 ms fixed frame time.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            dt_ms: 16.0,
            draw_ops: Rc::default(),
            titles: Rc::default(),
            presented: Rc::default(),
            keys: Rc::default(),
            script: Rc::default(),
            audio: Rc::default(),
        }
    }

    /// Override the fixed per-frame `dt`.
    pub fn with_frame_time(mut self, dt_ms: f64) -> Self {
        self.dt_ms = dt_ms;
        self
    }

    /// Queue one frame's worth of input events. Frames poll batches in the
    /// order they were queued; frames beyond the script see no events.
    pub fn queue_events(&self, events: Vec<InputEvent>) {
        self.script.borrow_mut().push_back(events);
    }

    pub fn press(&self, key: Key) {
        self.keys.borrow_mut().insert(key);
    }

    pub fn release(&self, key: Key) {
        self.keys.borrow_mut().remove(&key);
    }

    /// Snapshot of all ops recorded so far.
    pub fn draw_ops(&self) -> Vec<DrawOp> {
        self.draw_ops.borrow().clone()
    }

    /// Drain the recorded ops, so the next inspection starts fresh.
    pub fn take_draw_ops(&self) -> Vec<DrawOp> {
        std::mem::take(&mut *self.draw_ops.borrow_mut())
    }

    /// Every title the window was given, in order.
    pub fn titles(&self) -> Vec<String> {
        self.titles.borrow().clone()
    }

    pub fn present_count(&self) -> u64 {
        self.presented.get()
    }

    pub fn audio(&self) -> Rc<NullAudio> {
        Rc::clone(&self.audio)
    }

    /// Assemble a [`Platform`] wired to this builder's records. May be
    /// called once per engine; the records stay shared with `self`.
    pub fn build(&self) -> Platform {
        Platform {
            window: Box::new(HeadlessWindow::new(
                self.width,
                self.height,
                Rc::clone(&self.draw_ops),
                Rc::clone(&self.titles),
                Rc::clone(&self.presented),
            )),
            events: Box::new(ScriptedEvents::new(Rc::clone(&self.script))),
            clock: Box::new(crate::clock::ManualClock::new(self.dt_ms)),
            keyboard: Rc::new(FakeKeyboard::new(Rc::clone(&self.keys))),
            audio: Rc::clone(&self.audio) as Rc<dyn SoundProvider>,
            fonts: Rc::new(BitmapFonts::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
