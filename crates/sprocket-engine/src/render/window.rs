//! Winit-backed platform: OS window, pumped events, polled keyboard.
//!
//! The engine owns the frame loop, so winit runs in pump mode: each
//! `poll_events` call drains the OS queue through
//! [`EventLoopExtPumpEvents::pump_app_events`] and hands back the
//! translated [`InputEvent`]s. Winit 0.30 requires window creation inside
//! the `resumed` callback, so [`WindowedPlatform::build`] pumps until the
//! window and GPU surface exist before assembling the platform bundle.
//!
//! Sound playback has no device backend here; loads and plays are recorded
//! by [`NullAudio`] exactly as in headless mode.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use sprocket_core::capability::{Key, KeyboardState};
use sprocket_core::draw::{Color, Surface};
use tracing::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{WindowAttributes, WindowId};

use super::renderer::{CommandSurface, QuadRenderer, Vertex};
use crate::clock::FrameClock;
use crate::headless::{BitmapFonts, NullAudio};
use crate::platform::{EventSource, InputEvent, Platform, Window};

// ---------------------------------------------------------------------------
// Key translation
// ---------------------------------------------------------------------------

/// Map a physical key to the engine's key set. Keys outside the set are
/// ignored by the platform.
fn translate_key(key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Winit application state
// ---------------------------------------------------------------------------

/// Handler state behind the pump. Window and renderer stay `None` until the
/// initial `resumed` event arrives.
struct WindowApp {
    title: String,
    width: u32,
    height: u32,
    window: Option<Arc<winit::window::Window>>,
    renderer: Option<QuadRenderer>,
    pending: Vec<InputEvent>,
    keys: Rc<RefCell<HashSet<Key>>>,
    init_error: Option<anyhow::Error>,
}

impl WindowApp {
    fn new(title: &str, width: u32, height: u32, keys: Rc<RefCell<HashSet<Key>>>) -> Self {
        Self {
            title: title.to_owned(),
            width,
            height,
            window: None,
            renderer: None,
            pending: Vec::new(),
            keys,
            init_error: None,
        }
    }

    fn on_key(&mut self, event: KeyEvent) {
        if event.repeat {
            return;
        }
        let Some(key) = translate_key(event.physical_key) else {
            return;
        };
        match event.state {
            ElementState::Pressed => {
                self.keys.borrow_mut().insert(key);
                self.pending.push(InputEvent::KeyDown(key));
            }
            ElementState::Released => {
                self.keys.borrow_mut().remove(&key);
                self.pending.push(InputEvent::KeyUp(key));
            }
        }
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.init_error.is_some() {
            return;
        }
        let attrs = WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(PhysicalSize::new(self.width, self.height));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                match pollster::block_on(QuadRenderer::new(Arc::clone(&window))) {
                    Ok(renderer) => {
                        info!(
                            width = self.width,
                            height = self.height,
                            "render window created"
                        );
                        self.window = Some(window);
                        self.renderer = Some(renderer);
                    }
                    Err(error) => {
                        tracing::error!(%error, "GPU initialization failed");
                        self.init_error = Some(error);
                        event_loop.exit();
                    }
                }
            }
            Err(error) => {
                tracing::error!(%error, "window creation failed");
                self.init_error = Some(error.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("window close requested");
                self.pending.push(InputEvent::Quit);
            }
            WindowEvent::Resized(size) => {
                debug!(width = size.width, height = size.height, "window resized");
                self.width = size.width;
                self.height = size.height;
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            _ => {}
        }
    }
}

/// The pumped event loop plus its handler, shared between the window and
/// event-source halves of the platform.
struct PumpState {
    event_loop: EventLoop<()>,
    app: WindowApp,
}

impl PumpState {
    /// Drain the OS queue and take the translated events.
    fn pump(&mut self) -> Vec<InputEvent> {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app);
        if let PumpStatus::Exit(code) = status {
            debug!(code, "event loop exited");
            self.app.pending.push(InputEvent::Quit);
        }
        std::mem::take(&mut self.app.pending)
    }

    fn render(&mut self, clear_color: Color, vertices: &[Vertex]) {
        let Some(renderer) = &mut self.app.renderer else {
            warn!("present before the GPU surface exists");
            return;
        };
        match renderer.render(clear_color, vertices) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                renderer.resize(self.app.width, self.app.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory, shutting down");
                self.app.pending.push(InputEvent::Quit);
            }
            Err(error) => warn!(%error, "surface error during render"),
        }
    }
}

// ---------------------------------------------------------------------------
// Platform trait impls
// ---------------------------------------------------------------------------

/// [`Window`] over the winit window and the quad renderer.
struct WinitWindow {
    shared: Rc<RefCell<PumpState>>,
    surface: CommandSurface,
}

impl Window for WinitWindow {
    fn width(&self) -> u32 {
        self.shared.borrow().app.width
    }

    fn height(&self) -> u32 {
        self.shared.borrow().app.height
    }

    fn set_title(&mut self, title: &str) {
        if let Some(window) = &self.shared.borrow().app.window {
            window.set_title(title);
        }
    }

    fn surface(&mut self) -> &mut dyn Surface {
        let (width, height) = {
            let shared = self.shared.borrow();
            (shared.app.width, shared.app.height)
        };
        self.surface.set_dimensions(width, height);
        &mut self.surface
    }

    fn present(&mut self) {
        self.shared
            .borrow_mut()
            .render(self.surface.clear_color(), self.surface.vertices());
    }
}

/// [`EventSource`] that pumps winit once per poll.
struct WinitEvents {
    shared: Rc<RefCell<PumpState>>,
}

impl EventSource for WinitEvents {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.shared.borrow_mut().pump()
    }
}

/// [`KeyboardState`] over the key set the event handler maintains.
struct WinitKeyboard {
    keys: Rc<RefCell<HashSet<Key>>>,
}

impl KeyboardState for WinitKeyboard {
    fn is_pressed(&self, key: Key) -> bool {
        self.keys.borrow().contains(&key)
    }
}

// ---------------------------------------------------------------------------
// WindowedPlatform
// ---------------------------------------------------------------------------

/// Pumps spent waiting for the initial `resumed` event. Desktop backends
/// deliver it on the first pump; the margin covers slow compositors.
const INIT_PUMP_ATTEMPTS: u32 = 16;

/// Builder for the windowed platform bundle.
///
/// `build` creates the event loop, window and GPU surface, then assembles a
/// [`Platform`] whose clock paces real frames. Construction fails cleanly
/// when no window system or GPU is available, so callers can fall back to
/// [`HeadlessPlatform`](crate::headless::HeadlessPlatform).
pub struct WindowedPlatform {
    title: String,
    width: u32,
    height: u32,
}

impl WindowedPlatform {
    pub fn new(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_owned(),
            width,
            height,
        }
    }

    /// Create the window and GPU surface and assemble the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop cannot be created, the window
    /// never appears, or GPU initialization fails.
    pub fn build(self) -> Result<Platform, anyhow::Error> {
        let mut event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let keys = Rc::new(RefCell::new(HashSet::new()));
        let mut app = WindowApp::new(&self.title, self.width, self.height, Rc::clone(&keys));

        for _ in 0..INIT_PUMP_ATTEMPTS {
            let _ = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app);
            if app.renderer.is_some() || app.init_error.is_some() {
                break;
            }
        }
        if let Some(error) = app.init_error.take() {
            return Err(error.context("windowed platform initialization failed"));
        }
        anyhow::ensure!(
            app.renderer.is_some(),
            "window was not created; no resumed event after {INIT_PUMP_ATTEMPTS} pumps"
        );

        let width = app.width;
        let height = app.height;
        let shared = Rc::new(RefCell::new(PumpState { event_loop, app }));

        Ok(Platform {
            window: Box::new(WinitWindow {
                shared: Rc::clone(&shared),
                surface: CommandSurface::new(width, height),
            }),
            events: Box::new(WinitEvents { shared }),
            clock: Box::new(FrameClock::new()),
            keyboard: Rc::new(WinitKeyboard { keys }),
            audio: Rc::new(NullAudio::new()),
            fonts: Rc::new(BitmapFonts::new()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
