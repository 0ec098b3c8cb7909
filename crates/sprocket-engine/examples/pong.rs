//! Interactive pong -- two player-controlled paddles and a served ball.
//!
//! Run with:
//!   cargo run --example pong --features renderer -p sprocket-engine
//!
//! Controls:
//!   W/S -- left paddle
//!   Up/Down -- right paddle
//!   P -- pause
//!   Close the window to quit

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde_json::json;
use sprocket_engine::prelude::*;
use sprocket_engine::render::WindowedPlatform;

// ---------------------------------------------------------------------------
// Court constants
// ---------------------------------------------------------------------------

const PADDLE_WIDTH: f64 = 14.0;
const PADDLE_HEIGHT: f64 = 72.0;
const PADDLE_MARGIN: f64 = 28.0;
/// Paddle travel in pixels per millisecond.
const PADDLE_SPEED: f64 = 0.45;
const SERVE_DELAY_MS: f64 = 900.0;
const FLASH_INTERVAL_MS: f64 = 140.0;
const FLASH_TOGGLES: u32 = 6;
const NET_COLOR: Color = Color::rgb(80, 80, 80);

// ---------------------------------------------------------------------------
// Shared score state
// ---------------------------------------------------------------------------

/// Which half of the court an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn from_data(data: &CreationData) -> Result<Self, CreationDataError> {
        match data.str_value("side")? {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(CreationDataError::WrongType {
                key: "side".to_owned(),
                expected: "\"left\" or \"right\"",
                found: "another string",
            }),
        }
    }
}

/// Score state shared between the ball, which awards points, and the
/// scoreboard, which displays them.
#[derive(Debug, Default)]
struct ScoreChannel {
    left: Cell<u32>,
    right: Cell<u32>,
    flash_requested: Cell<bool>,
}

impl ScoreChannel {
    fn award(&self, side: Side) {
        let counter = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        counter.set(counter.get() + 1);
        self.flash_requested.set(true);
    }
}

// ---------------------------------------------------------------------------
// Paddle
// ---------------------------------------------------------------------------

struct Paddle {
    side: Side,
}

impl Paddle {
    fn from_data(data: &CreationData) -> Result<Self, CreationDataError> {
        Ok(Self {
            side: Side::from_data(data)?,
        })
    }

    fn keys(&self) -> (Key, Key) {
        match self.side {
            Side::Left => (Key::W, Key::S),
            Side::Right => (Key::Up, Key::Down),
        }
    }
}

impl EntityBehavior for Paddle {
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        let context = core.context();
        let width = f64::from(context.window_width());
        let height = f64::from(context.window_height());
        let x = match self.side {
            Side::Left => PADDLE_MARGIN,
            Side::Right => width - PADDLE_MARGIN - PADDLE_WIDTH,
        };
        core.set_position(Vec2::new(x, (height - PADDLE_HEIGHT) / 2.0));
    }

    fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
        let (up, down) = self.keys();
        let context = core.context();
        let mut shift = 0.0;
        if context.is_key_pressed(up) {
            shift -= PADDLE_SPEED * dt_ms;
        }
        if context.is_key_pressed(down) {
            shift += PADDLE_SPEED * dt_ms;
        }
        if shift == 0.0 {
            return;
        }
        let floor = f64::from(context.window_height()) - PADDLE_HEIGHT;
        let position = core.position();
        core.set_position(Vec2::new(position.x, (position.y + shift).clamp(0.0, floor)));
    }

    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        surface.fill_rect(
            core.position(),
            Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
            Color::WHITE,
        );
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::new(0.0, 0.0, PADDLE_WIDTH, PADDLE_HEIGHT)
    }
}

// ---------------------------------------------------------------------------
// Ball
// ---------------------------------------------------------------------------

struct Ball {
    size: f64,
    /// Serve speed in pixels per millisecond.
    speed: f64,
    velocity: Vec2,
    serve_toward: Side,
    serve_timer: Timer,
    serve_ready: Rc<Cell<bool>>,
    rng: Pcg64,
    paddles: Vec<Rc<RefCell<Entity>>>,
    bounce_sound: Option<Sound>,
    score_sound: Option<Sound>,
    channel: Rc<ScoreChannel>,
}

impl Ball {
    fn from_data(
        data: &CreationData,
        channel: Rc<ScoreChannel>,
    ) -> Result<Self, CreationDataError> {
        let serve_ready = Rc::new(Cell::new(false));
        let flag = Rc::clone(&serve_ready);
        Ok(Self {
            size: data.f64_value("size")?,
            speed: data.f64_value("speed")?,
            velocity: Vec2::ZERO,
            serve_toward: Side::Right,
            serve_timer: Timer::new(SERVE_DELAY_MS, move || flag.set(true)),
            serve_ready,
            rng: Pcg64::seed_from_u64(data.i64_value("seed")? as u64),
            paddles: Vec::new(),
            bounce_sound: None,
            score_sound: None,
            channel,
        })
    }

    fn center(&self, core: &EntityCore) -> Vec2 {
        let context = core.context();
        Vec2::new(
            (f64::from(context.window_width()) - self.size) / 2.0,
            (f64::from(context.window_height()) - self.size) / 2.0,
        )
    }

    fn launch(&mut self) {
        let toward = match self.serve_toward {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };
        let tilt = self.rng.gen_range(-0.6..0.6);
        self.velocity = Vec2::new(self.speed * toward, self.speed * tilt);
    }

    fn rack_up(&mut self, core: &mut EntityCore, scorer: Side) {
        self.channel.award(scorer);
        if let Some(sound) = &self.score_sound {
            sound.play();
        }
        // Serve toward whoever just conceded.
        self.serve_toward = match scorer {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        let center = self.center(core);
        core.set_position(center);
        self.velocity = Vec2::ZERO;
        self.serve_timer.start();
    }

    fn play_bounce(&self) {
        if let Some(sound) = &self.bounce_sound {
            sound.play();
        }
    }
}

impl EntityBehavior for Ball {
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        let context = core.context();
        // The ball is the first level record; begin-play runs after every
        // record has spawned, so both paddle lookups resolve.
        for name in ["paddle_left", "paddle_right"] {
            if let Some(paddle) = context.entities().get_by_name(name) {
                self.paddles.push(paddle);
            }
        }
        self.bounce_sound = context.load_sound("sounds/bounce.wav").ok();
        self.score_sound = context.load_sound("sounds/score.wav").ok();

        let center = self.center(core);
        core.set_position(center);
        self.serve_toward = if self.rng.gen_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        self.serve_timer.start();
    }

    fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
        self.serve_timer.update();
        if self.serve_ready.take() {
            self.launch();
        }
        if self.velocity == Vec2::ZERO {
            return;
        }

        let context = core.context();
        let width = f64::from(context.window_width());
        let height = f64::from(context.window_height());
        let mut next = core.position() + self.velocity * dt_ms;

        // Top and bottom walls reflect.
        if next.y <= 0.0 {
            next.y = 0.0;
            self.velocity.y = self.velocity.y.abs();
            self.play_bounce();
        } else if next.y + self.size >= height {
            next.y = height - self.size;
            self.velocity.y = -self.velocity.y.abs();
            self.play_bounce();
        }

        // Paddles reflect toward the opposite side, with the contact point
        // steering the return angle.
        let ball_box = Aabb::new(0.0, 0.0, self.size, self.size).translated(next);
        for paddle in &self.paddles {
            let paddle = paddle.borrow();
            let paddle_box = paddle.positioned_bounding_box();
            if !ball_box.intersects(paddle_box) {
                continue;
            }
            let paddle_mid = (paddle_box.bottom + paddle_box.top) / 2.0;
            let ball_mid = next.y + self.size / 2.0;
            let lean = ((ball_mid - paddle_mid) / (PADDLE_HEIGHT / 2.0)).clamp(-1.0, 1.0);
            if paddle_box.left < width / 2.0 {
                self.velocity.x = self.velocity.x.abs();
                next.x = paddle_box.right;
            } else {
                self.velocity.x = -self.velocity.x.abs();
                next.x = paddle_box.left - self.size;
            }
            self.velocity.y = self.speed * lean;
            self.play_bounce();
        }

        // A ball fully past an edge scores for the other side.
        if next.x + self.size < 0.0 {
            self.rack_up(core, Side::Right);
            return;
        }
        if next.x > width {
            self.rack_up(core, Side::Left);
            return;
        }

        core.set_position(next);
    }

    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        let half = self.size / 2.0;
        surface.fill_circle(core.position() + Vec2::new(half, half), half, Color::WHITE);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::new(0.0, 0.0, self.size, self.size)
    }
}

// ---------------------------------------------------------------------------
// ScoreBoard
// ---------------------------------------------------------------------------

struct ScoreBoard {
    channel: Rc<ScoreChannel>,
    font: Option<Font>,
    flash: Alternator,
}

impl ScoreBoard {
    fn new(channel: Rc<ScoreChannel>) -> Self {
        Self {
            channel,
            font: None,
            flash: Alternator::new(FLASH_INTERVAL_MS, FLASH_TOGGLES),
        }
    }
}

impl EntityBehavior for ScoreBoard {
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        self.font = core.context().load_system_font("couriernew", 32).ok();
    }

    fn on_tick(&mut self, _core: &mut EntityCore, _dt_ms: f64) {
        if self.channel.flash_requested.take() {
            self.flash.start();
        }
        self.flash.update();
    }

    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        let context = core.context();
        let width = f64::from(context.window_width());
        let height = f64::from(context.window_height());

        let mut y = 8.0;
        while y < height {
            surface.fill_rect(
                Vec2::new(width / 2.0 - 2.0, y),
                Vec2::new(4.0, 12.0),
                NET_COLOR,
            );
            y += 24.0;
        }

        if !self.flash.visible() {
            return;
        }
        let Some(font) = self.font else {
            return;
        };
        let text = format!(
            "{}   {}",
            self.channel.left.get(),
            self.channel.right.get()
        );
        surface.draw_text_centered(font, &text, Vec2::new(width / 2.0, 36.0), Color::WHITE);
    }
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let channel = Rc::new(ScoreChannel::default());

    let mut factory = EntityFactory::new();
    factory.register_class("Paddle", |data| Ok(Box::new(Paddle::from_data(data)?)));
    let ball_channel = Rc::clone(&channel);
    factory.register_class("Ball", move |data| {
        Ok(Box::new(Ball::from_data(data, Rc::clone(&ball_channel))?))
    });
    let board_channel = Rc::clone(&channel);
    factory.register_class("ScoreBoard", move |_data| {
        Ok(Box::new(ScoreBoard::new(Rc::clone(&board_channel))))
    });

    let level = LevelSpec::new("court")
        .with_entity(
            EntityRecord::new("ball", "Ball").with_data(
                CreationData::new()
                    .with("size", json!(12.0))
                    .with("speed", json!(0.38))
                    .with("seed", json!(7)),
            ),
        )
        .with_entity(
            EntityRecord::new("paddle_left", "Paddle")
                .with_data(CreationData::new().with("side", json!("left"))),
        )
        .with_entity(
            EntityRecord::new("paddle_right", "Paddle")
                .with_data(CreationData::new().with("side", json!("right"))),
        )
        .with_entity(EntityRecord::new("scoreboard", "ScoreBoard"));

    let config = EngineConfig {
        title: "Sprocket Pong".to_owned(),
        ..EngineConfig::default()
    };
    let platform = WindowedPlatform::new(&config.title, config.width, config.height).build()?;
    let mut engine = Engine::new(config, factory, platform);
    engine.load_level(&level)?;

    println!("Controls: W/S and Up/Down move the paddles, P pauses, close the window to quit");
    engine.run();
    Ok(())
}
