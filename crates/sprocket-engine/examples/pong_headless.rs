//! Deterministic pong rally on the recording platform.
//!
//! Run with:
//!   cargo run --example pong_headless -p sprocket-engine
//!
//! Two self-steering paddles defend the court while a seeded ball serves
//! and rallies. Frames advance by a fixed simulated step and every random
//! draw comes from the seed in the level data, so the same seed always
//! replays the same match. At the end the recording platform reports what
//! a windowed run would have drawn and played.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde_json::json;
use sprocket_engine::prelude::*;

// ---------------------------------------------------------------------------
// Court constants
// ---------------------------------------------------------------------------

const COURT_WIDTH: u32 = 800;
const COURT_HEIGHT: u32 = 600;
const FRAME_MS: f64 = 1000.0 / 60.0;
/// One simulated minute.
const FRAMES: u64 = 3600;

const PADDLE_SIZE: Vec2 = Vec2::new(14.0, 72.0);
const PADDLE_MARGIN: f64 = 28.0;
/// Slower than the ball's steepest serve, so some serves get through.
const PADDLE_SPEED: f64 = 0.3;
const SERVE_DELAY_MS: f64 = 250.0;

// ---------------------------------------------------------------------------
// Shared score state
// ---------------------------------------------------------------------------

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

#[derive(Debug, Default)]
struct ScoreChannel {
    left: Cell<u32>,
    right: Cell<u32>,
}

// ---------------------------------------------------------------------------
// AutoPaddle
// ---------------------------------------------------------------------------

/// A paddle that chases the ball's vertical center at a capped speed.
struct AutoPaddle {
    side: Side,
    ball: Option<Rc<RefCell<Entity>>>,
}

impl AutoPaddle {
    fn from_data(data: &CreationData) -> Result<Self, CreationDataError> {
        Ok(Self {
            side: Side::from_data(data)?,
            ball: None,
        })
    }
}

impl EntityBehavior for AutoPaddle {
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        let context = core.context();
        // The ball is the last level record; begin-play runs after every
        // record has spawned, so this lookup resolves anyway.
        self.ball = context.entities().get_by_name("ball");

        let width = f64::from(context.window_width());
        let height = f64::from(context.window_height());
        let x = match self.side {
            Side::Left => PADDLE_MARGIN,
            Side::Right => width - PADDLE_MARGIN - PADDLE_SIZE.x,
        };
        core.set_position(Vec2::new(x, (height - PADDLE_SIZE.y) / 2.0));
    }

    fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
        let Some(ball) = &self.ball else {
            return;
        };
        let target = {
            let ball_box = ball.borrow().positioned_bounding_box();
            (ball_box.bottom + ball_box.top) / 2.0
        };
        let mid = core.position().y + PADDLE_SIZE.y / 2.0;
        let step = PADDLE_SPEED * dt_ms;
        let shift = (target - mid).clamp(-step, step);

        let floor = f64::from(core.context().window_height()) - PADDLE_SIZE.y;
        let position = core.position();
        core.set_position(Vec2::new(position.x, (position.y + shift).clamp(0.0, floor)));
    }

    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        surface.fill_rect(core.position(), PADDLE_SIZE, Color::WHITE);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::new(0.0, 0.0, PADDLE_SIZE.x, PADDLE_SIZE.y)
    }
}

// ---------------------------------------------------------------------------
// RallyBall
// ---------------------------------------------------------------------------

/// A ball that serves on a simulated-time countdown and mirrors off walls
/// and paddles, with a seeded jitter on each paddle return.
struct RallyBall {
    size: f64,
    speed: f64,
    velocity: Vec2,
    serve_toward: Side,
    sim_time: ManualTime,
    serve_timer: Timer<ManualTime>,
    serve_ready: Rc<Cell<bool>>,
    rng: Pcg64,
    paddles: Vec<Rc<RefCell<Entity>>>,
    bounce_sound: Option<Sound>,
    score_sound: Option<Sound>,
    channel: Rc<ScoreChannel>,
}

impl RallyBall {
    fn from_data(
        data: &CreationData,
        channel: Rc<ScoreChannel>,
    ) -> Result<Self, CreationDataError> {
        let serve_ready = Rc::new(Cell::new(false));
        let flag = Rc::clone(&serve_ready);
        // The serve countdown runs on simulated time, advanced by `dt` each
        // tick, so it fires on schedule no matter how fast the host executes
        // frames.
        let sim_time = ManualTime::new();
        Ok(Self {
            size: data.f64_value("size")?,
            speed: data.f64_value("speed")?,
            velocity: Vec2::ZERO,
            serve_toward: Side::Right,
            serve_timer: Timer::with_time_source(
                SERVE_DELAY_MS,
                move || flag.set(true),
                sim_time.clone(),
            ),
            sim_time,
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
        let tilt = self.rng.gen_range(-0.9..0.9);
        self.velocity = Vec2::new(self.speed * toward, self.speed * tilt);
    }

    fn rack_up(&mut self, core: &mut EntityCore, scorer: Side) {
        let counter = match scorer {
            Side::Left => &self.channel.left,
            Side::Right => &self.channel.right,
        };
        counter.set(counter.get() + 1);
        if let Some(sound) = &self.score_sound {
            sound.play();
        }
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

impl EntityBehavior for RallyBall {
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        let context = core.context();
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
        self.sim_time.advance(dt_ms);
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

        if next.y <= 0.0 {
            next.y = 0.0;
            self.velocity.y = self.velocity.y.abs();
            self.play_bounce();
        } else if next.y + self.size >= height {
            next.y = height - self.size;
            self.velocity.y = -self.velocity.y.abs();
            self.play_bounce();
        }

        let ball_box = Aabb::new(0.0, 0.0, self.size, self.size).translated(next);
        for paddle in &self.paddles {
            let paddle = paddle.borrow();
            let paddle_box = paddle.positioned_bounding_box();
            if !ball_box.intersects(paddle_box) {
                continue;
            }
            if paddle_box.left < width / 2.0 {
                self.velocity.x = self.velocity.x.abs();
                next.x = paddle_box.right;
            } else {
                self.velocity.x = -self.velocity.x.abs();
                next.x = paddle_box.left - self.size;
            }
            let jitter = self.rng.gen_range(-0.25..0.25);
            self.velocity.y = (self.velocity.y / self.speed + jitter).clamp(-0.9, 0.9) * self.speed;
            self.play_bounce();
        }

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
// Match setup
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let channel = Rc::new(ScoreChannel::default());

    let mut factory = EntityFactory::new();
    factory.register_class("AutoPaddle", |data| {
        Ok(Box::new(AutoPaddle::from_data(data)?))
    });
    let ball_channel = Rc::clone(&channel);
    factory.register_class("RallyBall", move |data| {
        Ok(Box::new(RallyBall::from_data(data, Rc::clone(&ball_channel))?))
    });

    let level = LevelSpec::new("rally")
        .with_entity(
            EntityRecord::new("paddle_left", "AutoPaddle")
                .with_data(CreationData::new().with("side", json!("left"))),
        )
        .with_entity(
            EntityRecord::new("paddle_right", "AutoPaddle")
                .with_data(CreationData::new().with("side", json!("right"))),
        )
        .with_entity(
            EntityRecord::new("ball", "RallyBall").with_data(
                CreationData::new()
                    .with("size", json!(12.0))
                    .with("speed", json!(0.5))
                    .with("seed", json!(42)),
            ),
        );

    let handles = HeadlessPlatform::new(COURT_WIDTH, COURT_HEIGHT).with_frame_time(FRAME_MS);
    let config = EngineConfig {
        title: "sprocket rally".to_owned(),
        width: COURT_WIDTH,
        height: COURT_HEIGHT,
        // No pacing: run the minute of play as fast as the host allows.
        target_fps: 0,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, factory, handles.build());
    engine.load_level(&level)?;

    let executed = engine.run_frames(FRAMES);

    let ops = handles.take_draw_ops();
    println!(
        "simulated {executed} frames ({:.1} s of play)",
        executed as f64 * FRAME_MS / 1000.0
    );
    println!(
        "final score: left {} - right {}",
        channel.left.get(),
        channel.right.get()
    );
    println!(
        "sounds played: {}",
        handles.audio().log().total_plays()
    );
    println!(
        "draw ops recorded: {}, frames presented: {}",
        ops.len(),
        handles.present_count()
    );
    Ok(())
}
