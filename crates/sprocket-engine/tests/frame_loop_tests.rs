//! Tests for the frame loop: tick/draw cadence, freezing, pausing, and the
//! quit path, all driven through a headless platform.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sprocket_engine::headless::{DrawOp, HeadlessPlatform};
use sprocket_engine::prelude::*;

// ---------------------------------------------------------------------------
// Test behavior
// ---------------------------------------------------------------------------

/// Counts its hook invocations and draws a small rectangle at its position.
struct Blip {
    ticks: Rc<Cell<u32>>,
    draws: Rc<Cell<u32>>,
    dt_sum: Rc<Cell<f64>>,
}

impl EntityBehavior for Blip {
    fn on_tick(&mut self, _core: &mut EntityCore, dt_ms: f64) {
        self.ticks.set(self.ticks.get() + 1);
        self.dt_sum.set(self.dt_sum.get() + dt_ms);
    }

    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        self.draws.set(self.draws.get() + 1);
        surface.fill_rect(core.position(), Vec2::new(8.0, 8.0), Color::WHITE);
    }
}

/// Per-instance counters, pushed in instantiation order so tests can index
/// them by spawn order.
struct BlipHandles {
    ticks: Rc<Cell<u32>>,
    draws: Rc<Cell<u32>>,
    dt_sum: Rc<Cell<f64>>,
}

fn blip_factory() -> (EntityFactory, Rc<RefCell<Vec<BlipHandles>>>) {
    let ledger: Rc<RefCell<Vec<BlipHandles>>> = Rc::default();
    let mut factory = EntityFactory::new();

    let minted = Rc::clone(&ledger);
    factory.register_class("Blip", move |_data| {
        let ticks = Rc::new(Cell::new(0));
        let draws = Rc::new(Cell::new(0));
        let dt_sum = Rc::new(Cell::new(0.0));
        minted.borrow_mut().push(BlipHandles {
            ticks: Rc::clone(&ticks),
            draws: Rc::clone(&draws),
            dt_sum: Rc::clone(&dt_sum),
        });
        Ok(Box::new(Blip {
            ticks,
            draws,
            dt_sum,
        }))
    });
    (factory, ledger)
}

fn fill_colors(ops: &[DrawOp]) -> Vec<Color> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::Fill { color } => Some(*color),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Tick and draw cadence
// ---------------------------------------------------------------------------

#[test]
fn frozen_entity_skips_ticks_but_keeps_drawing() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

    let a = engine.spawn("Blip", "statue", CreationData::new()).unwrap();
    engine.spawn("Blip", "walker", CreationData::new()).unwrap();
    a.borrow_mut().core_mut().set_frozen(true);

    engine.run_frames(5);

    let ledger = ledger.borrow();
    assert_eq!(ledger[0].ticks.get(), 0, "frozen entity never ticks");
    assert_eq!(ledger[0].draws.get(), 5, "frozen entity still draws");
    assert_eq!(ledger[1].ticks.get(), 5);
    assert_eq!(ledger[1].draws.get(), 5);
}

#[test]
fn entities_draw_in_insertion_order_after_the_clear() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, _ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

    let a = engine.spawn("Blip", "under", CreationData::new()).unwrap();
    let b = engine.spawn("Blip", "over", CreationData::new()).unwrap();
    a.borrow_mut().core_mut().set_position(Vec2::new(10.0, 10.0));
    b.borrow_mut().core_mut().set_position(Vec2::new(50.0, 50.0));

    engine.run_frames(1);

    let ops = platform.take_draw_ops();
    assert_eq!(ops.len(), 3, "one clear plus one rect per entity");
    assert!(matches!(ops[0], DrawOp::Fill { .. }));
    assert!(matches!(ops[1], DrawOp::Rect { origin, .. } if origin == Vec2::new(10.0, 10.0)));
    assert!(matches!(ops[2], DrawOp::Rect { origin, .. } if origin == Vec2::new(50.0, 50.0)));
}

#[test]
fn manual_clock_hands_entities_the_fixed_dt() {
    let platform = HeadlessPlatform::new(800, 600).with_frame_time(20.0);
    let (factory, ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());
    engine.spawn("Blip", "timed", CreationData::new()).unwrap();

    engine.run_frames(5);

    assert_eq!(ledger.borrow()[0].dt_sum.get(), 100.0);
}

// ---------------------------------------------------------------------------
// 2. Pause
// ---------------------------------------------------------------------------

#[test]
fn pause_switches_the_clear_color_and_suppresses_ticks() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());
    engine.spawn("Blip", "only", CreationData::new()).unwrap();

    platform.queue_events(vec![]);
    platform.queue_events(vec![InputEvent::KeyDown(Key::P)]);
    engine.run_frames(3);

    assert!(engine.is_paused());
    assert_eq!(
        fill_colors(&platform.draw_ops()),
        [Color::BLACK, Color::SLATE, Color::SLATE],
        "paused frames clear with the paused color"
    );
    let ledger = ledger.borrow();
    assert_eq!(ledger[0].ticks.get(), 1, "only the unpaused frame ticked");
    assert_eq!(ledger[0].draws.get(), 3, "every frame drew");
}

#[test]
fn pause_toggles_back_off() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());
    engine.spawn("Blip", "only", CreationData::new()).unwrap();

    platform.queue_events(vec![InputEvent::KeyDown(Key::P)]);
    platform.queue_events(vec![InputEvent::KeyDown(Key::P)]);
    engine.run_frames(3);

    assert!(!engine.is_paused());
    assert_eq!(
        fill_colors(&platform.draw_ops()),
        [Color::SLATE, Color::BLACK, Color::BLACK]
    );
    assert_eq!(ledger.borrow()[0].ticks.get(), 2);
}

#[test]
fn pause_updates_the_window_title_immediately() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, _ledger) = blip_factory();
    let config = EngineConfig {
        title: "loop-demo".to_owned(),
        ..Default::default()
    };
    let mut engine = Engine::new(config, factory, platform.build());

    platform.queue_events(vec![InputEvent::KeyDown(Key::P)]);
    platform.queue_events(vec![InputEvent::KeyDown(Key::P)]);
    engine.run_frames(2);

    assert_eq!(
        platform.titles(),
        ["loop-demo", "loop-demo [paused]", "loop-demo"],
        "construction title, paused decoration, plain title again"
    );
}

#[test]
fn other_keys_do_not_pause() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, _ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

    platform.queue_events(vec![
        InputEvent::KeyDown(Key::W),
        InputEvent::KeyUp(Key::W),
        InputEvent::KeyDown(Key::Space),
    ]);
    engine.run_frames(1);

    assert!(!engine.is_paused());
}

// ---------------------------------------------------------------------------
// 3. Quit and frame accounting
// ---------------------------------------------------------------------------

#[test]
fn quit_finishes_its_frame_then_stops() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());
    engine.spawn("Blip", "only", CreationData::new()).unwrap();

    platform.queue_events(vec![]);
    platform.queue_events(vec![InputEvent::Quit]);
    let executed = engine.run_frames(10);

    assert_eq!(executed, 2, "the quitting frame still counts");
    assert_eq!(platform.present_count(), 2, "the quitting frame presents");
    assert_eq!(ledger.borrow()[0].draws.get(), 2, "the quitting frame draws");
}

#[test]
fn run_stops_on_quit() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, _ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

    platform.queue_events(vec![InputEvent::Quit]);
    engine.run();

    assert_eq!(engine.frame_count(), 1);
}

#[test]
fn frame_count_accumulates_across_runs() {
    let platform = HeadlessPlatform::new(800, 600);
    let (factory, _ledger) = blip_factory();
    let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

    assert_eq!(engine.run_frames(4), 4);
    assert_eq!(engine.run_frames(3), 3);
    assert_eq!(engine.frame_count(), 7);
    assert_eq!(platform.present_count(), 7);
}

// ---------------------------------------------------------------------------
// 4. Frame accounting holds for arbitrary budgets and quit timing
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// A quit queued for frame `q` (0-based) stops the loop after
        /// `q + 1` frames, bounded by the budget; every executed frame
        /// presents.
        #[test]
        fn executed_frames_match_budget_and_quit(budget in 0u64..12, quit_frame in 0u64..12) {
            let platform = HeadlessPlatform::new(320, 200);
            let (factory, _ledger) = blip_factory();
            let mut engine = Engine::new(EngineConfig::default(), factory, platform.build());

            for _ in 0..quit_frame {
                platform.queue_events(vec![]);
            }
            platform.queue_events(vec![InputEvent::Quit]);

            let executed = engine.run_frames(budget);
            prop_assert_eq!(executed, budget.min(quit_frame + 1));
            prop_assert_eq!(platform.present_count(), executed);
            prop_assert_eq!(engine.frame_count(), executed);
        }
    }
}
