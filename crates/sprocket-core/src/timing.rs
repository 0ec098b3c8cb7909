//! Cooperative timing primitives: a one-shot [`Timer`] and a bounded
//! blinking [`Alternator`].
//!
//! Neither primitive owns a thread. Both are advanced by calling `update()`
//! exactly once per frame from the owning entity's tick, and callbacks fire
//! synchronously, in-line with the frame that crosses the deadline. Time is
//! read from a [`TimeSource`] so tests can drive these deterministically;
//! the default source is a monotonic process clock.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

// ---------------------------------------------------------------------------
// TimeSource
// ---------------------------------------------------------------------------

/// Supplies the current time in milliseconds.
///
/// The absolute origin is irrelevant; only differences between readings are
/// ever used.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Monotonic process clock. Reports milliseconds since its construction.
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Shared, manually advanced time source for tests.
///
/// Clones observe the same underlying value, so a test can hold one handle
/// and hand another to the primitive under test.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now_ms: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: f64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A one-shot timer that fires a callback the first time `update()` observes
/// `delay_ms` elapsed since `start()`.
///
/// State machine: idle until [`Timer::start`], then running, then finished
/// once the callback has fired. `update()` is a no-op while idle or
/// finished. Calling `start()` again at any point resets to running, after
/// which the callback can fire once more.
pub struct Timer<T: TimeSource = MonotonicTime> {
    delay_ms: f64,
    started: bool,
    finished: bool,
    started_at: f64,
    on_finished: Box<dyn FnMut()>,
    time: T,
}

impl Timer<MonotonicTime> {
    /// Timer on the monotonic process clock.
    pub fn new(delay_ms: f64, on_finished: impl FnMut() + 'static) -> Self {
        Self::with_time_source(delay_ms, on_finished, MonotonicTime::new())
    }
}

impl<T: TimeSource> Timer<T> {
    /// Timer on an explicit time source.
    pub fn with_time_source(delay_ms: f64, on_finished: impl FnMut() + 'static, time: T) -> Self {
        Self {
            delay_ms,
            started: false,
            finished: false,
            started_at: 0.0,
            on_finished: Box::new(on_finished),
            time,
        }
    }

    /// Begin (or restart) the countdown from the current time.
    pub fn start(&mut self) {
        self.started = true;
        self.finished = false;
        self.started_at = self.time.now_ms();
    }

    /// Poll the timer. Fires the callback exactly once per `start()` when at
    /// least `delay_ms` have elapsed.
    pub fn update(&mut self) {
        if !self.started || self.finished {
            return;
        }
        if self.time.now_ms() - self.started_at >= self.delay_ms {
            self.finished = true;
            (self.on_finished)();
        }
    }

    /// True between `start()` and the callback firing.
    pub fn is_running(&self) -> bool {
        self.started && !self.finished
    }

    /// True once the callback has fired for the current `start()`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }
}

impl<T: TimeSource + fmt::Debug> fmt::Debug for Timer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("delay_ms", &self.delay_ms)
            .field("started", &self.started)
            .field("finished", &self.finished)
            .field("started_at", &self.started_at)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Alternator
// ---------------------------------------------------------------------------

/// A bounded on/off toggler for blink-style feedback (e.g. flashing a score
/// after it changes).
///
/// `start()` hides the owner (visible = false) and begins toggling
/// visibility every `delay_ms`. After `max_toggles + 1` elapsed intervals
/// the alternator returns to idle on its own. While idle, [`Alternator::visible`]
/// reports `true` unconditionally, so an owner that only blinks while
/// running can use the flag directly as its draw condition.
#[derive(Debug)]
pub struct Alternator<T: TimeSource = MonotonicTime> {
    delay_ms: f64,
    max_toggles: u32,
    toggle_count: u32,
    visible: bool,
    running: bool,
    started_at: f64,
    time: T,
}

impl Alternator<MonotonicTime> {
    /// Alternator on the monotonic process clock.
    pub fn new(delay_ms: f64, max_toggles: u32) -> Self {
        Self::with_time_source(delay_ms, max_toggles, MonotonicTime::new())
    }
}

impl<T: TimeSource> Alternator<T> {
    /// Alternator on an explicit time source.
    pub fn with_time_source(delay_ms: f64, max_toggles: u32, time: T) -> Self {
        Self {
            delay_ms,
            max_toggles,
            toggle_count: 0,
            visible: true,
            running: false,
            started_at: 0.0,
            time,
        }
    }

    /// Begin (or restart) the toggling sequence. The owner is immediately
    /// hidden; the first interval ends `delay_ms` from now.
    pub fn start(&mut self) {
        self.running = true;
        self.visible = false;
        self.toggle_count = 0;
        self.started_at = self.time.now_ms();
    }

    /// Poll the alternator. Each elapsed interval flips visibility; after
    /// `max_toggles + 1` intervals the sequence ends and the alternator is
    /// idle again.
    ///
    /// An interval ends strictly after `delay_ms` (a reading of exactly
    /// `delay_ms` does not flip).
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        let now = self.time.now_ms();
        if now - self.started_at > self.delay_ms {
            self.started_at = now;
            self.toggle_count += 1;
            self.visible = !self.visible;
            if self.toggle_count > self.max_toggles {
                self.running = false;
            }
        }
    }

    /// Current visibility. Always `true` while idle; reflects the toggle
    /// phase while running.
    pub fn visible(&self) -> bool {
        self.visible || !self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn toggle_count(&self) -> u32 {
        self.toggle_count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_timer(delay_ms: f64) -> (Timer<ManualTime>, ManualTime, Rc<Cell<u32>>) {
        let time = ManualTime::new();
        let fired = Rc::new(Cell::new(0u32));
        let fired_in_cb = Rc::clone(&fired);
        let timer = Timer::with_time_source(
            delay_ms,
            move || fired_in_cb.set(fired_in_cb.get() + 1),
            time.clone(),
        );
        (timer, time, fired)
    }

    // -- Timer --------------------------------------------------------------

    #[test]
    fn timer_does_not_fire_before_delay() {
        let (mut timer, time, fired) = counting_timer(100.0);
        timer.start();
        time.advance(50.0);
        timer.update();
        assert_eq!(fired.get(), 0);
        assert!(timer.is_running());
    }

    #[test]
    fn timer_fires_exactly_once_after_delay() {
        let (mut timer, time, fired) = counting_timer(100.0);
        timer.start();
        time.advance(101.0);
        timer.update();
        assert_eq!(fired.get(), 1);
        assert!(timer.is_finished());

        // Further polling never refires without a new start().
        time.advance(500.0);
        timer.update();
        timer.update();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn timer_fires_on_exact_boundary() {
        let (mut timer, time, fired) = counting_timer(100.0);
        timer.start();
        time.advance(100.0);
        timer.update();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn timer_is_inert_until_started() {
        let (mut timer, time, fired) = counting_timer(10.0);
        time.advance(1000.0);
        timer.update();
        assert_eq!(fired.get(), 0);
        assert!(!timer.is_running());
        assert!(!timer.is_finished());
    }

    #[test]
    fn restart_after_finish_fires_again() {
        let (mut timer, time, fired) = counting_timer(100.0);
        timer.start();
        time.advance(150.0);
        timer.update();
        assert_eq!(fired.get(), 1);

        timer.start();
        assert!(timer.is_running());
        time.advance(99.0);
        timer.update();
        assert_eq!(fired.get(), 1);
        time.advance(2.0);
        timer.update();
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn restart_while_running_resets_the_countdown() {
        let (mut timer, time, fired) = counting_timer(100.0);
        timer.start();
        time.advance(90.0);
        timer.start();
        time.advance(90.0);
        timer.update();
        // 180ms total, but only 90ms since the second start.
        assert_eq!(fired.get(), 0);
        time.advance(10.0);
        timer.update();
        assert_eq!(fired.get(), 1);
    }

    // -- Alternator ---------------------------------------------------------

    #[test]
    fn alternator_is_visible_while_idle() {
        let time = ManualTime::new();
        let alternator = Alternator::with_time_source(10.0, 3, time);
        assert!(alternator.visible());
        assert!(!alternator.is_running());
    }

    #[test]
    fn start_hides_immediately() {
        let time = ManualTime::new();
        let mut alternator = Alternator::with_time_source(10.0, 3, time);
        alternator.start();
        assert!(!alternator.visible());
        assert!(alternator.is_running());
    }

    #[test]
    fn visibility_flips_every_interval() {
        let time = ManualTime::new();
        let mut alternator = Alternator::with_time_source(10.0, 9, time.clone());
        alternator.start();

        time.advance(11.0);
        alternator.update();
        assert!(alternator.visible(), "first interval shows");

        time.advance(11.0);
        alternator.update();
        assert!(!alternator.visible(), "second interval hides");

        time.advance(11.0);
        alternator.update();
        assert!(alternator.visible(), "third interval shows again");
    }

    #[test]
    fn no_flip_before_the_interval_elapses() {
        let time = ManualTime::new();
        let mut alternator = Alternator::with_time_source(10.0, 3, time.clone());
        alternator.start();
        time.advance(9.0);
        alternator.update();
        assert!(!alternator.visible());
        assert_eq!(alternator.toggle_count(), 0);
    }

    #[test]
    fn stops_after_max_toggles_plus_one_intervals() {
        let time = ManualTime::new();
        let mut alternator = Alternator::with_time_source(10.0, 3, time.clone());
        alternator.start();

        // max_toggles = 3 stops during the 4th elapsed interval.
        for _ in 0..3 {
            time.advance(11.0);
            alternator.update();
            assert!(alternator.is_running());
        }
        time.advance(11.0);
        alternator.update();
        assert!(!alternator.is_running());
        assert!(
            alternator.visible(),
            "idle alternator reports visible unconditionally"
        );

        // Further updates change nothing.
        time.advance(100.0);
        alternator.update();
        assert!(!alternator.is_running());
        assert!(alternator.visible());
    }

    #[test]
    fn restart_runs_a_fresh_sequence() {
        let time = ManualTime::new();
        let mut alternator = Alternator::with_time_source(10.0, 1, time.clone());
        alternator.start();
        time.advance(11.0);
        alternator.update();
        time.advance(11.0);
        alternator.update();
        assert!(!alternator.is_running());

        alternator.start();
        assert!(alternator.is_running());
        assert!(!alternator.visible());
        assert_eq!(alternator.toggle_count(), 0);
    }
}
