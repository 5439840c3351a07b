//! Machine-cycle clock and real-time pacing.

use std::time::{Duration, Instant};

/// Base machine cycles per second (4.194304 MHz / 4).
pub const BASE_CYCLES_PER_SECOND: u64 = 1_048_576;

/// Base machine cycles in one video frame (154 lines of 114 cycles).
pub const BASE_CYCLES_PER_FRAME: u64 = 17_556;

/// Global cycle counter. `cycles` counts CPU machine cycles and never
/// decreases; `base_cycles` is the fixed-rate domain the display, serial and
/// audio units follow, which advances every other CPU cycle in double speed.
#[derive(Debug, Default, Clone)]
pub struct Clock {
    cycles: u64,
    base_cycles: u64,
    double_speed: bool,
    half_step: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one CPU machine cycle. Returns whether the base domain
    /// advanced too.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.cycles += 1;
        if self.double_speed {
            self.half_step = !self.half_step;
            if self.half_step {
                return false;
            }
        }
        self.base_cycles += 1;
        true
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn base_cycles(&self) -> u64 {
        self.base_cycles
    }

    pub fn double_speed(&self) -> bool {
        self.double_speed
    }

    pub fn set_double_speed(&mut self, on: bool) {
        self.double_speed = on;
        self.half_step = false;
    }
}

/// Turns frame-tick timestamps into base-cycle budgets.
///
/// The pacer must be anchored exactly once per run; anchoring an already
/// anchored pacer is a programming error.
#[derive(Debug, Clone)]
pub struct FramePacer {
    anchor: Option<Instant>,
    max_catch_up_frames: u32,
    carry: f64,
}

impl FramePacer {
    pub fn new(max_catch_up_frames: u32) -> Self {
        Self {
            anchor: None,
            max_catch_up_frames: max_catch_up_frames.max(1),
            carry: 0.0,
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&mut self, now: Instant) {
        assert!(
            self.anchor.is_none(),
            "frame pacer anchored twice without a reset"
        );
        self.anchor = Some(now);
        self.carry = 0.0;
    }

    /// Forget the anchor, e.g. when the session stops.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.carry = 0.0;
    }

    /// Base cycles owed for the wall time between the previous tick and
    /// `now`, capped at `max_catch_up_frames` frames. An unanchored pacer
    /// anchors at `now` and owes one frame.
    pub fn budget(&mut self, now: Instant) -> u64 {
        let Some(prev) = self.anchor else {
            self.anchor(now);
            return BASE_CYCLES_PER_FRAME;
        };
        let elapsed = now.saturating_duration_since(prev);
        self.anchor = Some(now);
        self.cycles_for(elapsed)
    }

    fn cycles_for(&mut self, elapsed: Duration) -> u64 {
        let exact = elapsed.as_secs_f64() * BASE_CYCLES_PER_SECOND as f64 + self.carry;
        let cap = BASE_CYCLES_PER_FRAME * self.max_catch_up_frames as u64;
        let whole = exact.floor();
        if whole >= cap as f64 {
            self.carry = 0.0;
            return cap;
        }
        self.carry = exact - whole;
        whole as u64
    }
}
