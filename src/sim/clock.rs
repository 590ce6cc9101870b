use serde::{Deserialize, Serialize};

/// Simulation updates per second of playtime.
pub const TICKS_PER_SECOND: u64 = 60;

/// Fixed playtime step.
pub const SIM_DT: f64 = 1.0 / TICKS_PER_SECOND as f64;

/// Maximum frame time to prevent spiral of death.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Elapsed playtime in seconds. Monotonic, saved with the game, and not
/// advanced while the game is paused.
///
/// Craft end times are `now() + duration`, so a reading taken exactly
/// `duration` seconds later must compare equal to it. Implementations should
/// report values on a grid that `f64` addition keeps exact.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Playtime counted in whole simulation ticks so that saving and loading
/// never loses precision.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayClock {
    ticks: u64,
    #[serde(skip)]
    accumulator: f64,
    #[serde(skip)]
    max_frame_time: Option<f64>,
}

impl PlayClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks, ..Self::default() }
    }

    pub fn with_max_frame_time(mut self, max: f64) -> Self {
        self.max_frame_time = Some(max);
        self
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Accumulate frame time and return how many ticks elapsed.
    pub fn accumulate(&mut self, frame_dt: f64) -> u32 {
        let cap = self.max_frame_time.unwrap_or(MAX_FRAME_TIME);
        self.accumulator += frame_dt.clamp(0.0, cap);

        let mut ticks = 0u32;
        while self.accumulator >= SIM_DT {
            self.accumulator -= SIM_DT;
            self.ticks += 1;
            ticks += 1;
        }
        ticks
    }

    /// Jump forward by whole seconds, bypassing the frame cap.
    pub fn advance_secs(&mut self, secs: u64) {
        self.ticks = self.ticks.saturating_add(secs.saturating_mul(TICKS_PER_SECOND));
    }
}

impl Clock for PlayClock {
    /// Whole seconds of playtime. Partial seconds are kept in the tick count
    /// but not reported.
    fn now(&self) -> f64 {
        (self.ticks / TICKS_PER_SECOND) as f64
    }
}
