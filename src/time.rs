/// Game clock fed with timestamps from the platform (`performance.now()` in
/// the browser, anything monotonic in tests).
///
/// - `tick(now)` -> seconds since the previous tick (0 on the first one)
/// - `total()`   -> seconds accumulated over all running ticks
///
/// A paused or stopped clock ticks 0, and the first tick after a resume
/// reports 0 too: time spent paused is never handed to the game.
#[derive(Debug, Default, Clone, Copy)]
pub struct GameTime {
    total: f64,
    elapsed: f64,
    last_stamp: Option<f64>,
    started: bool,
    running: bool,
}

impl GameTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock, or pick up where it paused when `resume` is set
    pub fn start(&mut self, resume: bool) -> &mut Self {
        if !resume {
            self.total = 0.0;
        }
        self.started = true;
        self.running = true;
        self.last_stamp = None;
        self
    }

    /// `reset` forgets the accumulated time (stopped), otherwise paused
    pub fn stop(&mut self, reset: bool) -> &mut Self {
        self.running = false;
        self.elapsed = 0.0;
        self.last_stamp = None;
        if reset {
            self.started = false;
            self.total = 0.0;
        }
        self
    }

    /// `now` is in milliseconds, the result in seconds
    pub fn tick(&mut self, now: f64) -> f64 {
        if !self.running {
            return 0.0;
        }
        self.elapsed = match self.last_stamp {
            // clocks can jump backwards when a tab is restored
            Some(last) => ((now - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.total += self.elapsed;
        self.last_stamp = Some(now);
        self.elapsed
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn paused(&self) -> bool {
        self.started && !self.running
    }

    pub fn stopped(&self) -> bool {
        !self.started
    }
}

/// Turns variable frame deltas into a whole number of fixed steps.
///
/// Backlog beyond `max_steps` is dropped rather than replayed, otherwise a
/// long stall (hidden tab) would freeze the page catching up.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: f64,
    max_steps: u32,
    accumulated: f64,
}

impl FixedStep {
    pub fn new(step: f64, max_steps: u32) -> Self {
        FixedStep {
            step: if step.is_finite() && step > 0.0 { step } else { 1.0 / 60.0 },
            max_steps: max_steps.max(1),
            accumulated: 0.0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn set_step(&mut self, step: f64) {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
    }

    pub fn accumulate(&mut self, dt: f64) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulated += dt;
        }
        let mut steps = 0;
        while self.accumulated >= self.step && steps < self.max_steps {
            self.accumulated -= self.step;
            steps += 1;
        }
        if steps == self.max_steps && self.accumulated >= self.step {
            log::debug!("dropping {:.3}s of update backlog", self.accumulated);
            self.accumulated %= self.step;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}
