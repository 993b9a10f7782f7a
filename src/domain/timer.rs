/// Countdown timer for level time limits.
///
/// Time is kept in seconds, updates arrive in milliseconds. The expiry
/// hook fires at most once per arming: it is taken out of the timer the
/// first time `update` drives the countdown to zero.

use std::fmt;

use serde::{Deserialize, Serialize};

type ExpireHook = Box<dyn FnOnce()>;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    time: f64,
    initial_time: f64,
    running: bool,
    expired: bool,
    #[serde(skip)]
    on_expire: Option<ExpireHook>,
}

#[allow(dead_code)]
impl Timer {
    pub fn new(initial_time: f64) -> Self {
        let initial_time = initial_time.max(0.0);
        Timer {
            time: initial_time,
            initial_time,
            running: false,
            expired: false,
            on_expire: None,
        }
    }

    /// Arm the countdown. Calling it again re-arms without touching `time`.
    pub fn start(&mut self) {
        self.running = true;
        self.expired = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume counting down. An expired timer stays stopped.
    pub fn resume(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    /// Advance by `delta_ms`. Returns true only on the update that expired it.
    pub fn update(&mut self, delta_ms: f64) -> bool {
        if !self.running || self.expired {
            return false;
        }

        self.time -= delta_ms / 1000.0;
        if self.time > 0.0 {
            return false;
        }

        self.time = 0.0;
        self.expired = true;
        self.running = false;
        if let Some(hook) = self.on_expire.take() {
            hook();
        }
        true
    }

    /// Overwrite the remaining time (clamped at 0). A positive value clears
    /// the expired flag so the countdown can be armed again.
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds.max(0.0);
        if self.time > 0.0 {
            self.expired = false;
        }
    }

    pub fn on_expire(&mut self, hook: impl FnOnce() + 'static) {
        self.on_expire = Some(Box::new(hook));
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn initial_time(&self) -> f64 {
        self.initial_time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// `MM:SS`, whole seconds, minutes not wrapped at 60.
    pub fn formatted(&self) -> String {
        format_clock(self.time)
    }

    pub fn reset(&mut self) {
        self.time = self.initial_time;
        self.running = false;
        self.expired = false;
    }
}

pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

// The expiry hook is not part of the timer's value: clones start without
// one and equality ignores it.

impl Clone for Timer {
    fn clone(&self) -> Self {
        Timer {
            time: self.time,
            initial_time: self.initial_time,
            running: self.running,
            expired: self.expired,
            on_expire: None,
        }
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
            && self.initial_time == other.initial_time
            && self.running == other.running
            && self.expired == other.expired
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("time", &self.time)
            .field("initial_time", &self.initial_time)
            .field("running", &self.running)
            .field("expired", &self.expired)
            .field("has_hook", &self.on_expire.is_some())
            .finish()
    }
}
