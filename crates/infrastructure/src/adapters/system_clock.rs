//! Wall-clock adapter for the clock port

use application::ports::ClockPort;
use chrono::{DateTime, Utc};

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_tracks_system_time() {
        let before = Utc::now();
        let now = SystemClock::new().now();
        let after = Utc::now();
        assert!(before <= now && now <= after);
    }
}
