//! Wall-clock port
//!
//! Draft timestamps and age calculations read the time through this port so
//! tests can pin it.

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

/// Source of the current UTC time
#[cfg_attr(test, automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
