//! Scheduler configuration.
//!
//! Loaded from JSON; every field is optional and defaults to an 08:00-20:00
//! day in UTC with 30-minute steps:
//!
//! ```json
//! { "open": "09:00", "close": "18:00", "granularity_minutes": 15, "timezone": "Europe/Moscow" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::schedule::{BusinessHours, Schedule, DEFAULT_GRANULARITY_MINUTES};
use crate::temporal::parse_timezone;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    pub open: String,
    pub close: String,
    pub granularity_minutes: i64,
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            open: "08:00".to_string(),
            close: "20:00".to_string(),
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            timezone: "UTC".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlotError::Config(e.to_string()))
    }

    /// Read and decode a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SlotError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Validate into a [`Schedule`].
    pub fn schedule(&self) -> Result<Schedule> {
        let hours = BusinessHours::parse(&self.open, &self.close)?;
        let tz = parse_timezone(&self.timezone)?;
        Schedule::new(hours, self.granularity_minutes, tz)
    }
}
