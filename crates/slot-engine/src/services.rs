//! Duration lookup: selected services to a requested duration in minutes.
//!
//! The booking API stores service durations in hours with one decimal
//! (`1.5` = 90 minutes) and may send them as JSON numbers or as decimal
//! strings. Conversion to minutes happens here, once.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::listing::decode_listing;

/// A bookable service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Duration in hours.
    #[serde(deserialize_with = "deserialize_hours")]
    pub duration: f64,
}

impl Service {
    pub fn new(id: u32, name: impl Into<String>, duration_hours: f64) -> Self {
        Self {
            id,
            name: name.into(),
            duration: duration_hours,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        hours_to_minutes(self.duration)
    }
}

/// Duration lookup contract.
pub trait DurationSource {
    /// Summed duration of the selected services, in minutes.
    fn total_minutes(&self, selected: &[u32]) -> Result<i64>;
}

/// In-memory service list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// Decode a bare JSON array or a `{ "results": [...] }` envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        decode_listing(json, "services").map(Self::new)
    }

    pub fn get(&self, id: u32) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }
}

impl DurationSource for ServiceCatalog {
    /// # Errors
    ///
    /// Returns [`SlotError::UnknownService`] for an id not in the catalog.
    fn total_minutes(&self, selected: &[u32]) -> Result<i64> {
        let hours = selected.iter().try_fold(0.0_f64, |sum, id| {
            self.get(*id)
                .map(|s| sum + s.duration)
                .ok_or(SlotError::UnknownService(*id))
        })?;
        let minutes = hours_to_minutes(hours);
        debug!(services = ?selected, hours, minutes, "summed service durations");
        Ok(minutes)
    }
}

/// Convert fractional hours to whole minutes, rounding to the nearest minute.
pub fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

fn deserialize_hours<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hours {
        Number(f64),
        Text(String),
    }

    match Hours::deserialize(deserializer)? {
        Hours::Number(h) => Ok(h),
        Hours::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid duration '{s}'"))),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
