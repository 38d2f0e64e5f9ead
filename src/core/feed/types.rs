use serde::{Deserialize, Serialize};

/// Failure classes shared by the fetch and parse stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedErrorKind {
    Network,
    MalformedDocument,
    MissingField,
}

/// One decoded earthquake event.
///
/// Only built by the parser once magnitude, place, time and url have all been
/// extracted; there is no way to change a record after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarthquakeRecord {
    magnitude: f64,
    place: String,
    time_millis: i64,
    detail_url: String,
}

impl EarthquakeRecord {
    pub fn new(
        magnitude: f64,
        place: impl Into<String>,
        time_millis: i64,
        detail_url: impl Into<String>,
    ) -> Self {
        Self {
            magnitude,
            place: place.into(),
            time_millis,
            detail_url: detail_url.into(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    /// Epoch milliseconds, UTC.
    pub fn time_millis(&self) -> i64 {
        self.time_millis
    }

    pub fn detail_url(&self) -> &str {
        &self.detail_url
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct FeedSummary {
    pub decoded: usize,
    pub skipped: usize,
}
