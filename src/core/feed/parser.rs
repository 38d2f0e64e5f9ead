use serde::Deserialize;
use serde_json::Value;

use super::types::{EarthquakeRecord, FeedErrorKind, FeedSummary};

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("feed document is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed document has no `features` collection")]
    MissingCollection,
    #[error("feature could not be decoded: {0}")]
    InvalidFeature(serde_json::Error),
    #[error("feature is missing `{0}`")]
    MissingField(&'static str),
}

impl FeedParseError {
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            Self::EmptyPayload | Self::Json(_) | Self::MissingCollection => {
                FeedErrorKind::MalformedDocument
            }
            Self::InvalidFeature(_) | Self::MissingField(_) => FeedErrorKind::MissingField,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawFeature {
    properties: Option<RawProperties>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawProperties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<Value>,
    url: Option<Value>,
}

/// Decodes a feed body into records, skipping elements that cannot be decoded.
///
/// A body that is not a JSON object with a `features` array yields no records.
pub fn parse_feed(raw: &str) -> Vec<EarthquakeRecord> {
    parse_feed_with_summary(raw).0
}

pub fn parse_feed_with_summary(raw: &str) -> (Vec<EarthquakeRecord>, FeedSummary) {
    let features = match decode_document(raw) {
        Ok(features) => features,
        Err(error) => {
            tracing::warn!(%error, "discarding malformed feed document");
            return (Vec::new(), FeedSummary::default());
        }
    };

    let mut summary = FeedSummary::default();
    let mut records = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        match decode_record(feature) {
            Ok(record) => {
                summary.decoded += 1;
                records.push(record);
            }
            Err(error) => {
                summary.skipped += 1;
                tracing::debug!(index, %error, "skipping feature");
            }
        }
    }

    (records, summary)
}

/// Returns the elements of the root `features` collection, in document order.
pub fn decode_document(raw: &str) -> Result<Vec<Value>, FeedParseError> {
    if raw.trim().is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    let root: Value = serde_json::from_str(raw)?;
    match root {
        Value::Object(mut map) => match map.remove("features") {
            Some(Value::Array(features)) => Ok(features),
            _ => Err(FeedParseError::MissingCollection),
        },
        _ => Err(FeedParseError::MissingCollection),
    }
}

/// Decodes one feature. Magnitude, place and time are required; the detail
/// url defaults to empty.
pub fn decode_record(feature: &Value) -> Result<EarthquakeRecord, FeedParseError> {
    let feature = RawFeature::deserialize(feature).map_err(FeedParseError::InvalidFeature)?;
    let properties = feature
        .properties
        .ok_or(FeedParseError::MissingField("properties"))?;
    let magnitude = properties.mag.ok_or(FeedParseError::MissingField("mag"))?;
    let place = properties
        .place
        .ok_or(FeedParseError::MissingField("place"))?;
    let time_millis = properties
        .time
        .as_ref()
        .and_then(epoch_millis)
        .ok_or(FeedParseError::MissingField("time"))?;
    let detail_url = properties
        .url
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(EarthquakeRecord::new(magnitude, place, time_millis, detail_url))
}

/// Any JSON number counts; fractional milliseconds are truncated.
fn epoch_millis(time: &Value) -> Option<i64> {
    time.as_i64().or_else(|| {
        time.as_f64()
            .filter(|millis| millis.is_finite())
            .map(|millis| millis.trunc() as i64)
    })
}
