use serde::{Deserialize, Serialize};
use url::Url;

pub const USGS_QUERY_ENDPOINT: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderBy {
    Time,
    TimeAsc,
    Magnitude,
    MagnitudeAsc,
}

impl OrderBy {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::TimeAsc => "time-asc",
            Self::Magnitude => "magnitude",
            Self::MagnitudeAsc => "magnitude-asc",
        }
    }
}

/// Parameters of a USGS event query. The fetcher itself only ever sees the
/// finished URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedQuery {
    pub endpoint: String,
    pub event_type: String,
    pub order_by: OrderBy,
    pub min_magnitude: f64,
    pub limit: u32,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            endpoint: USGS_QUERY_ENDPOINT.to_string(),
            event_type: "earthquake".to_string(),
            order_by: OrderBy::Time,
            min_magnitude: 6.0,
            limit: 15,
        }
    }
}

impl FeedQuery {
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        let min_magnitude = self.min_magnitude.to_string();
        let limit = self.limit.to_string();
        Url::parse_with_params(
            &self.endpoint,
            [
                ("format", "geojson"),
                ("eventtype", self.event_type.as_str()),
                ("orderby", self.order_by.as_param()),
                ("minmag", min_magnitude.as_str()),
                ("limit", limit.as_str()),
            ],
        )
    }
}
