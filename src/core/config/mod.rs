use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::core::feed::query::FeedQuery;
use crate::core::presentation::{DisplayZone, PresentationMapper, DEFAULT_NEAR_PHRASE};

pub const ENV_FILE: &str = ".env.local";

const FEED_URL_KEY: &str = "QUAKE_FEED_URL";
const MIN_MAGNITUDE_KEY: &str = "QUAKE_MIN_MAGNITUDE";
const LIMIT_KEY: &str = "QUAKE_LIMIT";
const DISPLAY_ZONE_KEY: &str = "QUAKE_DISPLAY_ZONE";
const NEAR_PHRASE_KEY: &str = "QUAKE_NEAR_PHRASE";
const REQUEST_TIMEOUT_KEY: &str = "QUAKE_REQUEST_TIMEOUT_SECS";
const OFFLINE_KEY: &str = "QUAKE_OFFLINE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("invalid feed url: {0}")]
    FeedUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuakeConfig {
    /// Used verbatim when set; otherwise the url is built from `query`.
    pub feed_url: Option<String>,
    pub query: FeedQuery,
    pub display_zone: DisplayZone,
    pub near_phrase: String,
    pub request_timeout: Option<Duration>,
    /// Reported to the pipeline as disconnected when set.
    pub offline: bool,
}

impl Default for QuakeConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            query: FeedQuery::default(),
            display_zone: DisplayZone::default(),
            near_phrase: DEFAULT_NEAR_PHRASE.to_string(),
            request_timeout: None,
            offline: false,
        }
    }
}

impl QuakeConfig {
    /// Values set in the process environment override those in `env_file`;
    /// a missing `env_file` is ignored.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        let file_values = read_env_file(env_file)?;
        Self::from_lookup(|key| env_over_file(key, |key| std::env::var(key).ok(), &file_values))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let mut config = Self::default();

        config.feed_url = value(FEED_URL_KEY);
        if let Some(raw) = value(MIN_MAGNITUDE_KEY) {
            config.query.min_magnitude = raw
                .parse::<f64>()
                .ok()
                .filter(|magnitude| magnitude.is_finite())
                .ok_or(ConfigError::InvalidValue {
                    key: MIN_MAGNITUDE_KEY,
                    value: raw,
                })?;
        }
        if let Some(raw) = value(LIMIT_KEY) {
            config.query.limit = raw
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: LIMIT_KEY,
                    value: raw,
                })?;
        }
        if let Some(raw) = value(DISPLAY_ZONE_KEY) {
            config.display_zone = match raw.to_ascii_lowercase().as_str() {
                "local" => DisplayZone::Local,
                "utc" => DisplayZone::Utc,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: DISPLAY_ZONE_KEY,
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = value(NEAR_PHRASE_KEY) {
            config.near_phrase = raw;
        }
        if let Some(raw) = value(REQUEST_TIMEOUT_KEY) {
            let seconds = raw.parse::<u64>().ok().filter(|seconds| *seconds > 0).ok_or(
                ConfigError::InvalidValue {
                    key: REQUEST_TIMEOUT_KEY,
                    value: raw,
                },
            )?;
            config.request_timeout = Some(Duration::from_secs(seconds));
        }
        if let Some(raw) = value(OFFLINE_KEY) {
            config.offline = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: OFFLINE_KEY,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn resolved_feed_url(&self) -> Result<String, ConfigError> {
        match &self.feed_url {
            Some(url) => Ok(url.clone()),
            None => Ok(self.query.to_url()?.to_string()),
        }
    }

    pub fn mapper(&self) -> PresentationMapper {
        PresentationMapper::new(self.near_phrase.clone(), self.display_zone)
    }
}

fn env_over_file<E>(key: &str, env: E, file_values: &HashMap<String, String>) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    env(key).or_else(|| file_values.get(key).cloned())
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        values.insert(key, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_recent_strong_earthquake_query() {
        let config = QuakeConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config, QuakeConfig::default());
        assert_eq!(
            config.resolved_feed_url().expect("url resolves"),
            "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&eventtype=earthquake&orderby=time&minmag=6&limit=15"
        );
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = QuakeConfig::from_lookup(lookup_from(&[
            (MIN_MAGNITUDE_KEY, "4.5"),
            (LIMIT_KEY, "30"),
            (DISPLAY_ZONE_KEY, "UTC"),
            (NEAR_PHRASE_KEY, "Cerca de"),
            (REQUEST_TIMEOUT_KEY, "20"),
        ]))
        .expect("overrides are valid");

        assert_eq!(config.query.min_magnitude, 4.5);
        assert_eq!(config.query.limit, 30);
        assert_eq!(config.display_zone, DisplayZone::Utc);
        assert_eq!(config.near_phrase, "Cerca de");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn offline_flag_is_parsed() {
        for (raw, expected) in [("1", true), ("TRUE", true), ("off", false), ("0", false)] {
            let config = QuakeConfig::from_lookup(lookup_from(&[(OFFLINE_KEY, raw)]))
                .expect("offline flag is valid");
            assert_eq!(config.offline, expected, "{raw}");
        }
        assert!(!QuakeConfig::default().offline);
    }

    #[test]
    fn explicit_feed_url_wins_over_query() {
        let config = QuakeConfig::from_lookup(lookup_from(&[
            (FEED_URL_KEY, "http://127.0.0.1:9/feed.json"),
            (LIMIT_KEY, "3"),
        ]))
        .expect("config is valid");
        assert_eq!(
            config.resolved_feed_url().expect("url resolves"),
            "http://127.0.0.1:9/feed.json"
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = QuakeConfig::from_lookup(lookup_from(&[(FEED_URL_KEY, "  "), (LIMIT_KEY, "")]))
            .expect("blank values are ignored");
        assert_eq!(config, QuakeConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            (MIN_MAGNITUDE_KEY, "strong"),
            (MIN_MAGNITUDE_KEY, "NaN"),
            (LIMIT_KEY, "0"),
            (LIMIT_KEY, "-1"),
            (DISPLAY_ZONE_KEY, "mars"),
            (REQUEST_TIMEOUT_KEY, "soon"),
            (OFFLINE_KEY, "maybe"),
        ] {
            let error = QuakeConfig::from_lookup(lookup_from(&[(key, value)]))
                .expect_err("invalid value should fail");
            assert!(
                matches!(error, ConfigError::InvalidValue { key: failed, .. } if failed == key),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn env_file_values_are_read() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "QUAKE_TEST_ONLY_UNUSED=1").expect("write");
        writeln!(file, "{NEAR_PHRASE_KEY}=\"Close to\"").expect("write");
        writeln!(file, "{DISPLAY_ZONE_KEY}=utc").expect("write");

        let values = read_env_file(file.path()).expect("env file parses");
        assert_eq!(values.get(NEAR_PHRASE_KEY).map(String::as_str), Some("Close to"));

        let config = QuakeConfig::from_lookup(|key| values.get(key).cloned()).expect("valid");
        assert_eq!(config.near_phrase, "Close to");
        assert_eq!(config.display_zone, DisplayZone::Utc);
    }

    #[test]
    fn process_env_overrides_env_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{NEAR_PHRASE_KEY}=\"Close to\"").expect("write");
        writeln!(file, "{DISPLAY_ZONE_KEY}=utc").expect("write");
        let values = read_env_file(file.path()).expect("env file parses");

        let env = lookup_from(&[(NEAR_PHRASE_KEY, "Around")]);
        let config = QuakeConfig::from_lookup(|key| env_over_file(key, &env, &values))
            .expect("valid");
        assert_eq!(config.near_phrase, "Around");
        assert_eq!(config.display_zone, DisplayZone::Utc);
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let values = read_env_file(&dir.path().join(ENV_FILE)).expect("missing file is fine");
        assert!(values.is_empty());
    }
}
