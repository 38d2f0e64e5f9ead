use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::feed::types::EarthquakeRecord;

pub const DEFAULT_NEAR_PHRASE: &str = "Near the";
const LOCATION_SEPARATOR: &str = " of ";
const DATE_PATTERN: &str = "%b %d, %Y";
const TIME_PATTERN: &str = "%I:%M %p";

#[derive(Debug, Clone, Default)]
pub struct PresentationService;

impl PresentationService {
    pub fn name(&self) -> &'static str {
        "presentation"
    }

    pub fn status(&self) -> &'static str {
        "ready"
    }
}

/// Color bucket for a magnitude, picked from `floor(magnitude)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MagnitudeTier {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    TenPlus,
}

impl MagnitudeTier {
    /// Total over `f64`: negative floors and NaN land in `Zero`, anything at
    /// or above 10 lands in `TenPlus`.
    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude.is_nan() {
            return Self::Zero;
        }
        let floor = magnitude.floor();
        if floor >= 10.0 {
            return Self::TenPlus;
        }
        if floor < 1.0 {
            return Self::Zero;
        }
        match floor as u8 {
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            4 => Self::Four,
            5 => Self::Five,
            6 => Self::Six,
            7 => Self::Seven,
            8 => Self::Eight,
            _ => Self::Nine,
        }
    }

    /// Palette key for the presentation layer. Tiers zero and one share a color.
    pub fn color_token(&self) -> &'static str {
        match self {
            Self::Zero | Self::One => "magnitude1",
            Self::Two => "magnitude2",
            Self::Three => "magnitude3",
            Self::Four => "magnitude4",
            Self::Five => "magnitude5",
            Self::Six => "magnitude6",
            Self::Seven => "magnitude7",
            Self::Eight => "magnitude8",
            Self::Nine => "magnitude9",
            Self::TenPlus => "magnitude10plus",
        }
    }

    pub fn default_hex(&self) -> &'static str {
        match self {
            Self::Zero | Self::One => "#4A7BA7",
            Self::Two => "#04B4B3",
            Self::Three => "#10CAC9",
            Self::Four => "#F5A623",
            Self::Five => "#FF7D50",
            Self::Six => "#FC6644",
            Self::Seven => "#E75F40",
            Self::Eight => "#E13A20",
            Self::Nine => "#D93218",
            Self::TenPlus => "#C03823",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

/// Everything a list row shows for one record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EarthquakeListViewModel {
    pub magnitude_label: String,
    pub magnitude_tier: MagnitudeTier,
    pub location_offset: String,
    pub location_place: String,
    pub date_label: String,
    pub time_label: String,
    pub detail_url: String,
}

#[derive(Debug, Clone)]
pub struct PresentationMapper {
    near_phrase: String,
    zone: DisplayZone,
}

impl Default for PresentationMapper {
    fn default() -> Self {
        Self::new(DEFAULT_NEAR_PHRASE, DisplayZone::default())
    }
}

impl PresentationMapper {
    pub fn new(near_phrase: impl Into<String>, zone: DisplayZone) -> Self {
        Self {
            near_phrase: near_phrase.into(),
            zone,
        }
    }

    pub fn to_view_model(&self, record: &EarthquakeRecord) -> EarthquakeListViewModel {
        let (location_offset, location_place) = split_place(record.place(), &self.near_phrase);
        let (date_label, time_label) = format_timestamp(record.time_millis(), self.zone);

        EarthquakeListViewModel {
            magnitude_label: format_magnitude(record.magnitude()),
            magnitude_tier: MagnitudeTier::from_magnitude(record.magnitude()),
            location_offset,
            location_place,
            date_label,
            time_label,
            detail_url: record.detail_url().to_string(),
        }
    }

    pub fn to_view_models(&self, records: &[EarthquakeRecord]) -> Vec<EarthquakeListViewModel> {
        records
            .iter()
            .map(|record| self.to_view_model(record))
            .collect()
    }
}

/// Formats to one fractional digit, rounding half away from zero on the
/// shortest decimal form of the value, so `6.05` renders as `6.1`.
pub fn format_magnitude(magnitude: f64) -> String {
    if !magnitude.is_finite() {
        return magnitude.to_string();
    }

    let repr = magnitude.abs().to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let mut digits: Vec<u8> = whole.bytes().map(|byte| byte - b'0').collect();
    let mut fraction = fraction.bytes().map(|byte| byte - b'0');
    digits.push(fraction.next().unwrap_or(0));

    if fraction.next().unwrap_or(0) >= 5 {
        let mut index = digits.len();
        loop {
            if index == 0 {
                digits.insert(0, 1);
                break;
            }
            index -= 1;
            if digits[index] == 9 {
                digits[index] = 0;
            } else {
                digits[index] += 1;
                break;
            }
        }
    }

    let negative = magnitude.is_sign_negative() && digits.iter().any(|digit| *digit != 0);
    let tenths = digits.pop().unwrap_or(0);
    let whole: String = digits.iter().map(|digit| char::from(b'0' + digit)).collect();
    format!("{}{whole}.{tenths}", if negative { "-" } else { "" })
}

/// Splits `"50km N of Town"` into `("50km N of ", "Town")`. Places without
/// an offset get the near phrase instead.
pub fn split_place(place: &str, near_phrase: &str) -> (String, String) {
    match place.find(LOCATION_SEPARATOR) {
        Some(index) => {
            let split_at = index + LOCATION_SEPARATOR.len();
            (place[..split_at].to_string(), place[split_at..].to_string())
        }
        None => (near_phrase.to_string(), place.to_string()),
    }
}

/// Date and 12-hour clock labels. Out-of-range timestamps give empty labels.
pub fn format_timestamp(time_millis: i64, zone: DisplayZone) -> (String, String) {
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(time_millis) else {
        return (String::new(), String::new());
    };
    match zone {
        DisplayZone::Utc => render_labels(&utc),
        DisplayZone::Local => render_labels(&utc.with_timezone(&Local)),
    }
}

fn render_labels<Tz: TimeZone>(moment: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    (
        moment.format(DATE_PATTERN).to_string(),
        moment.format(TIME_PATTERN).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_mapper() -> PresentationMapper {
        PresentationMapper::new(DEFAULT_NEAR_PHRASE, DisplayZone::Utc)
    }

    #[test]
    fn maps_record_with_offset_place() {
        let record = EarthquakeRecord::new(6.5, "50km N of X", 0, "http://u");
        let row = utc_mapper().to_view_model(&record);

        assert_eq!(row.magnitude_label, "6.5");
        assert_eq!(row.magnitude_tier, MagnitudeTier::Six);
        assert_eq!(row.location_offset, "50km N of ");
        assert!(row.location_offset.ends_with(" of "));
        assert_eq!(row.location_place, "X");
        assert_eq!(row.date_label, "Jan 01, 1970");
        assert_eq!(row.time_label, "12:00 AM");
        assert_eq!(row.detail_url, "http://u");
    }

    #[test]
    fn place_without_offset_uses_near_phrase() {
        let record = EarthquakeRecord::new(4.0, "California", 0, "");
        let row = utc_mapper().to_view_model(&record);
        assert_eq!(row.location_offset, "Near the");
        assert_eq!(row.location_place, "California");

        let localized = PresentationMapper::new("Cerca de", DisplayZone::Utc).to_view_model(&record);
        assert_eq!(localized.location_offset, "Cerca de");
    }

    #[test]
    fn place_splits_at_first_separator_only() {
        assert_eq!(
            split_place("10km W of Gulf of Aqaba", DEFAULT_NEAR_PHRASE),
            ("10km W of ".to_string(), "Gulf of Aqaba".to_string())
        );
        assert_eq!(
            split_place("", DEFAULT_NEAR_PHRASE),
            ("Near the".to_string(), String::new())
        );
        assert_eq!(
            split_place("Southern Mid-Atlantic Ridge", DEFAULT_NEAR_PHRASE),
            ("Near the".to_string(), "Southern Mid-Atlantic Ridge".to_string())
        );
    }

    #[test]
    fn magnitude_label_rounds_half_away_from_zero() {
        let cases = [
            (6.04, "6.0"),
            (6.05, "6.1"),
            (6.25, "6.3"),
            (6.35, "6.4"),
            (6.049, "6.0"),
            (9.95, "10.0"),
            (99.96, "100.0"),
            (7.0, "7.0"),
            (0.0, "0.0"),
            (-0.04, "0.0"),
            (-1.25, "-1.3"),
            (123.456, "123.5"),
            (0.0000001, "0.0"),
        ];
        for (magnitude, expected) in cases {
            assert_eq!(format_magnitude(magnitude), expected, "magnitude {magnitude}");
        }
    }

    #[test]
    fn tier_is_total_and_monotonic() {
        assert_eq!(MagnitudeTier::from_magnitude(-3.2), MagnitudeTier::Zero);
        assert_eq!(MagnitudeTier::from_magnitude(-0.1), MagnitudeTier::Zero);
        assert_eq!(MagnitudeTier::from_magnitude(0.9), MagnitudeTier::Zero);
        assert_eq!(MagnitudeTier::from_magnitude(1.0), MagnitudeTier::One);
        assert_eq!(MagnitudeTier::from_magnitude(9.99), MagnitudeTier::Nine);
        assert_eq!(MagnitudeTier::from_magnitude(10.0), MagnitudeTier::TenPlus);
        assert_eq!(MagnitudeTier::from_magnitude(42.0), MagnitudeTier::TenPlus);
        assert_eq!(MagnitudeTier::from_magnitude(f64::NAN), MagnitudeTier::Zero);
        assert_eq!(MagnitudeTier::from_magnitude(f64::INFINITY), MagnitudeTier::TenPlus);

        let mut previous = MagnitudeTier::Zero;
        let mut magnitude = -2.0;
        while magnitude < 12.0 {
            let tier = MagnitudeTier::from_magnitude(magnitude);
            assert!(tier >= previous, "tier dropped at {magnitude}");
            previous = tier;
            magnitude += 0.25;
        }
    }

    #[test]
    fn tiers_zero_and_one_share_a_color() {
        assert_eq!(MagnitudeTier::Zero.color_token(), MagnitudeTier::One.color_token());
        assert_eq!(MagnitudeTier::TenPlus.color_token(), "magnitude10plus");
        assert_eq!(MagnitudeTier::Seven.default_hex(), "#E75F40");
    }

    #[test]
    fn timestamps_render_as_date_and_twelve_hour_clock() {
        assert_eq!(
            format_timestamp(1454124312220, DisplayZone::Utc),
            ("Jan 30, 2016".to_string(), "03:25 AM".to_string())
        );
        assert_eq!(
            format_timestamp(1700000000000, DisplayZone::Utc),
            ("Nov 14, 2023".to_string(), "10:13 PM".to_string())
        );
        assert_eq!(
            format_timestamp(i64::MAX, DisplayZone::Utc),
            (String::new(), String::new())
        );
    }

    #[test]
    fn extreme_magnitudes_still_map() {
        let mapper = utc_mapper();
        for magnitude in [-5.0, 0.0, 10.0, 15.3, 1e6] {
            let row = mapper.to_view_model(&EarthquakeRecord::new(magnitude, "", 0, ""));
            assert!(!row.magnitude_label.is_empty());
        }
    }
}
