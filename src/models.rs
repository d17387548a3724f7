use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

/// Separator Johns Hopkins used between country and province in region keys.
pub const KEY_SEPARATOR: char = ':';

/// Counts for one region on one reporting date.
///
/// Cumulative fields carry the value as reported; `d_*` fields carry the
/// day-over-day change against the previous date column of the source table.
/// A metric never reported for this region/date stays at 0.0, which is
/// indistinguishable from a reported zero. Fields are f64 so that a
/// non-numeric source cell can carry a NaN sentinel instead of aborting the
/// run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMetrics {
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    pub d_confirmed: f64,
    pub d_deaths: f64,
    pub d_recovered: f64,
}

/// One of the three tracked metrics; tags which table a merge pass is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
        }
    }

    pub fn set(self, day: &mut DayMetrics, value: f64, delta: f64) {
        match self {
            Metric::Confirmed => {
                day.confirmed = value;
                day.d_confirmed = delta;
            }
            Metric::Deaths => {
                day.deaths = value;
                day.d_deaths = delta;
            }
            Metric::Recovered => {
                day.recovered = value;
                day.d_recovered = delta;
            }
        }
    }

    pub fn cumulative(self, day: &DayMetrics) -> f64 {
        match self {
            Metric::Confirmed => day.confirmed,
            Metric::Deaths => day.deaths,
            Metric::Recovered => day.recovered,
        }
    }

    pub fn delta(self, day: &DayMetrics) -> f64 {
        match self {
            Metric::Confirmed => day.d_confirmed,
            Metric::Deaths => day.d_deaths,
            Metric::Recovered => day.d_recovered,
        }
    }
}

/// Identity fields extracted from one source row, before any series data.
#[derive(Debug, Clone)]
pub struct RegionIdentity {
    pub province_state: String,
    pub country_region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegionIdentity {
    pub fn key(&self) -> String {
        region_key(&self.country_region, &self.province_state)
    }
}

/// Normalized region key: `country:province`, both trimmed, province empty
/// when the reporting unit has none. Both source header conventions
/// (`Country/Region` and `Country_Region`) resolve to the same key.
pub fn region_key(country_region: &str, province_state: &str) -> String {
    format!(
        "{}{}{}",
        country_region.trim(),
        KEY_SEPARATOR,
        province_state.trim()
    )
}

/// A geographic reporting unit and its day-indexed series.
///
/// `dates` preserves the order date labels were first seen in, so "previous
/// date" stays a positional notion rather than calendar arithmetic; `series`
/// holds the values per label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub key: String,
    pub name: String,
    pub province_state: String,
    pub country_region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dates: Vec<String>,
    pub series: HashMap<String, DayMetrics>,
}

impl Region {
    /// The single factory for regions, whether seeded from the confirmed
    /// table or synthesized later from a metric table row.
    pub fn from_identity(identity: &RegionIdentity) -> Self {
        let province = identity.province_state.trim().to_string();
        let country = identity.country_region.trim().to_string();
        let name = if !province.is_empty() && province != country {
            format!("{province}, {country}")
        } else {
            country.clone()
        };

        Region {
            key: identity.key(),
            name,
            province_state: province,
            country_region: country,
            latitude: identity.latitude,
            longitude: identity.longitude,
            dates: Vec::new(),
            series: HashMap::new(),
        }
    }

    /// The synthetic rollup region. No coordinates of its own.
    pub fn worldwide() -> Self {
        Region {
            key: format!("Worldwide{KEY_SEPARATOR}"),
            name: "Worldwide".to_string(),
            province_state: String::new(),
            country_region: "Worldwide".to_string(),
            latitude: f64::NAN,
            longitude: f64::NAN,
            dates: Vec::new(),
            series: HashMap::new(),
        }
    }

    /// Entry for `date`, created zeroed (and appended to the date axis) if
    /// this region has not seen the label yet.
    pub fn ensure_day(&mut self, date: &str) -> &mut DayMetrics {
        if !self.series.contains_key(date) {
            self.dates.push(date.to_string());
            self.series.insert(date.to_string(), DayMetrics::default());
        }
        self.series.get_mut(date).expect("entry just ensured")
    }

    /// Latest reporting date by calendar order, not axis position: a later
    /// metric table may have appended an out-of-order label to the axis.
    pub fn latest_date(&self) -> Option<&str> {
        self.dates
            .iter()
            .max_by_key(|label| date_sort_key(label))
            .map(String::as_str)
    }
}

/// One immutable run result. Built fresh per run, never mutated afterwards,
/// superseded wholesale by the next run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub regions: HashMap<String, Region>,
    pub worldwide: Region,
    pub report_time: NaiveDate,
}

/// Source date labels are `M/D/YY` without zero padding.
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(label.trim(), "%m/%d/%y").ok()
}

/// Chronological ordering for date labels; unparseable labels sort last,
/// ties broken by the label itself so sorting is total and deterministic.
pub fn date_sort_key(label: &str) -> (NaiveDate, String) {
    (
        parse_date_label(label).unwrap_or(NaiveDate::MAX),
        label.to_string(),
    )
}

/// The as-of day of a report: one UTC day before the run.
pub fn report_day() -> NaiveDate {
    Utc::now().date_naive() - chrono::Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(country: &str, province: &str) -> RegionIdentity {
        RegionIdentity {
            province_state: province.to_string(),
            country_region: country.to_string(),
            latitude: 1.0,
            longitude: 2.0,
        }
    }

    #[test]
    fn key_trims_both_parts() {
        assert_eq!(region_key(" Canada ", " Ontario "), "Canada:Ontario");
        assert_eq!(region_key("US", ""), "US:");
    }

    #[test]
    fn display_name_includes_distinct_province() {
        let region = Region::from_identity(&identity("Canada", "Ontario"));
        assert_eq!(region.name, "Ontario, Canada");
    }

    #[test]
    fn display_name_drops_empty_or_duplicate_province() {
        assert_eq!(Region::from_identity(&identity("US", "")).name, "US");
        assert_eq!(
            Region::from_identity(&identity("Denmark", "Denmark")).name,
            "Denmark"
        );
    }

    #[test]
    fn ensure_day_appends_axis_once() {
        let mut region = Region::from_identity(&identity("US", ""));
        region.ensure_day("1/22/20").confirmed = 3.0;
        region.ensure_day("1/22/20").deaths = 1.0;
        assert_eq!(region.dates, vec!["1/22/20"]);
        let day = region.series["1/22/20"];
        assert_eq!(day.confirmed, 3.0);
        assert_eq!(day.deaths, 1.0);
    }

    #[test]
    fn latest_date_is_calendar_latest_not_last_seen() {
        let mut region = Region::from_identity(&identity("US", ""));
        region.ensure_day("2/1/20");
        region.ensure_day("1/22/20");
        assert_eq!(region.latest_date(), Some("2/1/20"));
    }

    #[test]
    fn date_labels_parse_without_padding() {
        let date = parse_date_label("1/22/20").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 22).unwrap());
        assert!(parse_date_label("not-a-date").is_none());
    }

    #[test]
    fn worldwide_region_has_fixed_key_and_no_coordinates() {
        let world = Region::worldwide();
        assert_eq!(world.key, "Worldwide:");
        assert!(world.latitude.is_nan());
        assert!(world.longitude.is_nan());
    }
}
