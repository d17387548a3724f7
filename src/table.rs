use anyhow::{bail, Context};
use csv::StringRecord;

use crate::models::RegionIdentity;

/// Date columns start after the four identity/metadata columns
/// (province, country, latitude, longitude).
pub const DATE_COLUMN_OFFSET: usize = 4;

/// One parsed source table: resolved identity columns plus the ordered date
/// axis taken from the header row. Rows are kept positional because the two
/// header conventions (slash vs underscore) name the same columns
/// differently.
#[derive(Debug)]
pub struct RawTable {
    pub dates: Vec<String>,
    rows: Vec<StringRecord>,
    province_idx: usize,
    country_idx: usize,
    lat_idx: Option<usize>,
    long_idx: Option<usize>,
}

impl RawTable {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().context("reading header row")?.clone();
        let province_idx = find_column(&headers, &["Province/State", "Province_State"])
            .context("no province/state column in header")?;
        let country_idx = find_column(&headers, &["Country/Region", "Country_Region"])
            .context("no country/region column in header")?;
        let lat_idx = find_column(&headers, &["Lat", "Latitude"]);
        let long_idx = find_column(&headers, &["Long", "Long_", "Longitude"]);

        if headers.len() <= DATE_COLUMN_OFFSET {
            bail!("table has no date columns");
        }
        let dates: Vec<String> = headers
            .iter()
            .skip(DATE_COLUMN_OFFSET)
            .map(|label| label.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record.context("reading data row")?);
        }

        Ok(RawTable {
            dates,
            rows,
            province_idx,
            country_idx,
            lat_idx,
            long_idx,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    /// Identity fields for a row, or `None` when the country cell is empty
    /// after trimming (a malformed row that cannot yield a region key).
    pub fn identity(&self, row: &StringRecord) -> Option<RegionIdentity> {
        let country_region = row.get(self.country_idx).unwrap_or("").trim();
        if country_region.is_empty() {
            return None;
        }
        let province_state = row.get(self.province_idx).unwrap_or("").trim();

        Some(RegionIdentity {
            province_state: province_state.to_string(),
            country_region: country_region.to_string(),
            latitude: parse_coordinate(self.lat_idx.and_then(|i| row.get(i))),
            longitude: parse_coordinate(self.long_idx.and_then(|i| row.get(i))),
        })
    }

    /// Cumulative cell for the `date_idx`-th date column of a row.
    pub fn count(&self, row: &StringRecord, date_idx: usize) -> f64 {
        parse_count(row.get(DATE_COLUMN_OFFSET + date_idx))
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.iter().any(|name| header.trim() == *name))
}

/// Metric cells: absent or empty means the value was never reported and
/// stays zero; a present but non-numeric cell becomes NaN rather than
/// aborting the run.
fn parse_count(cell: Option<&str>) -> f64 {
    match cell.map(str::trim) {
        None | Some("") => 0.0,
        Some(text) => text.parse().unwrap_or(f64::NAN),
    }
}

/// Coordinates: absent, empty, or non-numeric all collapse to NaN.
fn parse_coordinate(cell: Option<&str>) -> f64 {
    match cell.map(str::trim) {
        None | Some("") => f64::NAN,
        Some(text) => text.parse().unwrap_or(f64::NAN),
    }
}
