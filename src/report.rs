use std::fmt::Write;

use crate::models::{Region, Snapshot, KEY_SEPARATOR};

/// Latest totals for one country, summed across all of its reporting
/// sub-regions.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySummary {
    pub country: String,
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    pub region_count: usize,
}

impl CountrySummary {
    pub fn active(&self) -> f64 {
        self.confirmed - self.deaths - self.recovered
    }
}

/// Sum a country's sub-regions at each region's own latest reporting date.
/// Matching is by `country:` key prefix, so a country name occurring inside
/// another region's province never double-counts.
pub fn summarize_country(snapshot: &Snapshot, country: &str) -> CountrySummary {
    let prefix = format!("{}{}", country.trim(), KEY_SEPARATOR);
    let mut summary = CountrySummary {
        country: country.trim().to_string(),
        confirmed: 0.0,
        deaths: 0.0,
        recovered: 0.0,
        region_count: 0,
    };

    for (key, region) in &snapshot.regions {
        if !key.starts_with(&prefix) {
            continue;
        }
        let Some(latest) = region.latest_date() else {
            continue;
        };
        let day = &region.series[latest];
        summary.confirmed += day.confirmed;
        summary.deaths += day.deaths;
        summary.recovered += day.recovered;
        summary.region_count += 1;
    }

    summary
}

pub fn build_report(snapshot: &Snapshot, countries: &[String]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# COVID-19 Daily Snapshot");
    let _ = writeln!(output, "As of {} ({} regions)", snapshot.report_time, snapshot.regions.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Worldwide");

    match worldwide_rows(&snapshot.worldwide) {
        Some(rows) => output.push_str(&rows),
        None => {
            let _ = writeln!(output, "No dates in the worldwide series.");
        }
    }

    if !countries.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Countries");
        for country in countries {
            let summary = summarize_country(snapshot, country);
            if summary.region_count == 0 {
                let _ = writeln!(output, "- {}: no data", summary.country);
            } else {
                let _ = writeln!(
                    output,
                    "- {}: {:.0} confirmed, {:.0} deaths, {:.0} recovered, {:.0} active ({} regions)",
                    summary.country,
                    summary.confirmed,
                    summary.deaths,
                    summary.recovered,
                    summary.active(),
                    summary.region_count
                );
            }
        }
    }

    output
}

fn worldwide_rows(world: &Region) -> Option<String> {
    let latest = world.latest_date()?;
    let day = &world.series[latest];
    let active = day.confirmed - day.deaths - day.recovered;

    let mut rows = String::new();
    let _ = writeln!(
        rows,
        "- {latest}: {:.0} confirmed, {:.0} deaths, {:.0} recovered, {active:.0} active",
        day.confirmed, day.deaths, day.recovered
    );
    let _ = writeln!(
        rows,
        "- change since previous day: {:+.0} confirmed, {:+.0} deaths, {:+.0} recovered",
        day.d_confirmed, day.d_deaths, day.d_recovered
    );
    Some(rows)
}
