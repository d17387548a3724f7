use std::collections::HashMap;

use anyhow::Context;

use crate::models::{report_day, Metric, Region, Snapshot};
use crate::source::TableSet;
use crate::table::RawTable;
use crate::worldwide;

/// Seed the canonical region set from the confirmed table. One row becomes
/// one region with an empty series; on duplicate keys the last row wins.
pub fn build_regions(confirmed: &RawTable) -> HashMap<String, Region> {
    let mut regions = HashMap::new();

    for row in confirmed.rows() {
        match confirmed.identity(row) {
            Some(identity) => {
                let region = Region::from_identity(&identity);
                regions.insert(region.key.clone(), region);
            }
            None => log::warn!("skipping confirmed row without a country/region"),
        }
    }

    log::debug!("seeded {} regions from confirmed table", regions.len());
    regions
}

/// Merge one metric table into the shared region map.
///
/// Rows keyed to a region the confirmed table never mentioned are synthesized
/// on the fly; that is expected with ragged reporting (e.g. Canada recoveries
/// arrive at country granularity while cases arrive per province). Rows whose
/// key cannot be computed are skipped. Deltas are positional: value at a date
/// column minus the value at the column before it, zero at the first column.
pub fn merge_metric(regions: &mut HashMap<String, Region>, table: &RawTable, metric: Metric) {
    let mut skipped = 0usize;

    for row in table.rows() {
        let Some(identity) = table.identity(row) else {
            skipped += 1;
            continue;
        };
        let key = identity.key();
        let region = regions.entry(key.clone()).or_insert_with(|| {
            log::debug!("region {key} first seen in {} table", metric.name());
            Region::from_identity(&identity)
        });

        let mut previous = 0.0;
        for (date_idx, date) in table.dates.iter().enumerate() {
            let value = table.count(row, date_idx);
            let delta = if date_idx == 0 { 0.0 } else { value - previous };
            metric.set(region.ensure_day(date), value, delta);
            previous = value;
        }
    }

    if skipped > 0 {
        log::warn!(
            "skipped {skipped} malformed rows while merging {} table",
            metric.name()
        );
    }
}

/// Run the whole pipeline over one set of raw tables: seed regions from
/// confirmed, merge all three metrics, aggregate Worldwide. Returns the one
/// immutable snapshot for this run.
pub fn build_snapshot(tables: &TableSet) -> anyhow::Result<Snapshot> {
    let confirmed = RawTable::parse(&tables.confirmed).context("parsing confirmed table")?;
    let deaths = RawTable::parse(&tables.deaths).context("parsing deaths table")?;
    let recovered = RawTable::parse(&tables.recovered).context("parsing recovered table")?;

    let mut regions = build_regions(&confirmed);
    merge_metric(&mut regions, &confirmed, Metric::Confirmed);
    merge_metric(&mut regions, &deaths, Metric::Deaths);
    merge_metric(&mut regions, &recovered, Metric::Recovered);

    let worldwide = worldwide::aggregate_worldwide(&regions);
    log::debug!(
        "snapshot ready: {} regions, {} worldwide dates",
        regions.len(),
        worldwide.dates.len()
    );

    Ok(Snapshot {
        regions,
        worldwide,
        report_time: report_day(),
    })
}
