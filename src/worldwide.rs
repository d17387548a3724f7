use std::collections::HashMap;

use crate::models::{date_sort_key, DayMetrics, Region};

/// Fold every region's cumulative series into the synthetic Worldwide
/// region, then derive Worldwide deltas from its own aggregated totals.
///
/// Deltas are recomputed rather than summed: per-region deltas only add up
/// to the worldwide delta when every region reports the exact same date set,
/// and coverage is ragged in practice. Regions fold in sorted-key order and
/// the date axis sorts chronologically with a label tie-break, so re-running
/// the pass over an unchanged map reproduces the same region byte for byte.
pub fn aggregate_worldwide(regions: &HashMap<String, Region>) -> Region {
    let mut world = Region::worldwide();

    let mut keys: Vec<&String> = regions.keys().collect();
    keys.sort();

    for key in keys {
        let region = &regions[key];
        for date in &region.dates {
            let day = &region.series[date];
            match world.series.get_mut(date) {
                // First sight of this date: copy the entry by value so later
                // additions never alias the source region.
                None => {
                    world.dates.push(date.clone());
                    world.series.insert(date.clone(), *day);
                }
                Some(total) => {
                    total.confirmed += day.confirmed;
                    total.deaths += day.deaths;
                    total.recovered += day.recovered;
                }
            }
        }
    }

    world.dates.sort_by_key(|label| date_sort_key(label));
    recompute_deltas(&mut world);
    world
}

/// Rewrite every delta field from the cumulative series, first date zeroed.
fn recompute_deltas(region: &mut Region) {
    let mut previous = DayMetrics::default();
    for (idx, date) in region.dates.iter().enumerate() {
        if let Some(day) = region.series.get_mut(date) {
            if idx == 0 {
                day.d_confirmed = 0.0;
                day.d_deaths = 0.0;
                day.d_recovered = 0.0;
            } else {
                day.d_confirmed = day.confirmed - previous.confirmed;
                day.d_deaths = day.deaths - previous.deaths;
                day.d_recovered = day.recovered - previous.recovered;
            }
            previous = *day;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionIdentity;

    fn region(country: &str, days: &[(&str, f64, f64, f64)]) -> Region {
        let mut region = Region::from_identity(&RegionIdentity {
            province_state: String::new(),
            country_region: country.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        });
        for (idx, (date, confirmed, deaths, recovered)) in days.iter().enumerate() {
            let day = region.ensure_day(date);
            day.confirmed = *confirmed;
            day.deaths = *deaths;
            day.recovered = *recovered;
            if idx > 0 {
                let prev = region.series[days[idx - 1].0];
                let day = region.ensure_day(date);
                day.d_confirmed = day.confirmed - prev.confirmed;
                day.d_deaths = day.deaths - prev.deaths;
                day.d_recovered = day.recovered - prev.recovered;
            }
        }
        region
    }

    fn map(regions: Vec<Region>) -> HashMap<String, Region> {
        regions
            .into_iter()
            .map(|region| (region.key.clone(), region))
            .collect()
    }

    #[test]
    fn two_region_totals_sum_per_date() {
        let regions = map(vec![
            region("US", &[("1/22/20", 10.0, 0.0, 0.0)]),
            region("Italy", &[("1/22/20", 5.0, 0.0, 0.0)]),
        ]);
        let world = aggregate_worldwide(&regions);

        let day = world.series["1/22/20"];
        assert_eq!(day.confirmed, 15.0);
        assert_eq!(day.d_confirmed, 0.0);
    }

    #[test]
    fn sum_invariant_holds_with_ragged_date_coverage() {
        let regions = map(vec![
            region(
                "US",
                &[("1/22/20", 10.0, 1.0, 0.0), ("1/23/20", 15.0, 2.0, 1.0)],
            ),
            // Italy starts reporting a day late.
            region("Italy", &[("1/23/20", 8.0, 1.0, 2.0)]),
        ]);
        let world = aggregate_worldwide(&regions);

        assert_eq!(world.dates, vec!["1/22/20", "1/23/20"]);
        assert_eq!(world.series["1/22/20"].confirmed, 10.0);
        assert_eq!(world.series["1/23/20"].confirmed, 23.0);
        assert_eq!(world.series["1/23/20"].deaths, 3.0);
        assert_eq!(world.series["1/23/20"].recovered, 3.0);
    }

    #[test]
    fn deltas_derive_from_aggregated_totals_not_summed_deltas() {
        // Italy's own first-date delta is 0 by convention, so summing
        // per-region deltas at 1/23/20 would give 5; the worldwide series
        // moved by 13.
        let regions = map(vec![
            region(
                "US",
                &[("1/22/20", 10.0, 0.0, 0.0), ("1/23/20", 15.0, 0.0, 0.0)],
            ),
            region("Italy", &[("1/23/20", 8.0, 0.0, 0.0)]),
        ]);
        let world = aggregate_worldwide(&regions);

        assert_eq!(world.series["1/22/20"].d_confirmed, 0.0);
        assert_eq!(world.series["1/23/20"].d_confirmed, 13.0);
    }

    #[test]
    fn date_axis_is_chronological_regardless_of_fold_order() {
        let regions = map(vec![
            region("Zimbabwe", &[("2/1/20", 1.0, 0.0, 0.0)]),
            region(
                "Albania",
                &[("1/31/20", 2.0, 0.0, 0.0), ("2/2/20", 3.0, 0.0, 0.0)],
            ),
        ]);
        let world = aggregate_worldwide(&regions);
        assert_eq!(world.dates, vec!["1/31/20", "2/1/20", "2/2/20"]);
    }

    #[test]
    fn aggregation_does_not_alias_source_regions() {
        let mut regions = map(vec![region("US", &[("1/22/20", 10.0, 1.0, 0.0)])]);
        let world = aggregate_worldwide(&regions);

        regions
            .get_mut("US:")
            .unwrap()
            .ensure_day("1/22/20")
            .confirmed = 99.0;
        assert_eq!(world.series["1/22/20"].confirmed, 10.0);
    }

    #[test]
    fn reaggregation_is_idempotent() {
        let regions = map(vec![
            region(
                "US",
                &[("1/22/20", 10.0, 1.0, 0.0), ("1/23/20", 15.0, 2.0, 1.0)],
            ),
            region("Italy", &[("1/23/20", 8.0, 1.0, 2.0)]),
        ]);

        let first = aggregate_worldwide(&regions);
        let second = aggregate_worldwide(&regions);
        assert_eq!(first.dates, second.dates);
        assert_eq!(first.series, second.series);
        assert_eq!(first.key, second.key);
    }
}
