use crate::data::Record;
use anyhow::{Result, bail};
use chrono::{Datelike, Month};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Online mean and standard deviation (Welford's algorithm).
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Quantile `q` of an ascending slice, linearly interpolated between the
/// two closest ranks at position `q * (n - 1)`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n_vals = sorted.len();
    if n_vals == 0 {
        return f64::NAN;
    }

    let pos = q.clamp(0.0, 1.0) * (n_vals - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let weight = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile thresholds of a set of values.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn from_values(values: &[f64], lower_q: f64, upper_q: f64) -> Self {
        let sorted = sorted_copy(values);
        Self {
            lower: quantile(&sorted, lower_q),
            upper: quantile(&sorted, upper_q),
        }
    }

    /// Strict containment: values equal to a threshold are outside.
    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Mean value per calendar month, keyed by `(year, month)`.
pub fn monthly_averages(records: &[Record]) -> BTreeMap<(i32, u32), AccumulatorReport> {
    let mut acc_map: BTreeMap<(i32, u32), Accumulator> = BTreeMap::new();
    for rec in records {
        acc_map
            .entry((rec.date.year(), rec.date.month()))
            .or_default()
            .add(rec.value);
    }
    acc_map
        .into_iter()
        .map(|(key, acc)| (key, acc.report()))
        .collect()
}

/// Values grouped by an arbitrary key, in key order.
pub fn group_values<K, F>(records: &[Record], key: F) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    F: Fn(&Record) -> K,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for rec in records {
        groups.entry(key(rec)).or_default().push(rec.value);
    }
    groups
}

/// Full English name of a month numbered `1..=12`.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map_or("?", |month| month.name())
}

pub fn month_abbrev(month: u32) -> &'static str {
    let name = month_name(month);
    name.get(..3).unwrap_or(name)
}

/// Box statistics of one labelled group of records.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GroupStats {
    pub label: String,
    pub stats: BoxStats,
}

/// Box statistics per group, in key order.
pub fn group_box_stats<K, F, L>(records: &[Record], key: F, label: L) -> Result<Vec<GroupStats>>
where
    K: Ord,
    F: Fn(&Record) -> K,
    L: Fn(K) -> String,
{
    group_values(records, key)
        .into_iter()
        .map(|(key, vals)| -> Result<GroupStats> {
            Ok(GroupStats {
                label: label(key),
                stats: BoxStats::from_values(&vals)?,
            })
        })
        .collect()
}

/// Box-and-whisker statistics.
///
/// The whiskers reach the most extreme values within 1.5 IQR of the box;
/// anything beyond them is a flier.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub fliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            bail!("cannot compute box statistics of no values");
        }
        let sorted = sorted_copy(values);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);

        let iqr = q3 - q1;
        let lower_fence = q1 - 1.5 * iqr;
        let upper_fence = q3 + 1.5 * iqr;

        let in_fences = |val: &&f64| (lower_fence..=upper_fence).contains(*val);
        let lower_whisker = sorted.iter().find(in_fences).copied().unwrap_or(q1);
        let upper_whisker = sorted.iter().rev().find(in_fences).copied().unwrap_or(q3);

        let fliers = sorted
            .iter()
            .copied()
            .filter(|val| *val < lower_whisker || *val > upper_whisker)
            .collect();

        Ok(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            fliers,
        })
    }

    /// Smallest and largest value drawn for this box.
    pub fn extent(&self) -> (f64, f64) {
        let min = self.fliers.iter().copied().fold(self.lower_whisker, f64::min);
        let max = self.fliers.iter().copied().fold(self.upper_whisker, f64::max);
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(y: i32, m: u32, d: u32, value: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value,
        }
    }

    #[test]
    fn accumulator_mean_and_std_dev() {
        let mut acc = Accumulator::default();
        for val in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(val);
        }
        let report = acc.report();
        assert_eq!(report.n_vals, 8);
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn accumulator_with_few_values() {
        assert!(Accumulator::default().report().mean.is_nan());
        let mut acc = Accumulator::default();
        acc.add(3.0);
        assert_eq!(acc.report().mean, 3.0);
        assert!(acc.report().std_dev.is_nan());
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.5), 3.0);
        assert_eq!(quantile(&sorted, 1.0), 5.0);
        assert!((quantile(&sorted, 0.025) - 1.1).abs() < 1e-12);
        assert!((quantile(&sorted, 0.975) - 4.9).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_nan());
        assert_eq!(quantile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn bounds_are_strict() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let bounds = Bounds::from_values(&values, 0.025, 0.975);
        assert!((bounds.lower - 3.475).abs() < 1e-9);
        assert!((bounds.upper - 97.525).abs() < 1e-9);

        let exact = Bounds { lower: 3.0, upper: 5.0 };
        assert!(!exact.contains(3.0));
        assert!(exact.contains(4.0));
        assert!(!exact.contains(5.0));
    }

    #[test]
    fn bounds_ignore_input_order() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        let bounds = Bounds::from_values(&values, 0.25, 0.75);
        assert_eq!(bounds, Bounds { lower: 2.0, upper: 4.0 });
    }

    #[test]
    fn monthly_averages_group_by_year_and_month() {
        let records = [
            rec(2016, 5, 9, 10.0),
            rec(2016, 5, 10, 20.0),
            rec(2016, 6, 1, 5.0),
            rec(2017, 5, 1, 1.0),
        ];
        let avgs = monthly_averages(&records);
        let keys: Vec<_> = avgs.keys().copied().collect();
        assert_eq!(keys, vec![(2016, 5), (2016, 6), (2017, 5)]);
        assert_eq!(avgs[&(2016, 5)].mean, 15.0);
        assert_eq!(avgs[&(2016, 5)].n_vals, 2);
        assert_eq!(avgs[&(2016, 6)].mean, 5.0);
        assert_eq!(avgs[&(2017, 5)].mean, 1.0);
    }

    #[test]
    fn group_values_by_month() {
        let records = [rec(2016, 5, 9, 1.0), rec(2017, 5, 9, 2.0), rec(2016, 1, 1, 3.0)];
        let groups = group_values(&records, |rec| rec.date.month());
        assert_eq!(groups[&1], vec![3.0]);
        assert_eq!(groups[&5], vec![1.0, 2.0]);
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "?");
        assert_eq!(month_name(13), "?");
        assert_eq!(month_abbrev(9), "Sep");
    }

    #[test]
    fn group_box_stats_by_year() {
        let records = [
            rec(2017, 1, 1, 4.0),
            rec(2016, 5, 9, 1.0),
            rec(2016, 5, 10, 3.0),
        ];
        let groups = group_box_stats(&records, |rec| rec.date.year(), |year| year.to_string())
            .unwrap();
        let labels: Vec<_> = groups.iter().map(|grp| grp.label.as_str()).collect();
        assert_eq!(labels, vec!["2016", "2017"]);
        assert_eq!(groups[0].stats.median, 2.0);
        assert_eq!(groups[1].stats.median, 4.0);
        assert!(group_box_stats(&[], |rec| rec.date.year(), |year| year.to_string())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn box_stats_with_flier() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let stats = BoxStats::from_values(&values).unwrap();
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.q3, 7.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 8.0);
        assert_eq!(stats.fliers, vec![100.0]);
        assert_eq!(stats.extent(), (1.0, 100.0));
    }

    #[test]
    fn box_stats_of_constant_values() {
        let stats = BoxStats::from_values(&[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(stats.lower_whisker, 4.0);
        assert_eq!(stats.upper_whisker, 4.0);
        assert!(stats.fliers.is_empty());
    }

    #[test]
    fn box_stats_of_nothing() {
        assert!(BoxStats::from_values(&[]).is_err());
    }
}
