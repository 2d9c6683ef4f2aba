use crate::config::FilterConfig;
use crate::data::Dataset;
use crate::stats::Bounds;
use anyhow::{Result, bail};

/// Dataset with outliers removed.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub bounds: Bounds,
    pub n_raw: usize,
    pub n_removed: usize,
}

/// Percentile outlier filter.
pub struct Cleaner {
    cfg: FilterConfig,
}

impl Cleaner {
    pub fn new(cfg: FilterConfig) -> Self {
        Self { cfg }
    }

    /// Keep only the rows whose value lies strictly between the configured
    /// quantiles of the full dataset.
    pub fn clean(&self, raw: &Dataset) -> Result<Cleaned> {
        if raw.is_empty() {
            bail!("dataset is empty");
        }

        let bounds = Bounds::from_values(
            &raw.values(),
            self.cfg.lower_quantile,
            self.cfg.upper_quantile,
        );
        log::debug!("{bounds:?}");

        let dataset = raw.filter(|rec| bounds.contains(rec.value));
        if dataset.is_empty() {
            bail!("no rows left after removing values outside {bounds:?}");
        }

        let n_raw = raw.len();
        let n_removed = n_raw - dataset.len();
        log::info!("after cleaning, rows: {} (removed {n_removed})", dataset.len());

        Ok(Cleaned {
            dataset,
            bounds,
            n_raw,
            n_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use chrono::{Days, NaiveDate};

    fn dataset(values: &[f64]) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2016, 5, 9).unwrap();
        let records = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Record {
                date: start + Days::new(i as u64),
                value,
            })
            .collect();
        Dataset::new(records)
    }

    #[test]
    fn removes_both_tails() {
        let values: Vec<f64> = (1..=200).map(f64::from).collect();
        let cleaned = Cleaner::new(FilterConfig::default())
            .clean(&dataset(&values))
            .unwrap();

        // 2.5% of 200 rows at each end, thresholds fall between ranks
        assert_eq!(cleaned.n_raw, 200);
        assert_eq!(cleaned.n_removed, 10);
        assert_eq!(cleaned.dataset.len(), 190);
        assert_eq!(cleaned.dataset.records()[0].value, 6.0);
        assert_eq!(cleaned.dataset.records()[189].value, 195.0);
    }

    #[test]
    fn drops_values_equal_to_threshold() {
        let cfg = FilterConfig {
            lower_quantile: 0.25,
            upper_quantile: 0.75,
        };
        let cleaned = Cleaner::new(cfg)
            .clean(&dataset(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        assert_eq!(cleaned.bounds, Bounds { lower: 2.0, upper: 4.0 });
        assert_eq!(cleaned.dataset.values(), vec![3.0]);
    }

    #[test]
    fn fails_when_everything_is_removed() {
        let result = Cleaner::new(FilterConfig::default()).clean(&dataset(&[7.0; 10]));
        assert!(result.is_err());
    }

    #[test]
    fn keeps_date_order() {
        let cleaned = Cleaner::new(FilterConfig::default())
            .clean(&dataset(&[50.0, 1.0, 30.0, 20.0, 99.0, 40.0]))
            .unwrap();
        let dates: Vec<_> = cleaned.dataset.records().iter().map(|rec| rec.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(cleaned.dataset.values(), vec![50.0, 30.0, 20.0, 40.0]);
    }
}
