use crate::cleaning::Cleaned;
use crate::stats::{
    AccumulatorReport, Bounds, GroupStats, group_box_stats, month_name, monthly_averages,
};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Descriptive statistics of a cleaned dataset.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub n_raw: usize,
    pub n_clean: usize,
    pub n_removed: usize,
    pub bounds: Bounds,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Keyed by `YYYY-MM`.
    pub monthly_averages: BTreeMap<String, AccumulatorReport>,
    pub by_year: Vec<GroupStats>,
    pub by_month: Vec<GroupStats>,
}

impl Summary {
    pub fn new(cleaned: &Cleaned) -> Result<Self> {
        let records = cleaned.dataset.records();

        let monthly_averages = monthly_averages(records)
            .into_iter()
            .map(|((year, month), rep)| (format!("{year:04}-{month:02}"), rep))
            .collect();

        let by_year = group_box_stats(records, |rec| rec.date.year(), |year| year.to_string())
            .context("failed to compute year-wise statistics")?;
        let by_month = group_box_stats(
            records,
            |rec| rec.date.month(),
            |month| month_name(month).to_string(),
        )
        .context("failed to compute month-wise statistics")?;

        let date_range = cleaned.dataset.date_range();

        Ok(Self {
            n_raw: cleaned.n_raw,
            n_clean: cleaned.dataset.len(),
            n_removed: cleaned.n_removed,
            bounds: cleaned.bounds,
            first_date: date_range.map(|(first, _)| first),
            last_date: date_range.map(|(_, last)| last),
            monthly_averages,
            by_year,
            by_month,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, self).context("failed to serialize summary")?;
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }
}
