//! Page views dataset.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, io::Write, path::Path};

/// Page views recorded on a single day.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub value: f64,
}

/// Daily page views, ordered by ascending date.
#[derive(Debug, PartialEq, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset from records in any order.
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|rec| rec.date);
        Self { records }
    }

    /// Load a dataset from a CSV file with `date` and `value` columns.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, if any row cannot be
    /// parsed, or if the file holds no rows.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        Self::from_reader(reader).with_context(|| format!("failed to load {file:?}"))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);

        let mut records = Vec::new();
        // Data rows are numbered from 1, below the header.
        for (i_row, result) in (1..).zip(reader.deserialize()) {
            let rec: Record = result.with_context(|| format!("failed to parse row {i_row}"))?;
            if !rec.value.is_finite() {
                bail!("row {i_row} has non-finite value {}", rec.value);
            }
            records.push(rec);
        }

        if records.is_empty() {
            bail!("dataset is empty");
        }

        Ok(Self::new(records))
    }

    /// Save the dataset as a `date,value` CSV file.
    pub fn to_file<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let writer = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        self.to_writer(writer)
            .with_context(|| format!("failed to write {file:?}"))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for rec in &self.records {
            writer.serialize(rec).context("failed to serialize record")?;
        }
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|rec| rec.value).collect()
    }

    /// First and last date, or `None` for an empty dataset.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.date, last.date))
    }

    /// Keep only the records for which `pred` holds.
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&Record) -> bool,
    {
        let records = self.records.iter().copied().filter(|rec| pred(rec)).collect();
        Self { records }
    }
}
