use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Input parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// CSV file with `date` and `value` columns, relative to the work directory.
    pub data_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_file: "fcc-forum-pageviews.csv".into(),
        }
    }
}

/// Outlier filter parameters.
///
/// Rows are kept only if their value lies strictly between the
/// `lower_quantile` and `upper_quantile` of the whole dataset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Quantile at or below which rows are dropped.
    pub lower_quantile: f64,
    /// Quantile at or above which rows are dropped.
    pub upper_quantile: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lower_quantile: 0.025,
            upper_quantile: 0.975,
        }
    }
}

/// Output file names, relative to the work directory.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Dataset without outliers, as CSV.
    pub clean_file: String,
    /// Descriptive statistics, as JSON.
    pub summary_file: String,
    /// Daily page views line plot.
    pub line_file: String,
    /// Monthly averages bar plot.
    pub bar_file: String,
    /// Year-wise and month-wise box plots.
    pub box_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clean_file: "clean.csv".into(),
            summary_file: "summary.json".into(),
            line_file: "line_plot.png".into(),
            bar_file: "bar_plot.png".into(),
            box_file: "box_plot.png".into(),
        }
    }
}

/// Line plot parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    /// Chart caption.
    pub title: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            title: "Daily freeCodeCamp Forum Page Views 5/2016-12/2019".into(),
            width: 1000,
            height: 500,
        }
    }
}

/// Bar plot parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarConfig {
    /// Chart caption.
    pub title: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            title: "Average Monthly Page Views (by Year)".into(),
            width: 1200,
            height: 600,
        }
    }
}

/// Box plot parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoxConfig {
    /// Caption of the left (year-wise) panel.
    pub year_title: String,
    /// Caption of the right (month-wise) panel.
    pub month_title: String,
    /// Image width in pixels, shared by both panels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            year_title: "Year-wise Box Plot (Trend)".into(),
            month_title: "Month-wise Box Plot (Seasonality)".into(),
            width: 1200,
            height: 600,
        }
    }
}

/// Tool configuration parameters.
///
/// Loaded from a TOML file and validated before use. Every field has a
/// default, so an empty file (or no file at all) is a valid configuration.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input dataset.
    pub input: InputConfig,
    /// Outlier filter.
    pub filter: FilterConfig,
    /// Output file names.
    pub output: OutputConfig,
    /// Line plot.
    pub line: LineConfig,
    /// Bar plot.
    pub bar: BarConfig,
    /// Box plots.
    pub box_plot: BoxConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.data_file.is_empty() {
            bail!("data file name must not be empty");
        }

        check_num(self.filter.lower_quantile, 0.0..=1.0).context("invalid lower quantile")?;
        check_num(self.filter.upper_quantile, 0.0..=1.0).context("invalid upper quantile")?;
        if self.filter.lower_quantile >= self.filter.upper_quantile {
            bail!(
                "lower quantile must be below upper quantile, but {} >= {}",
                self.filter.lower_quantile,
                self.filter.upper_quantile
            );
        }

        let sizes = [
            ("line", self.line.width, self.line.height),
            ("bar", self.bar.width, self.bar.height),
            ("box", self.box_plot.width, self.box_plot.height),
        ];
        for (name, width, height) in sizes {
            check_num(width, 100..=10_000).with_context(|| format!("invalid {name} plot width"))?;
            check_num(height, 100..=10_000)
                .with_context(|| format!("invalid {name} plot height"))?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
