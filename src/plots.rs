//! Chart rendering.
//!
//! All charts are written as PNG files through the [`plotters`] bitmap backend.
//! Categorical axes (years, months) are drawn on a continuous axis where
//! category `i` sits at `x = i` and spans `i - 0.5..i + 0.5`.

use crate::config::{BarConfig, BoxConfig, LineConfig};
use crate::data::Dataset;
use crate::stats::{
    AccumulatorReport, GroupStats, group_box_stats, month_abbrev, month_name, monthly_averages,
};
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Days};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const FONT: &str = "sans-serif";

/// Twelve bars share 80% of each year's slot.
const BAR_WIDTH: f64 = 0.8 / 12.0;

/// Label of the category at `x`, or an empty string between categories.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Value axis range fitted to `min..max` with a 5% margin on both sides.
fn fitted_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span <= 0.0 {
        return (min - 0.5, max + 0.5);
    }
    (min - 0.05 * span, max + 0.05 * span)
}

/// Value axis range anchored at zero, with headroom above the largest value.
fn zero_based_range(min: f64, max: f64) -> (f64, f64) {
    let lo = min.min(0.0);
    let hi = max.max(0.0);
    if hi - lo <= 0.0 {
        return (lo, lo + 1.0);
    }
    (lo, hi + 0.05 * (hi - lo))
}

/// Bar corners of `month`, one per year that has data for that month.
fn month_bars(
    avgs: &BTreeMap<(i32, u32), AccumulatorReport>,
    years: &[i32],
    month: u32,
) -> Vec<[(f64, f64); 2]> {
    years
        .iter()
        .enumerate()
        .filter_map(|(i_year, &year)| {
            let rep = avgs.get(&(year, month))?;
            let x0 = i_year as f64 - 0.4 + (month - 1) as f64 * BAR_WIDTH;
            Some([(x0, 0.0), (x0 + BAR_WIDTH, rep.mean)])
        })
        .collect()
}

/// Year-wise and month-wise box statistics sharing one value axis.
struct BoxPanels {
    by_year: Vec<GroupStats>,
    by_month: Vec<GroupStats>,
    y_range: (f64, f64),
}

impl BoxPanels {
    fn new(dataset: &Dataset) -> Result<Self> {
        if dataset.is_empty() {
            bail!("dataset is empty");
        }
        let records = dataset.records();

        let by_year = group_box_stats(records, |rec| rec.date.year(), |year| year.to_string())
            .context("failed to compute year-wise statistics")?;
        let by_month = group_box_stats(
            records,
            |rec| rec.date.month(),
            |month| month_abbrev(month).to_string(),
        )
        .context("failed to compute month-wise statistics")?;

        let (min, max) = by_year
            .iter()
            .chain(&by_month)
            .map(|grp| grp.stats.extent())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (min, max)| {
                (lo.min(min), hi.max(max))
            });

        Ok(Self {
            by_year,
            by_month,
            y_range: fitted_range(min, max),
        })
    }
}

/// Draw the daily page views as a red line.
pub fn draw_line_plot(dataset: &Dataset, cfg: &LineConfig, file: &Path) -> Result<()> {
    let (first, mut last) = dataset.date_range().context("dataset is empty")?;
    if first == last {
        last = last + Days::new(1);
    }

    let values = dataset.values();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi) = fitted_range(min, max);

    let root = BitMapBackend::new(file, (cfg.width, cfg.height)).into_drawing_area();
    root.fill(&WHITE).context("failed to fill drawing area")?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&cfg.title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(first..last, y_lo..y_hi)
        .context("failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Page Views")
        .x_labels(8)
        .x_label_formatter(&|date| date.format("%Y-%m").to_string())
        .y_label_formatter(&|val| format!("{val:.0}"))
        .draw()
        .context("failed to draw mesh")?;

    chart
        .draw_series(LineSeries::new(
            dataset.records().iter().map(|rec| (rec.date, rec.value)),
            &RED,
        ))
        .context("failed to draw line")?;

    root.present()
        .with_context(|| format!("failed to save {file:?}"))?;

    Ok(())
}

/// Draw the monthly average page views, one group of bars per year.
pub fn draw_bar_plot(dataset: &Dataset, cfg: &BarConfig, file: &Path) -> Result<()> {
    if dataset.is_empty() {
        bail!("dataset is empty");
    }

    let avgs = monthly_averages(dataset.records());
    let years: Vec<i32> = avgs
        .keys()
        .map(|&(year, _)| year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let year_labels: Vec<String> = years.iter().map(|year| year.to_string()).collect();

    let min = avgs.values().map(|rep| rep.mean).fold(f64::INFINITY, f64::min);
    let max = avgs.values().map(|rep| rep.mean).fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi) = zero_based_range(min, max);

    let root = BitMapBackend::new(file, (cfg.width, cfg.height)).into_drawing_area();
    root.fill(&WHITE).context("failed to fill drawing area")?;

    let n_years = years.len();
    let mut chart = ChartBuilder::on(&root)
        .caption(&cfg.title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5..(n_years as f64 - 0.5), y_lo..y_hi)
        .context("failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Years")
        .y_desc("Average Page Views")
        .x_labels(n_years)
        .x_label_formatter(&|x| category_label(&year_labels, *x))
        .y_label_formatter(&|val| format!("{val:.0}"))
        .draw()
        .context("failed to draw mesh")?;

    for month in 1..=12u32 {
        let style = Palette99::pick(month as usize - 1).filled();
        let bars = month_bars(&avgs, &years, month)
            .into_iter()
            .map(|corners| Rectangle::new(corners, style));

        chart
            .draw_series(bars)
            .with_context(|| format!("failed to draw bars of month {month}"))?
            .label(month_name(month))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .context("failed to draw legend")?;

    root.present()
        .with_context(|| format!("failed to save {file:?}"))?;

    Ok(())
}

/// Draw the year-wise (trend) and month-wise (seasonality) box plots side by side.
pub fn draw_box_plot(dataset: &Dataset, cfg: &BoxConfig, file: &Path) -> Result<()> {
    let panels = BoxPanels::new(dataset)?;

    let root = BitMapBackend::new(file, (cfg.width, cfg.height)).into_drawing_area();
    root.fill(&WHITE).context("failed to fill drawing area")?;

    let areas = root.split_evenly((1, 2));
    draw_box_panel(&areas[0], &cfg.year_title, "Year", &panels.by_year, panels.y_range)
        .context("failed to draw year-wise panel")?;
    draw_box_panel(&areas[1], &cfg.month_title, "Month", &panels.by_month, panels.y_range)
        .context("failed to draw month-wise panel")?;

    root.present()
        .with_context(|| format!("failed to save {file:?}"))?;

    Ok(())
}

fn draw_box_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    x_desc: &str,
    groups: &[GroupStats],
    (y_lo, y_hi): (f64, f64),
) -> Result<()> {
    let labels: Vec<String> = groups.iter().map(|grp| grp.label.clone()).collect();
    let n_groups = groups.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(n_groups as f64 - 0.5), y_lo..y_hi)
        .context("failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Page Views")
        .x_labels(n_groups)
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_label_formatter(&|val| format!("{val:.0}"))
        .draw()
        .context("failed to draw mesh")?;

    let half_width = 0.3;
    let boxes = groups.iter().enumerate().map(|(i, GroupStats { stats, .. })| {
        let x = i as f64;
        [(x - half_width, stats.q1), (x + half_width, stats.q3)]
    });

    chart
        .draw_series(boxes.clone().enumerate().map(|(i, corners)| {
            Rectangle::new(corners, Palette99::pick(i).mix(0.7).filled())
        }))
        .context("failed to draw boxes")?;
    chart
        .draw_series(boxes.map(|corners| Rectangle::new(corners, BLACK.stroke_width(1))))
        .context("failed to draw box outlines")?;

    let mut lines = Vec::new();
    for (i, GroupStats { stats, .. }) in groups.iter().enumerate() {
        let x = i as f64;
        let cap = half_width / 2.0;
        let thin = BLACK.stroke_width(1);
        lines.push(PathElement::new(
            vec![(x - half_width, stats.median), (x + half_width, stats.median)],
            BLACK.stroke_width(2),
        ));
        lines.push(PathElement::new(vec![(x, stats.q3), (x, stats.upper_whisker)], thin));
        lines.push(PathElement::new(vec![(x, stats.q1), (x, stats.lower_whisker)], thin));
        lines.push(PathElement::new(
            vec![(x - cap, stats.upper_whisker), (x + cap, stats.upper_whisker)],
            thin,
        ));
        lines.push(PathElement::new(
            vec![(x - cap, stats.lower_whisker), (x + cap, stats.lower_whisker)],
            thin,
        ));
    }
    chart
        .draw_series(lines)
        .context("failed to draw whiskers")?;

    let fliers = groups.iter().enumerate().flat_map(|(i, GroupStats { stats, .. })| {
        let x = i as f64;
        stats
            .fliers
            .iter()
            .map(move |&val| Circle::new((x, val), 2, BLACK.stroke_width(1)))
    });
    chart
        .draw_series(fliers)
        .context("failed to draw fliers")?;

    Ok(())
}
