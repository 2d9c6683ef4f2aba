mod cleaning;
mod config;
mod data;
mod manager;
mod plots;
mod stats;
mod summary;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `config.toml`, the input CSV and all outputs.
    #[arg(long)]
    work_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the dataset without outliers.
    Clean,

    /// Write descriptive statistics as JSON.
    Summarize,

    /// Draw daily page views.
    Line,

    /// Draw monthly averages grouped by year.
    Bar,

    /// Draw year-wise and month-wise box plots.
    Box,

    /// Draw all three charts.
    All,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.work_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Clean => mgr.clean_data()?,
        Command::Summarize => mgr.summarize()?,
        Command::Line => mgr.draw_line_plot()?,
        Command::Bar => mgr.draw_bar_plot()?,
        Command::Box => mgr.draw_box_plot()?,
        Command::All => mgr.draw_all()?,
    }

    Ok(())
}
