use crate::cleaning::{Cleaned, Cleaner};
use crate::config::Config;
use crate::data::Dataset;
use crate::plots;
use crate::summary::Summary;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct Manager {
    work_dir: PathBuf,
    cfg: Config,
    cleaned: Cleaned,
}

impl Manager {
    /// Load the configuration and dataset of `work_dir` and remove outliers.
    ///
    /// `config.toml` is optional; defaults are used when it is missing.
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();

        let config_file = work_dir.join("config.toml");
        let cfg = if config_file.exists() {
            Config::from_file(&config_file).context("failed to construct cfg")?
        } else {
            log::info!("{config_file:?} not found, using defaults");
            Config::default()
        };
        log::info!("{cfg:#?}");

        let data_file = work_dir.join(&cfg.input.data_file);
        let raw = Dataset::from_file(&data_file).context("failed to load dataset")?;
        log::info!("loaded {} rows from {data_file:?}", raw.len());

        let cleaned = Cleaner::new(cfg.filter.clone())
            .clean(&raw)
            .context("failed to clean dataset")?;

        Ok(Self {
            work_dir,
            cfg,
            cleaned,
        })
    }

    pub fn clean_data(&self) -> Result<()> {
        let file = self.output_file(&self.cfg.output.clean_file);
        self.cleaned
            .dataset
            .to_file(&file)
            .context("failed to save clean dataset")?;
        log::info!("saved {file:?}");
        Ok(())
    }

    pub fn summarize(&self) -> Result<()> {
        let file = self.output_file(&self.cfg.output.summary_file);
        let summary = Summary::new(&self.cleaned).context("failed to construct summary")?;
        summary.save(&file).context("failed to save summary")?;
        log::info!("saved {file:?}");
        Ok(())
    }

    pub fn draw_line_plot(&self) -> Result<()> {
        let file = self.output_file(&self.cfg.output.line_file);
        plots::draw_line_plot(&self.cleaned.dataset, &self.cfg.line, &file)
            .context("failed to draw line plot")?;
        log::info!("saved {file:?}");
        Ok(())
    }

    pub fn draw_bar_plot(&self) -> Result<()> {
        let file = self.output_file(&self.cfg.output.bar_file);
        plots::draw_bar_plot(&self.cleaned.dataset, &self.cfg.bar, &file)
            .context("failed to draw bar plot")?;
        log::info!("saved {file:?}");
        Ok(())
    }

    pub fn draw_box_plot(&self) -> Result<()> {
        let file = self.output_file(&self.cfg.output.box_file);
        plots::draw_box_plot(&self.cleaned.dataset, &self.cfg.box_plot, &file)
            .context("failed to draw box plot")?;
        log::info!("saved {file:?}");
        Ok(())
    }

    pub fn draw_all(&self) -> Result<()> {
        self.draw_line_plot()?;
        self.draw_bar_plot()?;
        self.draw_box_plot()?;
        Ok(())
    }

    fn output_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}
