// src/layout.rs

use crate::error::{Result, StatsError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where an archive's input and derived files live.
///
/// Built once from the command line and handed to every component that
/// reads or writes files, so no path is computed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub archive_root: PathBuf,
    /// `academia` for `academia.stackexchange.com`
    pub root_name: String,
    pub results_dir: PathBuf,
    pub plots_dir: PathBuf,
}

impl ArchiveLayout {
    pub fn new(archive_root: &Path) -> Self {
        let dir_name = archive_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root_name = dir_name.split('.').next().unwrap_or_default().to_string();

        ArchiveLayout {
            archive_root: archive_root.to_path_buf(),
            root_name,
            results_dir: archive_root.join("results"),
            plots_dir: archive_root.join("plots"),
        }
    }

    /// Checks the archive exists and creates `results/` and `plots/` when missing.
    pub fn prepare(archive_root: &Path) -> Result<Self> {
        if !archive_root.is_dir() {
            return Err(StatsError::ArchiveNotFound(archive_root.to_path_buf()));
        }

        let layout = ArchiveLayout::new(archive_root);
        for dir in [&layout.results_dir, &layout.plots_dir] {
            if !dir.exists() {
                info!("Making directory: {}", dir.display());
                fs::create_dir_all(dir).map_err(StatsError::io(dir))?;
            }
        }
        Ok(layout)
    }

    pub fn posts_file(&self) -> PathBuf {
        self.archive_root.join("Posts.xml")
    }

    pub fn tag_date_file(&self) -> PathBuf {
        self.results_dir.join(format!("tag_date_data_{}.txt", self.root_name))
    }

    pub fn tag_rank_file(&self) -> PathBuf {
        self.results_dir.join(format!("tag_rank_data_{}.txt", self.root_name))
    }

    pub fn frequency_plot(&self, rank: usize, tag: &str) -> PathBuf {
        self.plots_dir.join(format!("freq_{}_{}_tight.png", rank, tag))
    }

    pub fn weekday_plot(&self, rank: usize, tag: &str) -> PathBuf {
        self.plots_dir.join(format!("days_{}_{}_tight.png", rank, tag))
    }
}
