// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("archive to analyze not found, check for {0}")]
    ArchiveNotFound(PathBuf),

    #[error("{0} not found")]
    MissingPosts(PathBuf),

    #[error("malformed archive {path} at byte {position}: {source}")]
    MalformedArchive {
        path: PathBuf,
        position: usize,
        source: quick_xml::Error,
    },

    #[error("malformed dataset {path} at line {line}: {reason}")]
    MalformedDataset {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to render {path}: {source}")]
    Render {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl StatsError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StatsError::Io { source, path }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
