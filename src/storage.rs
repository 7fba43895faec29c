//! Chart file storage keyed by song title.
//!
//! A song without a chart file gets one: a skeleton chart is written on first
//! load, so the rest of the editor always works on stored text.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use strict_num_extended::PositiveF64;
use thiserror::Error;
use tracing::info;

use crate::chart::{ChartCodec, ChartDocument};

/// An error occurred when reading or writing chart text.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying storage failed.
    #[error("chart storage failed at {}: {source}", path.display())]
    Io {
        /// The chart path involved.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: io::Error,
    },
}

/// Where chart text lives.
pub trait ChartStorage {
    /// Read the whole text at `path`, `None` if there is no such chart.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the chart exists but cannot be read.
    fn read_all(&self, path: &Path) -> Result<Option<String>, StorageError>;

    /// Replace the text at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the text cannot be written.
    fn write_all(&mut self, path: &Path, text: &str) -> Result<(), StorageError>;
}

/// Relative path of the chart for `title`, e.g. `Title.txt`.
#[must_use]
pub fn chart_path(title: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{title}.{extension}"))
}

/// Charts as files under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChartStorage {
    root: PathBuf,
}

impl FsChartStorage {
    /// Store charts under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChartStorage for FsChartStorage {
    fn read_all(&self, path: &Path) -> Result<Option<String>, StorageError> {
        let full = self.root.join(path);
        match fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path: full, source }),
        }
    }

    fn write_all(&mut self, path: &Path, text: &str) -> Result<(), StorageError> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, text).map_err(|source| StorageError::Io { path: full, source })
    }
}

/// Charts kept in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryChartStorage {
    files: HashMap<PathBuf, String>,
}

impl MemoryChartStorage {
    /// An empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `text` at `path`, returning the text it replaced.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Option<String> {
        self.files.insert(path.into(), text.into())
    }

    /// The text at `path`.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Number of stored charts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ChartStorage for MemoryChartStorage {
    fn read_all(&self, path: &Path) -> Result<Option<String>, StorageError> {
        Ok(self.files.get(path).cloned())
    }

    fn write_all(&mut self, path: &Path, text: &str) -> Result<(), StorageError> {
        self.files.insert(path.to_path_buf(), text.to_owned());
        Ok(())
    }
}

/// Chart text as loaded by [`load_or_bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChart {
    /// The text.
    pub text: String,
    /// Whether the text was just synthesized and written.
    pub bootstrapped: bool,
}

/// Read the chart at `path`, writing a skeleton for `title` and `bpm` first if
/// there is none.
///
/// # Errors
///
/// Returns [`StorageError`] if reading or writing fails.
pub fn load_or_bootstrap(
    storage: &mut impl ChartStorage,
    path: &Path,
    title: &str,
    bpm: PositiveF64,
    codec: &ChartCodec,
) -> Result<LoadedChart, StorageError> {
    if let Some(text) = storage.read_all(path)? {
        return Ok(LoadedChart {
            text,
            bootstrapped: false,
        });
    }
    let text = codec.generate(&ChartDocument::skeleton(title, bpm));
    storage.write_all(path, &text)?;
    info!(path = %path.display(), title, bpm = bpm.as_f64(), "chart bootstrapped");
    Ok(LoadedChart {
        text,
        bootstrapped: true,
    })
}
