//! Persistence seam for the all-time top score.

use std::{
    fs, io,
    num::ParseIntError,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors raised while reading or writing the persisted top score.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("high score file {} is not accessible: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file did not hold a single unsigned integer.
    #[error("high score file {} is corrupted: {source}", path.display())]
    Corrupted {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// Storage for the single integer that survives between matches.
pub trait HighScoreStore {
    /// Reads the persisted top score; a store that never saved reports zero.
    fn load(&self) -> Result<u32, StoreError>;

    /// Replaces the persisted top score.
    fn save(&mut self, top_score: u32) -> Result<(), StoreError>;
}

/// In-process store, handy for tests and throwaway sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    top_score: u32,
}

impl MemoryStore {
    /// Creates a store that already remembers `top_score`.
    #[must_use]
    pub const fn new(top_score: u32) -> Self {
        Self { top_score }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> Result<u32, StoreError> {
        Ok(self.top_score)
    }

    fn save(&mut self, top_score: u32) -> Result<(), StoreError> {
        self.top_score = top_score;
        Ok(())
    }
}

/// Store keeping the top score as decimal text in a file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `path`; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> Result<u32, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed.parse().map_err(|source| StoreError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, top_score: u32) -> Result<(), StoreError> {
        fs::write(&self.path, format!("{top_score}\n")).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
