//! Moves staged hourly directories into the landing zone, one at a time.

use async_trait::async_trait;
use common::config::MoverConfig;
use common::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

#[async_trait]
pub trait DirectoryMover: Send + Sync {
    async fn move_dir(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Same-filesystem rename.
pub struct RenameMover;

#[async_trait]
impl DirectoryMover for RenameMover {
    async fn move_dir(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::rename(from, to).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSummary {
    pub attempted: usize,
    pub moved: usize,
    pub failed: usize,
}

pub struct LandingMover<M = RenameMover> {
    source: PathBuf,
    target: PathBuf,
    mover: M,
}

impl LandingMover<RenameMover> {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self::with_mover(source, target, RenameMover)
    }

    pub fn from_config(config: &MoverConfig) -> Self {
        Self::new(&config.source_dir, &config.target_dir)
    }
}

impl<M: DirectoryMover> LandingMover<M> {
    pub fn with_mover(source: impl Into<PathBuf>, target: impl Into<PathBuf>, mover: M) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mover,
        }
    }

    /// Names of the subdirectories waiting in the source, sorted.
    pub async fn pending(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.source).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Moves the first pending directory. `Ok(None)` when nothing is pending.
    pub async fn move_next(&self) -> Result<Option<String>> {
        let Some(name) = self.pending().await?.into_iter().next() else {
            info!(source = %self.source.display(), "No directories pending");
            return Ok(None);
        };
        self.move_one(&name).await?;
        Ok(Some(name))
    }

    /// Moves every pending directory in order. Failures are logged and skipped;
    /// `delay` is slept between items.
    pub async fn move_all(&self, delay: Duration) -> Result<MoveSummary> {
        let pending = self.pending().await?;
        let mut summary = MoveSummary::default();

        for (i, name) in pending.iter().enumerate() {
            summary.attempted += 1;
            match self.move_one(name).await {
                Ok(()) => summary.moved += 1,
                Err(e) => {
                    error!(directory = %name, error = %e, "Failed to move directory");
                    summary.failed += 1;
                }
            }

            if i + 1 < pending.len() {
                info!(seconds = delay.as_secs(), "Waiting before next directory");
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            attempted = summary.attempted,
            moved = summary.moved,
            failed = summary.failed,
            "Landing zone drained"
        );
        Ok(summary)
    }

    async fn move_one(&self, name: &str) -> Result<()> {
        let from = self.source.join(name);
        let to = self.target.join(name);
        tokio::fs::create_dir_all(&self.target).await?;

        self.mover.move_dir(&from, &to).await.map_err(|e| {
            Error::Storage(format!(
                "failed to move {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;
        info!(from = %from.display(), to = %to.display(), "Moved directory");
        Ok(())
    }
}
