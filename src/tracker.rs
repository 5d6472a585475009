//! Followed TV shows

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedShow {
    pub link: PathBuf,
    pub title: String,
}

pub trait SeriesTracker {
    fn track(&mut self, show: &TrackedShow) -> Result<()>;
}

/// Keeps tracked shows as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonTracker {
    path: PathBuf,
}

impl JsonTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<TrackedShow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

impl SeriesTracker for JsonTracker {
    fn track(&mut self, show: &TrackedShow) -> Result<()> {
        let mut shows = self.load()?;
        if shows.iter().any(|existing| existing.link == show.link) {
            info!(link = %show.link.display(), "show already tracked");
            return Ok(());
        }
        shows.push(show.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&shows)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!(title = %show.title, "tracking show");
        Ok(())
    }
}
