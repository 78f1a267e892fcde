use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::map::FrameSnapshot;

#[derive(Serialize)]
struct SnapshotFile<'a> {
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    frame: &'a FrameSnapshot,
}

/// Writes every `interval`-th frame as pretty JSON under
/// `<dir>/<scenario>/frame_NNNNNN.json`. An interval of zero disables output.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn is_due(&self, frame: u64) -> bool {
        self.interval != 0 && frame % self.interval == 0
    }

    pub fn maybe_write(&self, frame: &FrameSnapshot) -> Result<Option<PathBuf>> {
        if !self.is_due(frame.frame) {
            return Ok(None);
        }
        self.write(frame).map(Some)
    }

    pub fn write(&self, frame: &FrameSnapshot) -> Result<PathBuf> {
        self.write_named(frame, &format!("frame_{:06}", frame.frame))
    }

    /// Writes `frame` as `<dir>/<scenario>/<name>.json`, outside the
    /// numbered timeline files.
    pub fn write_named(&self, frame: &FrameSnapshot, name: &str) -> Result<PathBuf> {
        let dir = self.dir.join(&frame.scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("{name}.json"));
        let file = SnapshotFile {
            written_at: Utc::now(),
            frame,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(path = %path.display(), "snapshot written");
        Ok(path)
    }
}
