use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    map::{CityMap, FrameSnapshot},
    scenario::Timeline,
    snapshot::SnapshotWriter,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub timeline: Timeline,
    pub snapshot_interval_frames: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.settings.timeline = timeline;
        self
    }

    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>, interval_frames: u64) -> Self {
        self.settings.snapshot_dir = dir.into();
        self.settings.snapshot_interval_frames = interval_frames;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_frames,
            ),
            settings: self.settings,
            frame: 0,
        }
    }
}

/// Steps a generated map through the timeline, one hour value per frame.
pub struct Engine {
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
    frame: u64,
}

impl Engine {
    /// Evaluates the map at a single hour and summarises it.
    pub fn evaluate(&self, map: &mut CityMap, frame: u64, hour: f64) -> FrameSnapshot {
        map.update_temperatures(hour);
        map.snapshot(&self.settings.scenario_name, frame, hour)
    }

    /// Runs `frames` further frames, calling `hook` after each one.
    pub fn run_with_hook<F>(&mut self, map: &mut CityMap, frames: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(FrameSnapshot, &CityMap),
    {
        for _ in 0..frames {
            let frame = self.frame;
            let hour = self.settings.timeline.hour_of(frame);
            let snapshot = self.evaluate(map, frame, hour);
            if let Some(stats) = snapshot.stats {
                debug!(frame, hour, min = stats.min, max = stats.max, mean = stats.mean, "frame evaluated");
            }
            self.snapshot_writer.maybe_write(&snapshot)?;
            hook(snapshot, &*map);
            self.frame += 1;
        }
        info!(
            scenario = %self.settings.scenario_name,
            frames,
            "timeline complete"
        );
        Ok(())
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }
}
