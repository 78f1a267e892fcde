use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    block::MIN_BLOCK_SIZE,
    config::{self, ScenarioError},
    error::MapError,
    map::{calculate_block_size, AllocationReport, BlockDistribution, CityMap},
    rng::{RngManager, LAYOUT_STREAM, PLACEMENT_STREAM},
    spatial::MapShape,
};

pub const DEFAULT_SEED: u64 = 42;

fn default_hour() -> f64 {
    12.0
}

fn default_frames() -> u64 {
    48
}

fn default_hours_per_frame() -> f64 {
    0.5
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub num_blocks: usize,
    pub rows: usize,
    /// Overrides the size derived from `num_blocks`.
    #[serde(default)]
    pub block_size: Option<u32>,
    pub distribution: BlockDistribution,
    #[serde(default)]
    pub houses: usize,
    #[serde(default)]
    pub trees: usize,
    #[serde(default = "default_hour")]
    pub hour: f64,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(default)]
    pub snapshot_interval_frames: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Frames evaluated when simulating the map over time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default = "default_hours_per_frame")]
    pub hours_per_frame: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            hours_per_frame: default_hours_per_frame(),
        }
    }
}

impl Timeline {
    pub fn hour_of(&self, frame: u64) -> f64 {
        frame as f64 * self.hours_per_frame
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Loads a YAML scenario, or a `Key: value` input file when the
    /// extension is `.txt`.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = if path.extension().is_some_and(|ext| ext == "txt") {
            config::parse_input(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            let scenario: Scenario = serde_yaml::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            scenario
                .validate()
                .with_context(|| format!("Invalid scenario {}", path.display()))?;
            scenario
        };
        debug!(path = %path.display(), name = %scenario.name, "scenario loaded");
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.num_blocks == 0 {
            return Err(ScenarioError::Validation(
                "number of blocks must be positive".into(),
            ));
        }
        if self.rows == 0 || self.rows > self.num_blocks {
            return Err(ScenarioError::Validation(format!(
                "number of rows must be between 1 and {}",
                self.num_blocks
            )));
        }
        if self.num_blocks % self.rows != 0 {
            return Err(ScenarioError::Validation(format!(
                "invalid shape, {} is not divisible by {}",
                self.num_blocks, self.rows
            )));
        }
        if self.distribution.total() != self.num_blocks {
            return Err(ScenarioError::Validation(format!(
                "block distribution covers {} blocks, expected {}",
                self.distribution.total(),
                self.num_blocks
            )));
        }
        if !(0.0..=24.0).contains(&self.hour) {
            return Err(ScenarioError::Validation(format!(
                "hour {} is outside 0-24",
                self.hour
            )));
        }
        if !(self.timeline.hours_per_frame > 0.0) {
            return Err(ScenarioError::Validation(
                "hours_per_frame must be positive".into(),
            ));
        }
        if let Some(size) = self.block_size {
            if size < MIN_BLOCK_SIZE {
                return Err(ScenarioError::Validation(format!(
                    "block size {size} is below the minimum of {MIN_BLOCK_SIZE}"
                )));
            }
        }
        Ok(())
    }

    pub fn shape(&self) -> MapShape {
        MapShape::new(self.rows, self.num_blocks / self.rows.max(1))
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
            .unwrap_or_else(|| calculate_block_size(self.num_blocks))
    }

    /// Shuffles the block types, lays roads and allocates the requested
    /// houses and trees, each clamped to the map's total capacity.
    pub fn build_map(&self, rng: &mut RngManager) -> Result<(CityMap, AllocationReport), MapError> {
        let mut map = CityMap::shuffled(
            self.shape(),
            self.block_size(),
            self.distribution,
            &mut rng.stream(LAYOUT_STREAM),
        )?;
        map.add_roads()?;
        // requests beyond what the map could ever hold count only up to capacity
        let (house_capacity, tree_capacity) = map.max_items();
        let houses = self.houses.min(house_capacity);
        let trees = self.trees.min(tree_capacity);
        if houses < self.houses || trees < self.trees {
            debug!(
                houses = self.houses,
                trees = self.trees,
                house_capacity,
                tree_capacity,
                "requests clamped to map capacity"
            );
        }
        let report = map.populate(houses, trees, &mut rng.stream(PLACEMENT_STREAM));
        info!(
            scenario = %self.name,
            shape = %map.shape(),
            block_size = map.block_size(),
            houses = report.houses_placed,
            trees = report.trees_placed,
            "map generated"
        );
        Ok((map, report))
    }
}
