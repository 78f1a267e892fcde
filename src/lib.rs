pub mod block;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod map;
pub mod occupancy;
pub mod raster;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod spatial;
pub mod thermal;
pub mod web;

pub use block::{Block, BlockType};
pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use entity::{Entity, EntityKind, ItemKind};
pub use error::MapError;
pub use map::{add_items_to_blocks, add_roads_to_blocks, CityMap};
pub use scenario::{Scenario, ScenarioLoader};
pub use spatial::{MapShape, Position, Side};
