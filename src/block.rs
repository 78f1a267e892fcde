//! A single square block of the city map
//!
//! A block owns its occupancy raster and the items placed on it. Items are
//! only ever appended; once the layout is built only temperatures change.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ItemKind, Orientation, ROAD_THICKNESS};
use crate::error::MapError;
use crate::occupancy::{OccupancyGrid, ATTEMPTS};
use crate::raster::{Rgb, RgbBuffer, ThermalBuffer, BLUE, BROWN, GREY};
use crate::spatial::{Position, Rect, Side};
use crate::thermal::{ThermalItem, GROUND_INITIAL_TEMP, RIVER_INITIAL_TEMP, YARD_INITIAL_TEMP};

/// Smallest block side the layout accepts.
pub const MIN_BLOCK_SIZE: u32 = 10;

const HOUSE_FRACTION: f64 = 0.3;
const TREE_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Yard,
    Ground,
    River,
}

impl BlockType {
    pub fn base_color(self) -> Rgb {
        match self {
            BlockType::Yard => GREY,
            BlockType::Ground => BROWN,
            BlockType::River => BLUE,
        }
    }

    pub fn base_temp(self) -> f64 {
        match self {
            BlockType::Yard => YARD_INITIAL_TEMP,
            BlockType::Ground => GROUND_INITIAL_TEMP,
            BlockType::River => RIVER_INITIAL_TEMP,
        }
    }

    pub fn hosts(self, kind: ItemKind) -> bool {
        matches!(
            (self, kind),
            (BlockType::Yard, ItemKind::House) | (BlockType::Ground, ItemKind::Tree)
        )
    }

    pub fn hosts_roads(self) -> bool {
        self != BlockType::River
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Yard => f.write_str("Yard"),
            BlockType::Ground => f.write_str("Ground"),
            BlockType::River => f.write_str("River"),
        }
    }
}

impl FromStr for BlockType {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Yard" => Ok(BlockType::Yard),
            "Ground" => Ok(BlockType::Ground),
            "River" => Ok(BlockType::River),
            other => Err(MapError::UnknownBlockType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    size: u32,
    topleft: Position,
    block_type: BlockType,
    block_number: usize,
    items: Vec<Entity>,
    occupancy: OccupancyGrid,
    thermal: ThermalItem,
    house_size: u32,
    tree_size: u32,
    max_houses: usize,
    max_trees: usize,
}

impl Block {
    pub fn new(
        size: u32,
        topleft: Position,
        block_type: BlockType,
        block_number: usize,
    ) -> Result<Self, MapError> {
        if size < MIN_BLOCK_SIZE {
            return Err(MapError::BlockTooSmall {
                size,
                min: MIN_BLOCK_SIZE,
            });
        }
        let house_size = (size as f64 * HOUSE_FRACTION) as u32;
        let tree_size = (size as f64 * TREE_FRACTION) as u32;
        let per_row = |item: u32| (size / item) as usize;
        Ok(Self {
            size,
            topleft,
            block_type,
            block_number,
            items: Vec::new(),
            occupancy: OccupancyGrid::new(size),
            thermal: ThermalItem::ambient(block_type.base_temp()),
            house_size,
            tree_size,
            max_houses: per_row(house_size).pow(2),
            max_trees: per_row(tree_size).pow(2),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn topleft(&self) -> Position {
        self.topleft
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn block_number(&self) -> usize {
        self.block_number
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    pub fn thermal(&self) -> &ThermalItem {
        &self.thermal
    }

    pub fn current_temp(&self) -> f64 {
        self.thermal.current_temp
    }

    /// Ambient temperature handed to items placed on this block.
    pub fn ambient_temp(&self) -> f64 {
        self.thermal.initial_temp
    }

    pub fn house_size(&self) -> u32 {
        self.house_size
    }

    pub fn tree_size(&self) -> u32 {
        self.tree_size
    }

    pub fn max_houses(&self) -> usize {
        self.max_houses
    }

    pub fn max_trees(&self) -> usize {
        self.max_trees
    }

    pub fn item_size(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::House => self.house_size,
            ItemKind::Tree => self.tree_size,
        }
    }

    pub fn capacity(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::House => self.max_houses,
            ItemKind::Tree => self.max_trees,
        }
    }

    pub fn count(&self, kind: ItemKind) -> usize {
        self.items
            .iter()
            .filter(|item| item.item_kind() == Some(kind))
            .count()
    }

    pub fn road_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_road()).count()
    }

    /// Places one `kind` item, at `pos` when given or else at a random free
    /// spot. Returns `false` without touching the block when the type cannot
    /// host `kind`, the per-kind capacity is reached, or no free spot exists.
    pub fn add_item<R: Rng>(
        &mut self,
        kind: ItemKind,
        pos: Option<Position>,
        rng: &mut R,
    ) -> bool {
        if !self.block_type.hosts(kind) {
            return false;
        }
        if self.count(kind) >= self.capacity(kind) {
            return false;
        }
        let side = self.item_size(kind);
        let pos = match pos {
            Some(pos) => pos,
            None => match self.occupancy.find_random_free(side, ATTEMPTS, rng) {
                Some(pos) => pos,
                None => return false,
            },
        };
        let footprint = Rect::square(pos, side);
        if !self.occupancy.is_free(&footprint) {
            return false;
        }
        let ambient = self.ambient_temp();
        self.items.push(Entity::item(kind, pos, side, ambient));
        self.occupancy.mark(&footprint);
        true
    }

    /// Lays a road along `side`. Corner cells held by an earlier road stay
    /// with that road, so the new strip starts and ends past them. Returns
    /// `false` on River blocks, when nothing is left of the strip, and when a
    /// house or tree sits anywhere on it.
    pub fn add_road(&mut self, side: Side) -> bool {
        if !self.block_type.hosts_roads() {
            return false;
        }
        let Some(strip) = self.road_strip(side) else {
            return false;
        };
        if !self.occupancy.is_free(&strip) {
            return false;
        }
        let (length, orientation) = match side {
            Side::Top | Side::Bottom => (strip.width, Orientation::Horizontal),
            Side::Left | Side::Right => (strip.height, Orientation::Vertical),
        };
        let ambient = self.ambient_temp();
        self.items
            .push(Entity::road(strip.topleft(), length, orientation, ambient));
        self.occupancy.mark(&strip);
        true
    }

    /// Road request by side name, for callers reading sides from text.
    pub fn add_road_named(&mut self, side: &str) -> Result<bool, MapError> {
        let side: Side = side.parse()?;
        Ok(self.add_road(side))
    }

    fn road_strip(&self, side: Side) -> Option<Rect> {
        let edge = self.size - ROAD_THICKNESS;
        let horizontal = matches!(side, Side::Top | Side::Bottom);
        let offset = match side {
            Side::Top | Side::Left => 0,
            Side::Bottom | Side::Right => edge,
        };
        let roads: Vec<Rect> = self
            .items
            .iter()
            .filter(|item| item.is_road())
            .map(Entity::footprint)
            .collect();
        // cross-section of the strip at position `along` on its long axis
        let blocked = |along: u32| {
            (offset..offset + ROAD_THICKNESS).any(|across| {
                let (x, y) = if horizontal {
                    (along, across)
                } else {
                    (across, along)
                };
                roads.iter().any(|road| road.contains(x, y))
            })
        };
        let mut start = 0;
        while start < self.size && blocked(start) {
            start += 1;
        }
        let mut end = self.size;
        while end > start && blocked(end - 1) {
            end -= 1;
        }
        if start >= end {
            return None;
        }
        let strip = if horizontal {
            Rect::new(Position::new(start, offset), end - start, ROAD_THICKNESS)
        } else {
            Rect::new(Position::new(offset, start), ROAD_THICKNESS, end - start)
        };
        Some(strip)
    }

    pub fn generate_rgb_view(&self) -> RgbBuffer {
        let mut view = RgbBuffer::filled(self.size, self.size, self.block_type.base_color());
        for item in &self.items {
            view.fill_rect(&item.footprint(), item.rgb());
        }
        view
    }

    pub fn generate_thermal_view(&self) -> ThermalBuffer {
        let mut view = ThermalBuffer::filled(self.size, self.size, self.current_temp());
        for item in &self.items {
            view.fill_rect(&item.footprint(), item.current_temp());
        }
        view
    }

    pub fn update_temperatures(&mut self, hour: f64) {
        self.thermal.update_temperature(hour);
        for item in &mut self.items {
            item.update_temperature(hour);
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Block {}: topleft={}, items={}, temp={:.1}°C",
            self.block_type,
            self.block_number,
            self.topleft,
            self.items.len(),
            self.current_temp()
        )
    }
}
