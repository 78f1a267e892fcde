//! Items that can be placed inside a block

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::raster::{Rgb, BLACK, GREEN, YELLOW};
use crate::spatial::{Position, Rect};
use crate::thermal::{ThermalItem, HOUSE_INITIAL_TEMP, ROAD_INITIAL_TEMP, TREE_INITIAL_TEMP};

pub const ROAD_THICKNESS: u32 = 5;

/// Kinds that the random placement search can put into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Tree,
    House,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Tree => f.write_str("Tree"),
            ItemKind::House => f.write_str("House"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Tree" => Ok(ItemKind::Tree),
            "House" => Ok(ItemKind::House),
            other => Err(MapError::UnknownItemKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityKind {
    Tree { size: u32 },
    House { size: u32 },
    Road { length: u32, orientation: Orientation },
}

/// A placed item: footprint, color and its own thermal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Position,
    pub kind: EntityKind,
    pub thermal: ThermalItem,
}

impl Entity {
    pub fn tree(pos: Position, size: u32, ambient_temp: f64) -> Self {
        Self {
            pos,
            kind: EntityKind::Tree { size },
            thermal: ThermalItem::new(TREE_INITIAL_TEMP, ambient_temp),
        }
    }

    pub fn house(pos: Position, size: u32, ambient_temp: f64) -> Self {
        Self {
            pos,
            kind: EntityKind::House { size },
            thermal: ThermalItem::new(HOUSE_INITIAL_TEMP, ambient_temp),
        }
    }

    pub fn item(kind: ItemKind, pos: Position, size: u32, ambient_temp: f64) -> Self {
        match kind {
            ItemKind::Tree => Self::tree(pos, size, ambient_temp),
            ItemKind::House => Self::house(pos, size, ambient_temp),
        }
    }

    pub fn road(pos: Position, length: u32, orientation: Orientation, ambient_temp: f64) -> Self {
        Self {
            pos,
            kind: EntityKind::Road {
                length,
                orientation,
            },
            thermal: ThermalItem::new(ROAD_INITIAL_TEMP, ambient_temp),
        }
    }

    pub fn topleft(&self) -> Position {
        self.pos
    }

    pub fn width(&self) -> u32 {
        match self.kind {
            EntityKind::Tree { size } | EntityKind::House { size } => size,
            EntityKind::Road {
                length,
                orientation,
            } => match orientation {
                Orientation::Horizontal => length,
                Orientation::Vertical => ROAD_THICKNESS,
            },
        }
    }

    pub fn height(&self) -> u32 {
        match self.kind {
            EntityKind::Tree { size } | EntityKind::House { size } => size,
            EntityKind::Road {
                length,
                orientation,
            } => match orientation {
                Orientation::Horizontal => ROAD_THICKNESS,
                Orientation::Vertical => length,
            },
        }
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.pos, self.width(), self.height())
    }

    pub fn rgb(&self) -> Rgb {
        match self.kind {
            EntityKind::Tree { .. } => GREEN,
            EntityKind::House { .. } => YELLOW,
            EntityKind::Road { .. } => BLACK,
        }
    }

    pub fn item_kind(&self) -> Option<ItemKind> {
        match self.kind {
            EntityKind::Tree { .. } => Some(ItemKind::Tree),
            EntityKind::House { .. } => Some(ItemKind::House),
            EntityKind::Road { .. } => None,
        }
    }

    pub fn is_road(&self) -> bool {
        matches!(self.kind, EntityKind::Road { .. })
    }

    pub fn current_temp(&self) -> f64 {
        self.thermal.current_temp
    }

    pub fn update_temperature(&mut self, hour: f64) {
        self.thermal.update_temperature(hour);
    }
}
