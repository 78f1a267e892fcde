//! Pixel geometry and the row-major block grid

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Pixel position, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned pixel rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(pos: Position, width: u32, height: u32) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            width,
            height,
        }
    }

    pub fn square(pos: Position, side: u32) -> Self {
        Self::new(pos, side, side)
    }

    pub fn topleft(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Edge of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "top" => Ok(Side::Top),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(MapError::InvalidSide(other.to_string())),
        }
    }
}

/// Shape of the block grid in rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapShape {
    pub rows: usize,
    pub cols: usize,
}

impl MapShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn block_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Row and column of a row-major block index.
    pub fn cell(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.block_count() {
            Some((index / self.cols, index % self.cols))
        } else {
            None
        }
    }

    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    /// Index of the block across `side`, or `None` at the map boundary.
    pub fn neighbor(&self, index: usize, side: Side) -> Option<usize> {
        let (row, col) = self.cell(index)?;
        match side {
            Side::Top => row.checked_sub(1).and_then(|r| self.index(r, col)),
            Side::Bottom => self.index(row + 1, col),
            Side::Left => col.checked_sub(1).and_then(|c| self.index(row, c)),
            Side::Right => self.index(row, col + 1),
        }
    }

    /// Global top-left pixel of the block at `index`.
    pub fn topleft(&self, index: usize, block_size: u32) -> Option<Position> {
        let (row, col) = self.cell(index)?;
        Some(Position::new(
            col as u32 * block_size,
            row as u32 * block_size,
        ))
    }
}

impl fmt::Display for MapShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_stop_at_boundary() {
        let shape = MapShape::new(2, 3);
        assert_eq!(shape.neighbor(0, Side::Top), None);
        assert_eq!(shape.neighbor(0, Side::Left), None);
        assert_eq!(shape.neighbor(0, Side::Right), Some(1));
        assert_eq!(shape.neighbor(0, Side::Bottom), Some(3));
        assert_eq!(shape.neighbor(5, Side::Bottom), None);
        assert_eq!(shape.neighbor(5, Side::Right), None);
        assert_eq!(shape.neighbor(3, Side::Top), Some(0));
        assert_eq!(shape.neighbor(2, Side::Right), None);
        assert_eq!(shape.neighbor(6, Side::Top), None);
    }

    #[test]
    fn topleft_is_column_major_in_x() {
        let shape = MapShape::new(2, 3);
        assert_eq!(shape.topleft(4, 50), Some(Position::new(50, 50)));
        assert_eq!(shape.topleft(2, 50), Some(Position::new(100, 0)));
    }

    #[test]
    fn side_parsing_rejects_unknown() {
        assert_eq!("left".parse::<Side>(), Ok(Side::Left));
        assert_eq!(
            "middle".parse::<Side>(),
            Err(MapError::InvalidSide("middle".into()))
        );
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(Position::new(0, 0), 10, 5);
        let b = Rect::new(Position::new(0, 5), 5, 10);
        let c = Rect::new(Position::new(4, 4), 2, 2);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
        assert!(a.contains(9, 4));
        assert!(!a.contains(10, 4));
    }
}
