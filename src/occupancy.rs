//! Per-block occupancy raster and the random free-space search

use rand::Rng;

use crate::spatial::{Position, Rect};

/// Number of random draws before a placement search gives up.
pub const ATTEMPTS: usize = 100;

/// Square boolean raster, one cell per pixel of the owning block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    size: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cells: vec![false; size as usize * size as usize],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn in_bounds(&self, rect: &Rect) -> bool {
        rect.x as u64 + rect.width as u64 <= self.size as u64
            && rect.y as u64 + rect.height as u64 <= self.size as u64
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        x < self.size && y < self.size && self.cells[self.offset(x, y)]
    }

    /// True when `rect` lies inside the grid and none of its cells are taken.
    pub fn is_free(&self, rect: &Rect) -> bool {
        if !self.in_bounds(rect) {
            return false;
        }
        (rect.y..rect.y + rect.height)
            .all(|y| (rect.x..rect.x + rect.width).all(|x| !self.cells[self.offset(x, y)]))
    }

    /// Claims every cell of `rect` that lies inside the grid.
    pub fn mark(&mut self, rect: &Rect) {
        let x_end = (rect.x + rect.width).min(self.size);
        let y_end = (rect.y + rect.height).min(self.size);
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                let offset = self.offset(x, y);
                self.cells[offset] = true;
            }
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// Draws uniform top-left corners for a `side` square until one is free.
    pub fn find_random_free<R: Rng>(
        &self,
        side: u32,
        attempts: usize,
        rng: &mut R,
    ) -> Option<Position> {
        if side == 0 || side > self.size {
            return None;
        }
        let max = self.size - side;
        for _ in 0..attempts {
            let pos = Position::new(rng.gen_range(0..=max), rng.gen_range(0..=max));
            if self.is_free(&Rect::square(pos, side)) {
                return Some(pos);
            }
        }
        None
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.size as usize + x as usize
    }
}
