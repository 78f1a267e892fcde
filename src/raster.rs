//! Pixel buffers handed to the renderer

use serde::Serialize;

use crate::spatial::{Position, Rect};
use crate::thermal::ThermalStats;

pub type Rgb = [u8; 3];

pub const GREY: Rgb = [128, 128, 128];
pub const BROWN: Rgb = [153, 76, 0];
pub const BLUE: Rgb = [0, 0, 255];
pub const GREEN: Rgb = [0, 255, 0];
pub const YELLOW: Rgb = [255, 255, 0];
pub const BLACK: Rgb = [0, 0, 0];

/// Row-major `height x width x 3` byte image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbBuffer {
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    /// Paints `rect`, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: &Rect, color: Rgb) {
        let x_end = (rect.x + rect.width).min(self.width);
        let y_end = (rect.y + rect.height).min(self.height);
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                let offset = self.offset(x, y);
                self.data[offset..offset + 3].copy_from_slice(&color);
            }
        }
    }

    /// Copies `other` with its top-left corner at `at`, clipped to the buffer.
    pub fn blit(&mut self, other: &RgbBuffer, at: Position) {
        for y in 0..other.height {
            let ty = at.y + y;
            if ty >= self.height {
                break;
            }
            let cols = other.width.min(self.width.saturating_sub(at.x));
            if cols == 0 {
                break;
            }
            let src = other.offset(0, y);
            let dst = self.offset(at.x, ty);
            let len = cols as usize * 3;
            self.data[dst..dst + len].copy_from_slice(&other.data[src..src + len]);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

/// Row-major `height x width` temperature image in °C.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalBuffer {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl ThermalBuffer {
    pub fn filled(width: u32, height: u32, temp: f64) -> Self {
        Self {
            width,
            height,
            data: vec![temp; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[self.offset(x, y)])
    }

    pub fn fill_rect(&mut self, rect: &Rect, temp: f64) {
        let x_end = (rect.x + rect.width).min(self.width);
        let y_end = (rect.y + rect.height).min(self.height);
        for y in rect.y..y_end {
            let start = self.offset(rect.x.min(x_end), y);
            let end = self.offset(x_end, y);
            self.data[start..end].fill(temp);
        }
    }

    pub fn blit(&mut self, other: &ThermalBuffer, at: Position) {
        for y in 0..other.height {
            let ty = at.y + y;
            if ty >= self.height {
                break;
            }
            let cols = other.width.min(self.width.saturating_sub(at.x)) as usize;
            if cols == 0 {
                break;
            }
            let src = other.offset(0, y);
            let dst = self.offset(at.x, ty);
            self.data[dst..dst + cols].copy_from_slice(&other.data[src..src + cols]);
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn stats(&self) -> Option<ThermalStats> {
        ThermalStats::from_values(&self.data)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_is_clipped() {
        let mut image = RgbBuffer::filled(4, 4, GREY);
        image.fill_rect(&Rect::square(Position::new(2, 2), 5), BLACK);
        assert_eq!(image.pixel(1, 1), Some(GREY));
        assert_eq!(image.pixel(3, 3), Some(BLACK));
        assert_eq!(image.pixel(4, 0), None);
        assert_eq!(image.as_bytes().len(), 4 * 4 * 3);
    }

    #[test]
    fn blit_places_tile_at_offset() {
        let mut map = ThermalBuffer::filled(6, 4, 0.0);
        let tile = ThermalBuffer::filled(3, 2, 21.5);
        map.blit(&tile, Position::new(3, 2));
        assert_eq!(map.get(2, 2), Some(0.0));
        assert_eq!(map.get(3, 2), Some(21.5));
        assert_eq!(map.get(5, 3), Some(21.5));
        assert_eq!(map.get(5, 1), Some(0.0));
    }

    #[test]
    fn thermal_fill_rect_marks_rows() {
        let mut buffer = ThermalBuffer::filled(5, 5, 10.0);
        buffer.fill_rect(&Rect::new(Position::new(1, 0), 3, 2), 30.0);
        assert_eq!(buffer.get(0, 0), Some(10.0));
        assert_eq!(buffer.get(3, 1), Some(30.0));
        assert_eq!(buffer.get(4, 1), Some(10.0));
        assert_eq!(buffer.get(1, 2), Some(10.0));
    }
}
