//! City map assembly: block layout, road network and item allocation

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::{Block, BlockType, MIN_BLOCK_SIZE};
use crate::entity::ItemKind;
use crate::error::MapError;
use crate::raster::{RgbBuffer, ThermalBuffer, BLACK};
use crate::spatial::{MapShape, Position, Side};
use crate::thermal::ThermalStats;

/// Pixels of the whole canvas that the blocks share.
pub const TOTAL_PIXELS: u32 = 300 * 300;
pub const MAX_BLOCK_SIZE: u32 = 100;

/// Side of a square block when `num_blocks` blocks share the canvas.
pub fn calculate_block_size(num_blocks: usize) -> u32 {
    if num_blocks == 0 {
        return MAX_BLOCK_SIZE;
    }
    let pixels_per_block = TOTAL_PIXELS as usize / num_blocks;
    let side = (pixels_per_block as f64).sqrt() as u32;
    side.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE)
}

/// Total house capacity of the Yard blocks and tree capacity of the Ground blocks.
pub fn calculate_max_items(blocks: &[Block]) -> (usize, usize) {
    let houses = blocks
        .iter()
        .filter(|b| b.block_type() == BlockType::Yard)
        .map(Block::max_houses)
        .sum();
    let trees = blocks
        .iter()
        .filter(|b| b.block_type() == BlockType::Ground)
        .map(Block::max_trees)
        .sum();
    (houses, trees)
}

/// Gives every non-River block a road on each side that faces the map
/// boundary or a non-River neighbor. Returns the number of roads laid.
pub fn add_roads_to_blocks(blocks: &mut [Block], shape: MapShape) -> Result<usize, MapError> {
    if blocks.len() != shape.block_count() {
        return Err(MapError::ShapeMismatch {
            blocks: blocks.len(),
            rows: shape.rows,
            cols: shape.cols,
        });
    }
    let types: Vec<BlockType> = blocks.iter().map(Block::block_type).collect();
    let mut laid = 0;
    for (index, block) in blocks.iter_mut().enumerate() {
        if !block.block_type().hosts_roads() {
            continue;
        }
        for side in Side::ALL {
            let open = match shape.neighbor(index, side) {
                None => true,
                Some(neighbor) => types[neighbor] != BlockType::River,
            };
            if open && block.add_road(side) {
                laid += 1;
            }
        }
    }
    debug!(roads = laid, "road network laid");
    Ok(laid)
}

/// Spreads `num_houses` over Yard blocks and `num_trees` over Ground blocks.
/// Returns how many of each were actually placed.
pub fn add_items_to_blocks<R: Rng>(
    blocks: &mut [Block],
    num_houses: usize,
    num_trees: usize,
    rng: &mut R,
) -> (usize, usize) {
    let houses = allocate(blocks, ItemKind::House, num_houses, rng);
    let trees = allocate(blocks, ItemKind::Tree, num_trees, rng);
    (houses, trees)
}

fn allocate<R: Rng>(blocks: &mut [Block], kind: ItemKind, requested: usize, rng: &mut R) -> usize {
    let mut pool: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| block.block_type().hosts(kind))
        .map(|(index, _)| index)
        .collect();
    let mut placed = 0;
    while placed < requested && !pool.is_empty() {
        let pick = rng.gen_range(0..pool.len());
        let block = &mut blocks[pool[pick]];
        if block.add_item(kind, None, rng) {
            placed += 1;
        } else {
            debug!(block = block.block_number(), %kind, "block saturated");
            pool.swap_remove(pick);
        }
    }
    placed
}

/// Number of blocks of each type in a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDistribution {
    pub yards: usize,
    pub grounds: usize,
    pub rivers: usize,
}

impl BlockDistribution {
    pub fn total(&self) -> usize {
        self.yards + self.grounds + self.rivers
    }

    pub fn block_types(&self) -> Vec<BlockType> {
        let mut types = Vec::with_capacity(self.total());
        types.extend(std::iter::repeat(BlockType::Yard).take(self.yards));
        types.extend(std::iter::repeat(BlockType::Ground).take(self.grounds));
        types.extend(std::iter::repeat(BlockType::River).take(self.rivers));
        types
    }
}

/// Requested and placed item counts from one allocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub houses_requested: usize,
    pub houses_placed: usize,
    pub trees_requested: usize,
    pub trees_placed: usize,
    pub house_capacity: usize,
    pub tree_capacity: usize,
}

impl AllocationReport {
    pub fn house_shortfall(&self) -> usize {
        self.houses_requested.saturating_sub(self.houses_placed)
    }

    pub fn tree_shortfall(&self) -> usize {
        self.trees_requested.saturating_sub(self.trees_placed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub number: usize,
    pub block_type: BlockType,
    pub topleft: Position,
    pub houses: usize,
    pub trees: usize,
    pub roads: usize,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub scenario: String,
    pub frame: u64,
    pub hour: f64,
    pub stats: Option<ThermalStats>,
    pub blocks: Vec<BlockSnapshot>,
}

#[derive(Debug, Clone)]
pub struct CityMap {
    shape: MapShape,
    block_size: u32,
    blocks: Vec<Block>,
}

impl CityMap {
    /// Lays out blocks in row-major order, one per entry of `types`.
    pub fn new(shape: MapShape, block_size: u32, types: &[BlockType]) -> Result<Self, MapError> {
        if types.len() != shape.block_count() {
            return Err(MapError::ShapeMismatch {
                blocks: types.len(),
                rows: shape.rows,
                cols: shape.cols,
            });
        }
        let mut blocks = Vec::with_capacity(types.len());
        for (index, block_type) in types.iter().enumerate() {
            let topleft = shape.topleft(index, block_size).ok_or(MapError::ShapeMismatch {
                blocks: types.len(),
                rows: shape.rows,
                cols: shape.cols,
            })?;
            blocks.push(Block::new(block_size, topleft, *block_type, index)?);
        }
        Ok(Self {
            shape,
            block_size,
            blocks,
        })
    }

    /// Lays out the block types of `distribution` in a random order.
    pub fn shuffled<R: Rng>(
        shape: MapShape,
        block_size: u32,
        distribution: BlockDistribution,
        rng: &mut R,
    ) -> Result<Self, MapError> {
        let mut types = distribution.block_types();
        types.shuffle(rng);
        Self::new(shape, block_size, &types)
    }

    pub fn shape(&self) -> MapShape {
        self.shape
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn width(&self) -> u32 {
        self.shape.cols as u32 * self.block_size
    }

    pub fn height(&self) -> u32 {
        self.shape.rows as u32 * self.block_size
    }

    pub fn add_roads(&mut self) -> Result<usize, MapError> {
        add_roads_to_blocks(&mut self.blocks, self.shape)
    }

    pub fn max_items(&self) -> (usize, usize) {
        calculate_max_items(&self.blocks)
    }

    pub fn populate<R: Rng>(
        &mut self,
        num_houses: usize,
        num_trees: usize,
        rng: &mut R,
    ) -> AllocationReport {
        let (house_capacity, tree_capacity) = self.max_items();
        let (houses_placed, trees_placed) =
            add_items_to_blocks(&mut self.blocks, num_houses, num_trees, rng);
        let report = AllocationReport {
            houses_requested: num_houses,
            houses_placed,
            trees_requested: num_trees,
            trees_placed,
            house_capacity,
            tree_capacity,
        };
        if report.house_shortfall() > 0 {
            warn!(
                placed = houses_placed,
                requested = num_houses,
                "only {houses_placed} houses could be added due to space limitations"
            );
        }
        if report.tree_shortfall() > 0 {
            warn!(
                placed = trees_placed,
                requested = num_trees,
                "only {trees_placed} trees could be added due to space limitations"
            );
        }
        report
    }

    pub fn update_temperatures(&mut self, hour: f64) {
        for block in &mut self.blocks {
            block.update_temperatures(hour);
        }
    }

    pub fn rgb_image(&self) -> RgbBuffer {
        let mut image = RgbBuffer::filled(self.width(), self.height(), BLACK);
        for block in &self.blocks {
            image.blit(&block.generate_rgb_view(), block.topleft());
        }
        image
    }

    pub fn thermal_image(&self) -> ThermalBuffer {
        let mut image = ThermalBuffer::filled(self.width(), self.height(), 0.0);
        for block in &self.blocks {
            image.blit(&block.generate_thermal_view(), block.topleft());
        }
        image
    }

    pub fn snapshot(&self, scenario: &str, frame: u64, hour: f64) -> FrameSnapshot {
        let blocks = self
            .blocks
            .iter()
            .map(|block| BlockSnapshot {
                number: block.block_number(),
                block_type: block.block_type(),
                topleft: block.topleft(),
                houses: block.count(ItemKind::House),
                trees: block.count(ItemKind::Tree),
                roads: block.road_count(),
                temperature: block.current_temp(),
            })
            .collect();
        FrameSnapshot {
            scenario: scenario.to_string(),
            frame,
            hour,
            stats: self.thermal_image().stats(),
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn block_size_is_clamped() {
        assert_eq!(calculate_block_size(1), 100);
        assert_eq!(calculate_block_size(9), 100);
        assert_eq!(calculate_block_size(12), 86);
        assert_eq!(calculate_block_size(36), 50);
        assert_eq!(calculate_block_size(5_000), 10);
    }

    #[test]
    fn distribution_expands_in_type_order() {
        let distribution = BlockDistribution {
            yards: 2,
            grounds: 1,
            rivers: 1,
        };
        assert_eq!(
            distribution.block_types(),
            vec![
                BlockType::Yard,
                BlockType::Yard,
                BlockType::Ground,
                BlockType::River
            ]
        );
    }

    #[test]
    fn blocks_are_placed_row_major() {
        let types = [BlockType::Yard; 6];
        let map = CityMap::new(MapShape::new(2, 3), 20, &types).unwrap();
        assert_eq!(map.width(), 60);
        assert_eq!(map.height(), 40);
        assert_eq!(map.blocks()[4].topleft(), Position::new(20, 20));
        assert_eq!(map.blocks()[4].block_number(), 4);
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let types = [BlockType::Yard; 5];
        let err = CityMap::new(MapShape::new(2, 3), 20, &types).unwrap_err();
        assert_eq!(
            err,
            MapError::ShapeMismatch {
                blocks: 5,
                rows: 2,
                cols: 3
            }
        );
    }

    #[test]
    fn shuffle_keeps_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let distribution = BlockDistribution {
            yards: 3,
            grounds: 2,
            rivers: 1,
        };
        let map = CityMap::shuffled(MapShape::new(2, 3), 20, distribution, &mut rng).unwrap();
        let count = |t: BlockType| map.blocks().iter().filter(|b| b.block_type() == t).count();
        assert_eq!(count(BlockType::Yard), 3);
        assert_eq!(count(BlockType::Ground), 2);
        assert_eq!(count(BlockType::River), 1);
    }

    #[test]
    fn max_items_sum_eligible_blocks() {
        let types = [BlockType::Yard, BlockType::Ground, BlockType::River, BlockType::Yard];
        let map = CityMap::new(MapShape::new(2, 2), 100, &types).unwrap();
        assert_eq!(map.max_items(), (18, 100));
    }

    #[test]
    fn snapshot_reports_blocks() {
        let types = [BlockType::Yard, BlockType::River];
        let mut map = CityMap::new(MapShape::new(1, 2), 20, &types).unwrap();
        map.add_roads().unwrap();
        map.update_temperatures(14.0);
        let snapshot = map.snapshot("tiny", 3, 14.0);
        assert_eq!(snapshot.frame, 3);
        assert_eq!(snapshot.blocks.len(), 2);
        assert_eq!(snapshot.blocks[0].roads, 3);
        assert_eq!(snapshot.blocks[1].roads, 0);
        let stats = snapshot.stats.unwrap();
        assert_eq!(stats.min, 12.0);
    }
}
