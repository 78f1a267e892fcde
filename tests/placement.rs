use urban_thermal::{
    block::{Block, BlockType},
    entity::ItemKind,
    map::add_items_to_blocks,
    rng::{RngManager, PLACEMENT_STREAM},
    scenario::ScenarioLoader,
    spatial::Position,
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn assert_layout_is_sound(block: &Block) {
    let size = block.size();
    let items = block.items();
    for (i, item) in items.iter().enumerate() {
        let rect = item.footprint();
        assert!(
            rect.x + rect.width <= size && rect.y + rect.height <= size,
            "item {i} of block {} leaves the block",
            block.block_number()
        );
        for other in &items[i + 1..] {
            assert!(
                !rect.intersects(&other.footprint()),
                "overlapping items in block {}",
                block.block_number()
            );
        }
    }
    let covered: u64 = items.iter().map(|item| item.footprint().area()).sum();
    assert_eq!(block.occupancy().occupied_count() as u64, covered);
}

#[test]
fn generated_town_respects_block_rules() {
    let scenario = scenario_loader()
        .load("scenarios/small_town.yaml")
        .expect("scenario should load");
    let (map, report) = scenario
        .build_map(&mut RngManager::new(scenario.seed))
        .expect("map builds");

    assert_eq!(map.blocks().len(), 12);
    assert_eq!(map.block_size(), 86);
    for block in map.blocks() {
        assert_layout_is_sound(block);
        assert!(block.count(ItemKind::House) <= block.max_houses());
        assert!(block.count(ItemKind::Tree) <= block.max_trees());
        match block.block_type() {
            BlockType::Yard => assert_eq!(block.count(ItemKind::Tree), 0),
            BlockType::Ground => assert_eq!(block.count(ItemKind::House), 0),
            BlockType::River => assert!(block.items().is_empty()),
        }
    }

    let houses: usize = map.blocks().iter().map(|b| b.count(ItemKind::House)).sum();
    let trees: usize = map.blocks().iter().map(|b| b.count(ItemKind::Tree)).sum();
    assert_eq!(houses, report.houses_placed);
    assert_eq!(trees, report.trees_placed);
    assert!(report.houses_placed <= report.houses_requested);
    assert!(report.trees_placed <= report.trees_requested);
    assert!(report.houses_requested <= report.house_capacity);
    assert!(report.trees_requested <= report.tree_capacity);
}

#[test]
fn saturated_yard_reports_shortfall() {
    let scenario = scenario_loader()
        .load("scenarios/crowded_yard.yaml")
        .expect("scenario should load");
    let (map, report) = scenario
        .build_map(&mut RngManager::new(scenario.seed))
        .expect("map builds");

    let yard = &map.blocks()[0];
    assert_eq!(yard.max_houses(), 9);
    // 40 asked for, only 9 could ever fit
    assert_eq!(scenario.houses, 40);
    assert_eq!(report.houses_requested, 9);
    assert_eq!(report.trees_requested, 0);
    assert_eq!(report.tree_shortfall(), 0);
    assert!(report.houses_placed > 0);
    assert!(report.houses_placed <= yard.max_houses());
    // roads leave a 40 px interior, room for four 15 px houses at most
    assert!(report.houses_placed <= 4);
    assert!(report.house_shortfall() > 0);
    assert_eq!(report.houses_placed, yard.count(ItemKind::House));
    // no ground block to host trees
    assert_eq!(report.tree_capacity, 0);
    assert_eq!(report.trees_placed, 0);
    assert_layout_is_sound(yard);
}

#[test]
fn allocation_only_touches_eligible_blocks() {
    let mut blocks = vec![
        Block::new(40, Position::new(0, 0), BlockType::River, 0).unwrap(),
        Block::new(40, Position::new(40, 0), BlockType::Ground, 1).unwrap(),
        Block::new(40, Position::new(80, 0), BlockType::River, 2).unwrap(),
    ];
    let mut rng = RngManager::new(5);
    let (houses, trees) = add_items_to_blocks(
        &mut blocks,
        3,
        12,
        &mut rng.stream(PLACEMENT_STREAM),
    );
    assert_eq!(houses, 0);
    assert_eq!(trees, 12);
    assert!(blocks[0].items().is_empty());
    assert!(blocks[2].items().is_empty());
    assert_eq!(blocks[1].count(ItemKind::Tree), 12);
}

#[test]
fn same_seed_gives_same_town() {
    let scenario = scenario_loader()
        .load("scenarios/small_town.yaml")
        .unwrap();
    let (first, _) = scenario.build_map(&mut RngManager::new(99)).unwrap();
    let (second, _) = scenario.build_map(&mut RngManager::new(99)).unwrap();
    let (other, _) = scenario.build_map(&mut RngManager::new(100)).unwrap();
    assert_eq!(first.rgb_image(), second.rgb_image());
    assert_ne!(first.rgb_image(), other.rgb_image());
}
