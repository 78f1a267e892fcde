use approx::assert_relative_eq;
use urban_thermal::{
    block::BlockType,
    entity::ItemKind,
    map::CityMap,
    rng::{RngManager, PLACEMENT_STREAM},
    spatial::{MapShape, Position},
    thermal::ThermalItem,
};

#[test]
fn yard_with_roads_peaks_at_two_pm() {
    let mut map = CityMap::new(MapShape::new(1, 1), 20, &[BlockType::Yard]).unwrap();
    map.add_roads().unwrap();

    map.update_temperatures(14.0);
    let image = map.thermal_image();
    assert_relative_eq!(image.get(10, 10).unwrap(), 28.8, epsilon = 1e-9);
    assert_relative_eq!(image.get(0, 0).unwrap(), 35.4, epsilon = 1e-9);

    map.update_temperatures(2.0);
    let image = map.thermal_image();
    assert_relative_eq!(image.get(10, 10).unwrap(), 19.2, epsilon = 1e-9);
    assert_relative_eq!(image.get(0, 0).unwrap(), 23.6, epsilon = 1e-9);
}

#[test]
fn house_blends_with_its_yard() {
    let mut map = CityMap::new(MapShape::new(1, 1), 50, &[BlockType::Yard]).unwrap();
    let mut rng = RngManager::new(1);
    let placed = map.blocks_mut()[0].add_item(
        ItemKind::House,
        Some(Position::new(20, 20)),
        &mut rng.stream(PLACEMENT_STREAM),
    );
    assert!(placed);
    map.update_temperatures(14.0);
    let image = map.thermal_image();
    // mean (19 + 24) / 2 plus a 20% swing
    assert_relative_eq!(image.get(25, 25).unwrap(), 21.5 * 1.2, epsilon = 1e-9);
    assert_relative_eq!(image.get(5, 5).unwrap(), 24.0 * 1.2, epsilon = 1e-9);
}

#[test]
fn temperatures_repeat_every_day() {
    let item = ThermalItem::new(16.0, 28.0);
    for hour in [0.0, 3.5, 9.0, 14.0, 20.25] {
        assert_relative_eq!(
            item.temperature_at(hour),
            item.temperature_at(hour + 24.0),
            epsilon = 1e-9
        );
    }
    assert_relative_eq!(item.temperature_at(14.0), 22.0 * 1.2, epsilon = 1e-9);
    assert_relative_eq!(item.temperature_at(8.0), 22.0, epsilon = 1e-9);
}

#[test]
fn empty_river_is_uniform() {
    let mut map = CityMap::new(MapShape::new(1, 2), 10, &[BlockType::River; 2]).unwrap();
    map.add_roads().unwrap();
    map.update_temperatures(2.0);
    let stats = map.thermal_image().stats().unwrap();
    assert_relative_eq!(stats.min, 8.0, epsilon = 1e-9);
    assert_relative_eq!(stats.max, 8.0, epsilon = 1e-9);
    assert_relative_eq!(stats.mean, 8.0, epsilon = 1e-9);
}
