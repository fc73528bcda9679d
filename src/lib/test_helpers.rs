use super::items::{Feature, Location, Properties, PropertyValue, Ring};
use std::sync::Arc;

/// Feature from `(lat, lon)` tuples without any properties.
pub fn create_feature(index: usize, rings: Vec<Vec<(f64, f64)>>) -> Feature {
    let rings = rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|(lat, lon)| Location::new(lat, lon))
                .collect()
        })
        .collect();
    Feature::new(index, rings, Arc::new(Properties::new()))
}

/// Open square ring with its south-west corner at `(lat, lon)`.
pub fn square(lat: f64, lon: f64, size: f64) -> Ring {
    vec![
        Location::new(lat, lon),
        Location::new(lat, lon + size),
        Location::new(lat + size, lon + size),
        Location::new(lat + size, lon),
    ]
}

pub fn create_basin(index: usize, rings: Vec<Ring>, p3: f64, area: f64) -> Feature {
    let mut properties = Properties::new();
    properties.insert("P_3", PropertyValue::Number(p3));
    properties.insert("Area_km2", PropertyValue::Number(area));
    Feature::new(index, rings, Arc::new(properties))
}

/// Parts of one `MultiPolygon` basin, sharing index and properties.
pub fn create_multi_basin(index: usize, parts: Vec<Vec<Ring>>, p3: f64, area: f64) -> Vec<Feature> {
    let mut properties = Properties::new();
    properties.insert("P_3", PropertyValue::Number(p3));
    properties.insert("Area_km2", PropertyValue::Number(area));
    let properties = Arc::new(properties);
    parts
        .into_iter()
        .map(|rings| Feature::new(index, rings, properties.clone()))
        .collect()
}
