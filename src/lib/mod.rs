//! Geospatial engine for post-wildfire debris-flow basins.
//!
//! A GeoJSON payload of sub-basins is normalized once into a
//! [`ParsedCollection`]; the collection is then used to frame a map
//! ([`ParsedCollection::bounds`]), to color basins by [`HazardTier`], to
//! resolve taps ([`hit_test`]) and to summarize a user drawn area
//! ([`filter_by_polygon`]).
//!
//! # Example
//!
//! ```
//! use basin_hazard::{filter_by_polygon, from_str, HazardTier, Location, QueryPolygon};
//!
//! let collection = from_str(r#"{
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]},
//!         "properties": {"P_3": 0.8, "Area_km2": 0.5}
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(collection.select(&Location::new(0.5, 0.5)), Some(0));
//! assert_eq!(collection.features[0].hazard().tier, HazardTier::High);
//!
//! let query = QueryPolygon::new(vec![
//!     Location::new(0.5, 0.5),
//!     Location::new(0.5, 2.),
//!     Location::new(2., 2.),
//! ]);
//! let result = filter_by_polygon(&query, &collection.features).unwrap();
//! assert_eq!(result.stats.count, 1);
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

mod geo;
mod geojson;
pub mod hazard;
mod index;
mod items;
mod normalize;
pub mod output;
mod query;
#[cfg(test)]
mod test_helpers;

pub use self::geo::{bounds, BoundingBox, BOUNDS_PADDING};
pub use self::hazard::{
    classify, classify_class, classify_class_value, classify_value, rank_by_hazard,
    Classification, HazardDistribution, HazardTier, RainfallScenario,
};
pub use self::index::FeatureIndex;
pub use self::items::{
    Feature, Location, ParsedCollection, Properties, PropertyValue, Ring, AREA_KEY, LABEL_KEYS,
};
pub use self::normalize::{normalize, FeatureError};
pub use self::query::{
    filter_by_polygon, hit_test, ring_contains, FilterResult, FilterStats, QueryError,
    QueryPolygon,
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses a GeoJSON document. Only a document which isn't JSON at all fails.
pub fn from_str(geojson: &str) -> Result<ParsedCollection, ParseError> {
    let value = serde_json::from_str(geojson)?;
    Ok(normalize(&value))
}

pub fn from_reader(reader: impl Read) -> Result<ParsedCollection, ParseError> {
    let value = serde_json::from_reader(reader)?;
    Ok(normalize(&value))
}

pub fn from_path(path: impl AsRef<Path>) -> Result<ParsedCollection, ParseError> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file))
}

#[cfg(test)]
mod from_str {
    use super::*;

    #[test]
    fn not_json() {
        assert!(matches!(from_str("{\"features\": ["), Err(ParseError::Json(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            from_path("./does/not/exist.geojson"),
            Err(ParseError::Io(_))
        ));
    }

    #[test]
    fn json_that_isnt_a_collection() {
        let collection = from_str("42").unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.bounds, None);
    }
}
