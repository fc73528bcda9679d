use super::geo::bounds;
use super::items::{Feature, Location, ParsedCollection, Properties, Ring};
use log::{debug, warn};
use rayon::prelude::*;
use serde_json::Value;
use std::sync::Arc;

/// Reasons a single source feature is dropped.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FeatureError {
    #[error("expected an array of {0}")]
    NotAnArray(&'static str),
    #[error("coordinate pair has {0} values, need at least 2")]
    ShortPair(usize),
    #[error("coordinate value {0} is not a number")]
    NonNumeric(String),
}

fn as_array<'a>(value: &'a Value, what: &'static str) -> Result<&'a Vec<Value>, FeatureError> {
    value.as_array().ok_or(FeatureError::NotAnArray(what))
}

/// `[lon, lat, (alt)]` into a location, the altitude is ignored.
fn parse_position(value: &Value) -> Result<Location, FeatureError> {
    let pair = as_array(value, "positions")?;
    if pair.len() < 2 {
        return Err(FeatureError::ShortPair(pair.len()));
    }
    let number = |v: &Value| v.as_f64().ok_or_else(|| FeatureError::NonNumeric(v.to_string()));
    let lon = number(&pair[0])?;
    let lat = number(&pair[1])?;
    Ok(Location { lat, lon })
}

fn parse_ring(value: &Value) -> Result<Ring, FeatureError> {
    as_array(value, "rings")?.iter().map(parse_position).collect()
}

/// Rings of one polygon, `None` if the outer ring holds no points.
pub fn parse_polygon(value: &Value) -> Result<Option<Vec<Ring>>, FeatureError> {
    let rings = as_array(value, "polygons")?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<Ring>, _>>()?;
    match rings.first() {
        Some(outer) if !outer.is_empty() => Ok(Some(rings)),
        _ => Ok(None),
    }
}

fn parse_multi_polygon(value: &Value) -> Result<Vec<Vec<Ring>>, FeatureError> {
    let parts = as_array(value, "multi polygons")?
        .iter()
        .map(parse_polygon)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.into_iter().flatten().collect())
}

fn get_properties(feature: &Value) -> Properties {
    feature
        .get("properties")
        .and_then(Value::as_object)
        .map(Properties::from)
        .unwrap_or_default()
}

/// Polygon parts of a single source feature.
///
/// Unsupported geometries yield no parts, malformed coordinates an error.
fn normalize_feature(index: usize, feature: &Value) -> Result<Vec<Feature>, FeatureError> {
    let geometry = match feature.get("geometry") {
        Some(geometry) if !geometry.is_null() => geometry,
        _ => {
            debug!("feature {} has no geometry, skipping", index);
            return Ok(vec![]);
        }
    };
    let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);
    let parts = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => parse_polygon(coordinates)?.into_iter().collect(),
        Some("MultiPolygon") => parse_multi_polygon(coordinates)?,
        other => {
            debug!("feature {} has unsupported geometry {:?}, skipping", index, other);
            return Ok(vec![]);
        }
    };
    let properties = Arc::new(get_properties(feature));
    let features = parts
        .into_iter()
        .map(|rings| Feature::new(index, rings, properties.clone()))
        .collect();
    Ok(features)
}

/// Turns a `FeatureCollection`-shaped value into basins with padded bounds.
///
/// Features are dropped one by one when their geometry isn't usable; the
/// collection as a whole never fails.
pub fn normalize(value: &Value) -> ParsedCollection {
    let source: &[Value] = value
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let features: Vec<Feature> = source
        .par_iter()
        .enumerate()
        .map(|(index, feature)| {
            normalize_feature(index, feature).unwrap_or_else(|err| {
                warn!("dropping feature {}: {}", index, err);
                vec![]
            })
        })
        .collect::<Vec<Vec<Feature>>>()
        .into_iter()
        .flatten()
        .collect();

    debug!(
        "normalized {} source features into {} parts",
        source.len(),
        features.len()
    );
    let bounds = bounds(&features);
    ParsedCollection { features, bounds }
}
