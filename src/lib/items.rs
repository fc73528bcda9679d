use super::geo::BoundingBox;
use geo_types::Coord;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smartstring::alias::String;
use std::sync::Arc;

/// Keys probed in order when deriving a human readable label for a basin.
pub const LABEL_KEYS: [&str; 5] = ["Segment_ID", "segment_id", "BasinID", "id", "name"];

pub const AREA_KEY: &str = "Area_km2";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Location { lat, lon }
    }
}

impl From<Location> for [f64; 2] {
    fn from(loc: Location) -> Self {
        [loc.lon, loc.lat]
    }
}

impl From<Location> for Coord<f64> {
    fn from(loc: Location) -> Self {
        Coord {
            x: loc.lon,
            y: loc.lat,
        }
    }
}

impl From<Coord<f64>> for Location {
    fn from(coordinate: Coord<f64>) -> Self {
        Location {
            lat: coordinate.y,
            lon: coordinate.x,
        }
    }
}

pub type Ring = Vec<Location>;

/// A single attribute value of a basin.
///
/// Scalars are kept as typed values, nested arrays or objects are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Json(Value),
}

impl PropertyValue {
    /// Best-effort numeric coercion: numbers as-is, numeric strings parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(number) => Some(*number),
            PropertyValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    fn display(&self) -> Option<std::string::String> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Bool(b) => Some(b.to_string()),
            PropertyValue::Number(n) => Some(n.to_string()),
            PropertyValue::Text(t) => Some(t.to_string()),
            PropertyValue::Json(v) => Some(v.to_string()),
        }
    }
}

impl From<&Value> for PropertyValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map_or_else(|| PropertyValue::Json(value.clone()), PropertyValue::Number),
            Value::String(s) => PropertyValue::Text(s.as_str().into()),
            _ => PropertyValue::Json(value.clone()),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Null => serializer.serialize_none(),
            PropertyValue::Bool(b) => serializer.serialize_bool(*b),
            PropertyValue::Number(n) => serializer.serialize_f64(*n),
            PropertyValue::Text(t) => serializer.serialize_str(t),
            PropertyValue::Json(v) => v.serialize(serializer),
        }
    }
}

/// Attribute bag of a basin, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, keeping the position of an existing key.
    pub fn insert(&mut self, key: &str, value: PropertyValue) {
        match self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.into(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, value)| value)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&serde_json::Map<std::string::String, Value>> for Properties {
    fn from(map: &serde_json::Map<std::string::String, Value>) -> Self {
        // keys of a JSON object are already unique
        let entries: Vec<(String, PropertyValue)> = map
            .iter()
            .map(|(key, value)| (key.as_str().into(), value.into()))
            .collect();
        Properties { entries }
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// One polygon part of a basin.
///
/// `rings[0]` is the outer boundary, the remaining rings are holes. Parts of
/// the same `MultiPolygon` share `index` and `properties`.
#[derive(Debug, Clone)]
pub struct Feature {
    pub index: usize,
    pub rings: Vec<Ring>,
    pub properties: Arc<Properties>,
}

impl Feature {
    pub fn new(index: usize, rings: Vec<Ring>, properties: Arc<Properties>) -> Self {
        Feature {
            index,
            rings,
            properties,
        }
    }

    pub fn outer(&self) -> &[Location] {
        self.rings.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    pub fn points(&self) -> impl Iterator<Item = &Location> {
        self.rings.iter().flatten()
    }

    pub fn label(&self) -> std::string::String {
        LABEL_KEYS
            .iter()
            .find_map(|key| self.properties.get(key)?.display())
            .unwrap_or_else(|| format!("Basin {}", self.index))
    }

    /// Upstream area attribute, zero when missing or not a finite number.
    pub fn area_km2(&self) -> f64 {
        self.properties
            .get_f64(AREA_KEY)
            .filter(|area| area.is_finite())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCollection {
    pub features: Vec<Feature>,
    pub bounds: Option<BoundingBox>,
}

impl ParsedCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.features.iter().map(|f| f.points().count()).sum()
    }

    /// All parts which were expanded from the source feature at `index`.
    pub fn parts(&self, index: usize) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(move |f| f.index == index)
    }
}
