use super::items::{Feature, Properties};
use serde::Serialize;

#[derive(Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

fn get_coordinates(feature: &Feature) -> Vec<Vec<[f64; 2]>> {
    feature
        .rings
        .iter()
        .map(|ring| ring.iter().map(|&loc| loc.into()).collect())
        .collect()
}

impl From<&Feature> for Geometry {
    fn from(feature: &Feature) -> Self {
        Geometry::Polygon {
            coordinates: get_coordinates(feature),
        }
    }
}

/// A single part stays a `Polygon`, several parts form a `MultiPolygon`.
impl From<&[Feature]> for Geometry {
    fn from(parts: &[Feature]) -> Self {
        match parts {
            [part] => part.into(),
            _ => Geometry::MultiPolygon {
                coordinates: parts.iter().map(get_coordinates).collect(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub enum Entity<'a, S: Serialize> {
    Feature {
        properties: &'a Properties,
        geometry: Geometry,
    },
    FeatureCollection {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        statistics: Option<S>,
        features: Vec<Entity<'a, S>>,
    },
}

impl<'a, S: Serialize> Entity<'a, S> {
    /// One feature for all parts of a basin, `None` without any part.
    pub fn from_parts(parts: &'a [Feature]) -> Option<Self> {
        let first = parts.first()?;
        Some(Entity::Feature {
            properties: first.properties.as_ref(),
            geometry: parts.into(),
        })
    }
}

impl<'a, S: Serialize> From<&'a Feature> for Entity<'a, S> {
    fn from(feature: &'a Feature) -> Self {
        Entity::Feature {
            properties: feature.properties.as_ref(),
            geometry: feature.into(),
        }
    }
}
