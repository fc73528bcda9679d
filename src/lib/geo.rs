use super::items::{Feature, Location};
use geo_types::{Coord, LineString, Polygon};
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Share of the raw span added on each side of a bounding box.
pub const BOUNDS_PADDING: f64 = 0.05;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Degenerate box around a single location.
    pub fn from_location(loc: Location) -> Self {
        BoundingBox {
            south: loc.lat,
            west: loc.lon,
            north: loc.lat,
            east: loc.lon,
        }
    }

    pub fn extend(&mut self, loc: &Location) {
        self.south = self.south.min(loc.lat);
        self.north = self.north.max(loc.lat);
        self.west = self.west.min(loc.lon);
        self.east = self.east.max(loc.lon);
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Grows the box by `ratio` of its span on every side.
    pub fn padded(&self, ratio: f64) -> Self {
        let lat_pad = self.lat_span() * ratio;
        let lon_pad = self.lon_span() * ratio;
        BoundingBox {
            south: self.south - lat_pad,
            west: self.west - lon_pad,
            north: self.north + lat_pad,
            east: self.east + lon_pad,
        }
    }

    pub fn sw_ne(&self) -> ([f64; 2], [f64; 2]) {
        ([self.west, self.south], [self.east, self.north])
    }

    pub fn center(&self) -> Location {
        Location {
            lat: (self.south + self.north) / 2.,
            lon: (self.west + self.east) / 2.,
        }
    }

    pub fn contains(&self, loc: &Location) -> bool {
        (self.south..=self.north).contains(&loc.lat) && (self.west..=self.east).contains(&loc.lon)
    }
}

impl From<&BoundingBox> for AABB<[f64; 2]> {
    fn from(bbox: &BoundingBox) -> Self {
        let (sw, ne) = bbox.sw_ne();
        AABB::from_corners(sw, ne)
    }
}

/// Tight box around the given locations, `None` if there are none.
pub fn raw_bounds<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Option<BoundingBox> {
    locations
        .into_iter()
        .fold(None, |acc: Option<BoundingBox>, loc| match acc {
            None => Some(BoundingBox::from_location(*loc)),
            Some(mut bbox) => {
                bbox.extend(loc);
                Some(bbox)
            }
        })
}

/// Padded frame around every point of every ring, holes included.
pub fn bounds(features: &[Feature]) -> Option<BoundingBox> {
    let raw = raw_bounds(features.iter().flat_map(Feature::points))?;
    Some(raw.padded(BOUNDS_PADDING))
}

fn line_string(ring: &[Location]) -> LineString<f64> {
    ring.iter().map(|&loc| Coord::from(loc)).collect()
}

/// Polygon in `geo` terms (x = lon, y = lat), holes kept as interiors.
pub fn to_polygon(rings: &[Vec<Location>]) -> Polygon<f64> {
    let exterior = rings.first().map(|r| line_string(r)).unwrap_or_else(|| LineString(vec![]));
    let interiors = rings.iter().skip(1).map(|r| line_string(r)).collect();
    Polygon::new(exterior, interiors)
}
