use super::geo::to_polygon;
use super::hazard::HazardDistribution;
use super::items::{Feature, Location, ParsedCollection, Ring};
use super::normalize::{parse_polygon, FeatureError};
use ::geo::Intersects;
use geo_types::Polygon;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryError {
    #[error("need at least 3 points, got {distinct}")]
    TooFewPoints { distinct: usize },
    #[error("invalid polygon, must be a GeoJSON Polygon geometry (got {0})")]
    NotAPolygon(String),
    #[error("invalid polygon coordinates: {0}")]
    Coordinates(#[from] FeatureError),
}

/// Even-odd ray casting against a single ring.
///
/// Each edge runs from `ring[i]` to its predecessor, the ring may be open or
/// closed.
pub fn ring_contains(ring: &[Location], point: &Location) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + n - 1) % n];
        if (a.lat > point.lat) != (b.lat > point.lat)
            && point.lon < (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
    }
    inside
}

/// Index of the first feature whose outer ring contains `point`.
///
/// Holes are not considered, a tap inside a hole still selects the basin.
pub fn hit_test(point: &Location, features: &[Feature]) -> Option<usize> {
    features
        .iter()
        .find(|feature| ring_contains(feature.outer(), point))
        .map(|feature| feature.index)
}

impl ParsedCollection {
    /// Source index of the tapped basin; all its parts are available via
    /// [`ParsedCollection::parts`].
    pub fn select(&self, point: &Location) -> Option<usize> {
        hit_test(point, &self.features)
    }
}

/// A user drawn analysis area.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPolygon {
    pub rings: Vec<Ring>,
}

fn distinct_points(ring: &[Location]) -> usize {
    // adding 0.0 folds -0.0 into 0.0
    ring.iter()
        .map(|loc| ((loc.lat + 0.).to_bits(), (loc.lon + 0.).to_bits()))
        .unique()
        .count()
}

impl QueryPolygon {
    pub fn new(outer: Ring) -> Self {
        QueryPolygon { rings: vec![outer] }
    }

    pub fn with_holes(outer: Ring, holes: Vec<Ring>) -> Self {
        let mut rings = vec![outer];
        rings.extend(holes);
        QueryPolygon { rings }
    }

    /// Reads a GeoJSON `Polygon` geometry, `[lon, lat]` ordered.
    pub fn from_geojson(geometry: &Value) -> Result<Self, QueryError> {
        match geometry.get("type").and_then(Value::as_str) {
            Some("Polygon") => {}
            other => {
                return Err(QueryError::NotAPolygon(
                    other.unwrap_or("nothing").to_string(),
                ))
            }
        }
        let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);
        let rings = parse_polygon(coordinates)?.unwrap_or_else(|| vec![vec![]]);
        Ok(QueryPolygon { rings })
    }

    pub fn outer(&self) -> &[Location] {
        self.rings.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Rejects areas with fewer than three distinct corners.
    pub fn validate(&self) -> Result<(), QueryError> {
        let distinct = distinct_points(self.outer());
        if distinct < 3 {
            return Err(QueryError::TooFewPoints { distinct });
        }
        Ok(())
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        to_polygon(&self.rings)
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct FilterStats {
    pub count: usize,
    pub total_area_km2: f64,
    pub distribution: HazardDistribution,
    pub mean_probability: f64,
}

/// Matched basins with every one of their parts, parts of a basin adjacent.
#[derive(Debug, Clone, Default)]
pub struct FilterResult {
    pub features: Vec<Feature>,
    pub stats: FilterStats,
}

impl FilterResult {
    /// The parts of each matched basin, one slice per source feature.
    pub fn basins(&self) -> Vec<&[Feature]> {
        let mut basins = vec![];
        let mut start = 0;
        for end in 1..=self.features.len() {
            if end == self.features.len() || self.features[end].index != self.features[start].index
            {
                basins.push(&self.features[start..end]);
                start = end;
            }
        }
        basins
    }
}

/// Sum in ascending order so the result doesn't depend on input order.
fn canonical_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Matches source basins against `query`.
///
/// A basin matches when any of its parts among `candidates` intersects the
/// query; it is then counted once, with every part it has in `features`.
pub(crate) fn filter_features<'a>(
    query: &Polygon<f64>,
    features: &'a [Feature],
    candidates: impl IntoIterator<Item = &'a Feature>,
) -> FilterResult {
    let mut matched = HashSet::new();
    for feature in candidates {
        if matched.contains(&feature.index) || feature.outer().is_empty() {
            continue;
        }
        if to_polygon(&feature.rings).intersects(query) {
            matched.insert(feature.index);
        }
    }

    let selected: Vec<&Feature> = features
        .iter()
        .filter(|feature| matched.contains(&feature.index))
        .collect();
    let mut parts = selected.iter().copied().into_group_map_by(|feature| feature.index);
    // parts of one basin end up next to each other, in order of first appearance
    let features: Vec<Feature> = selected
        .iter()
        .map(|feature| feature.index)
        .unique()
        .flat_map(|index| parts.remove(&index).unwrap_or_default())
        .cloned()
        .collect();

    let mut areas = vec![];
    let mut probabilities = vec![];
    let mut distribution = HazardDistribution::default();
    for basin in features.iter().unique_by(|feature| feature.index) {
        let hazard = basin.hazard();
        distribution.add(hazard.tier);
        probabilities.push(hazard.value);
        areas.push(basin.area_km2());
    }

    let count = probabilities.len();
    let mean_probability = if count == 0 {
        0.
    } else {
        canonical_sum(probabilities) / count as f64
    };
    let stats = FilterStats {
        count,
        total_area_km2: canonical_sum(areas),
        distribution,
        mean_probability,
    };
    FilterResult { features, stats }
}

/// Basins overlapping the query area, together with their statistics.
///
/// A basin matches on any overlap with its outer ring minus its holes; the
/// area attribute is summed as given, not recomputed.
pub fn filter_by_polygon(
    query: &QueryPolygon,
    features: &[Feature],
) -> Result<FilterResult, QueryError> {
    query.validate()?;
    Ok(filter_features(&query.to_polygon(), features, features))
}


#[cfg(test)]
mod filter_by_polygon {
    use super::*;
    use crate::hazard::HazardTier;
    use crate::test_helpers::{create_basin as basin, create_multi_basin as multi_basin, square};
    use approx::assert_relative_eq;
    use rand::seq::SliceRandom;
    use rand::thread_rng;
    use serde_json::json;

    fn three_basins() -> Vec<Feature> {
        vec![
            basin(0, vec![square(0., 0., 1.)], 0.8, 1.25),
            basin(1, vec![square(0., 2., 1.)], 0.5, 0.75),
            basin(2, vec![square(10., 10., 1.)], 0.1, 3.),
        ]
    }

    #[test]
    fn overlapping_first_two_basins() {
        let query = QueryPolygon::new(square(0.5, 0.5, 2.));
        let result = filter_by_polygon(&query, &three_basins()).unwrap();
        let stats = &result.stats;
        assert_eq!(stats.count, 2);
        assert_eq!(stats.distribution.get(HazardTier::High), 1);
        assert_eq!(stats.distribution.get(HazardTier::Moderate), 1);
        assert_eq!(stats.distribution.get(HazardTier::Low), 0);
        assert_eq!(stats.distribution.get(HazardTier::VeryLow), 0);
        assert_relative_eq!(stats.mean_probability, 0.65, epsilon = 1e-12);
        assert_relative_eq!(stats.total_area_km2, 2., epsilon = 1e-12);
        let indices: Vec<usize> = result.features.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    fn split_basin_and_neighbour() -> Vec<Feature> {
        let mut features = multi_basin(
            0,
            vec![vec![square(0., 0., 1.)], vec![square(0., 2., 1.)]],
            0.8,
            1.,
        );
        features.push(basin(1, vec![square(2., 0., 1.)], 0.2, 1.));
        features
    }

    #[test]
    fn multi_polygon_basin_counts_once() {
        let query = QueryPolygon::new(square(-1., -1., 5.));
        let result = filter_by_polygon(&query, &split_basin_and_neighbour()).unwrap();
        let stats = &result.stats;
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.total_area_km2, 2., epsilon = 1e-12);
        assert_relative_eq!(stats.mean_probability, 0.5, epsilon = 1e-12);
        assert_eq!(stats.distribution.get(HazardTier::High), 1);
        assert_eq!(stats.distribution.get(HazardTier::Low), 1);
        assert_eq!(stats.distribution.total(), 2);
        assert_eq!(result.features.len(), 3);
        let sizes: Vec<usize> = result.basins().iter().map(|parts| parts.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn one_overlapping_part_brings_the_whole_basin() {
        // touches the second part of basin 0 only
        let query = QueryPolygon::new(square(0.2, 2.2, 0.5));
        let result = filter_by_polygon(&query, &split_basin_and_neighbour()).unwrap();
        assert_eq!(result.stats.count, 1);
        assert_relative_eq!(result.stats.total_area_km2, 1., epsilon = 1e-12);
        assert_eq!(result.basins().len(), 1);
        assert_eq!(result.basins()[0].len(), 2);
    }

    #[test]
    fn multi_polygon_statistics_ignore_input_order() {
        let mut features = split_basin_and_neighbour();
        features.extend(multi_basin(
            2,
            vec![
                vec![square(3., 3., 1.)],
                vec![square(5., 0., 1.)],
                vec![square(50., 50., 1.)],
            ],
            0.45,
            0.3,
        ));
        let query = QueryPolygon::new(square(-1., -1., 7.));
        let reference = filter_by_polygon(&query, &features).unwrap().stats;
        assert_eq!(reference.count, 3);
        assert_eq!(reference.distribution.get(HazardTier::Moderate), 1);

        let mut rng = thread_rng();
        for _ in 0..10 {
            features.shuffle(&mut rng);
            let result = filter_by_polygon(&query, &features).unwrap();
            assert_eq!(result.stats, reference);
            assert_eq!(result.basins().len(), 3);
            assert_eq!(result.features.len(), 6);
        }
    }

    #[test]
    fn infinite_attributes_keep_statistics_finite() {
        let features = vec![
            basin(0, vec![square(0., 0., 1.)], f64::INFINITY, f64::INFINITY),
            basin(1, vec![square(0., 2., 1.)], f64::NEG_INFINITY, 1.),
        ];
        let query = QueryPolygon::new(square(-1., -1., 5.));
        let stats = filter_by_polygon(&query, &features).unwrap().stats;
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_probability, 0.);
        assert_eq!(stats.total_area_km2, 1.);
        assert_eq!(stats.distribution.get(HazardTier::VeryLow), 2);
    }

    #[test]
    fn overlap_without_shared_vertices() {
        // a thin horizontal bar crossing a thin vertical bar
        let basins = vec![basin(
            0,
            vec![vec![
                Location::new(-5., -0.1),
                Location::new(-5., 0.1),
                Location::new(5., 0.1),
                Location::new(5., -0.1),
            ]],
            0.3,
            1.,
        )];
        let query = QueryPolygon::new(vec![
            Location::new(-0.1, -5.),
            Location::new(-0.1, 5.),
            Location::new(0.1, 5.),
            Location::new(0.1, -5.),
        ]);
        let result = filter_by_polygon(&query, &basins).unwrap();
        assert_eq!(result.stats.count, 1);
        assert_eq!(result.stats.distribution.get(HazardTier::Low), 1);
    }

    #[test]
    fn query_containing_or_inside_a_basin() {
        let basins = vec![basin(0, vec![square(0., 0., 10.)], 0.5, 1.)];
        let inside = QueryPolygon::new(square(4., 4., 1.));
        let around = QueryPolygon::new(square(-1., -1., 20.));
        assert_eq!(filter_by_polygon(&inside, &basins).unwrap().stats.count, 1);
        assert_eq!(filter_by_polygon(&around, &basins).unwrap().stats.count, 1);
    }

    #[test]
    fn query_inside_a_hole_does_not_match() {
        let basins = vec![basin(
            0,
            vec![square(0., 0., 10.), square(2., 2., 6.)],
            0.9,
            1.,
        )];
        let query = QueryPolygon::new(square(4., 4., 1.));
        let result = filter_by_polygon(&query, &basins).unwrap();
        assert_eq!(result.stats.count, 0);
        // the same point still hits the basin
        assert_eq!(hit_test(&Location::new(4.5, 4.5), &basins), Some(0));
    }

    #[test]
    fn no_matches() {
        let query = QueryPolygon::new(square(50., 50., 1.));
        let result = filter_by_polygon(&query, &three_basins()).unwrap();
        assert!(result.features.is_empty());
        assert_eq!(result.stats, FilterStats::default());
        assert_eq!(result.stats.mean_probability, 0.);
    }

    #[test]
    fn statistics_ignore_input_order() {
        let mut features: Vec<Feature> = (0..40)
            .map(|i| {
                let p3 = (i as f64 * 0.137) % 1.;
                basin(i, vec![square(i as f64 * 0.1, 0., 0.5)], p3, 0.1 + i as f64 * 0.01)
            })
            .collect();
        let query = QueryPolygon::new(square(0.7, -1., 2.));
        let reference = filter_by_polygon(&query, &features).unwrap().stats;
        assert!(reference.count > 0);

        let mut rng = thread_rng();
        for _ in 0..10 {
            features.shuffle(&mut rng);
            let stats = filter_by_polygon(&query, &features).unwrap().stats;
            assert_eq!(stats.count, reference.count);
            assert_eq!(stats.total_area_km2, reference.total_area_km2);
            assert_eq!(stats.mean_probability, reference.mean_probability);
            assert_eq!(stats.distribution, reference.distribution);
        }
    }

    #[test]
    fn degenerate_queries_are_rejected() {
        let features = three_basins();
        let two_points = QueryPolygon::new(vec![Location::new(0., 0.), Location::new(1., 1.)]);
        let closed_segment = QueryPolygon::new(vec![
            Location::new(0., 0.),
            Location::new(1., 1.),
            Location::new(0., 0.),
        ]);
        let repeated = QueryPolygon::new(vec![
            Location::new(0., 0.),
            Location::new(-0., 0.),
            Location::new(1., 1.),
            Location::new(1., 1.),
        ]);
        assert_eq!(
            filter_by_polygon(&two_points, &features).unwrap_err(),
            QueryError::TooFewPoints { distinct: 2 }
        );
        assert_eq!(
            filter_by_polygon(&closed_segment, &features).unwrap_err(),
            QueryError::TooFewPoints { distinct: 2 }
        );
        assert_eq!(
            filter_by_polygon(&repeated, &features).unwrap_err(),
            QueryError::TooFewPoints { distinct: 2 }
        );
        assert_eq!(
            filter_by_polygon(&QueryPolygon::new(vec![]), &features).unwrap_err(),
            QueryError::TooFewPoints { distinct: 0 }
        );
        // the collection is left as it was
        assert_eq!(features.len(), 3);
    }

    #[test]
    fn query_from_geojson() {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[0.5, 0.5], [2.5, 0.5], [2.5, 2.5], [0.5, 2.5], [0.5, 0.5]]]
        });
        let query = QueryPolygon::from_geojson(&geometry).unwrap();
        assert_eq!(query.outer()[1], Location::new(0.5, 2.5));
        let result = filter_by_polygon(&query, &three_basins()).unwrap();
        assert_eq!(result.stats.count, 2);
    }

    #[test]
    fn invalid_geojson_queries() {
        let point = json!({"type": "Point", "coordinates": [0., 0.]});
        assert_eq!(
            QueryPolygon::from_geojson(&point).unwrap_err(),
            QueryError::NotAPolygon("Point".to_string())
        );
        let untyped = json!({"coordinates": []});
        assert_eq!(
            QueryPolygon::from_geojson(&untyped).unwrap_err(),
            QueryError::NotAPolygon("nothing".to_string())
        );
        let broken = json!({"type": "Polygon", "coordinates": [[[0., "a"]]]});
        assert!(matches!(
            QueryPolygon::from_geojson(&broken),
            Err(QueryError::Coordinates(FeatureError::NonNumeric(_)))
        ));
        let empty = json!({"type": "Polygon", "coordinates": []});
        let query = QueryPolygon::from_geojson(&empty).unwrap();
        assert_eq!(
            query.validate(),
            Err(QueryError::TooFewPoints { distinct: 0 })
        );
    }
}
