use super::geo::raw_bounds;
use super::items::{Feature, Location};
use super::query::{filter_features, ring_contains, FilterResult, QueryError, QueryPolygon};
use rstar::{RTree, RTreeObject, AABB};

/// Outer ring envelope of the feature at `position`.
struct Entry {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over a feature slice for repeated queries on large collections.
///
/// Answers exactly like [`hit_test`](super::query::hit_test) and
/// [`filter_by_polygon`](super::query::filter_by_polygon): candidates are
/// always resolved in source order.
pub struct FeatureIndex<'a> {
    features: &'a [Feature],
    tree: RTree<Entry>,
}

impl<'a> FeatureIndex<'a> {
    pub fn new(features: &'a [Feature]) -> Self {
        let entries = features
            .iter()
            .enumerate()
            .filter_map(|(position, feature)| {
                let bbox = raw_bounds(feature.outer())?;
                Some(Entry {
                    position,
                    envelope: (&bbox).into(),
                })
            })
            .collect();
        FeatureIndex {
            features,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    fn positions_in(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn hit_test(&self, point: &Location) -> Option<usize> {
        let envelope = AABB::from_point([point.lon, point.lat]);
        self.positions_in(&envelope)
            .into_iter()
            .map(|position| &self.features[position])
            .find(|feature| ring_contains(feature.outer(), point))
            .map(|feature| feature.index)
    }

    pub fn filter_by_polygon(&self, query: &QueryPolygon) -> Result<FilterResult, QueryError> {
        query.validate()?;
        let envelope = match raw_bounds(query.outer()) {
            Some(bbox) => AABB::from(&bbox),
            None => return Ok(FilterResult::default()),
        };
        let candidates = self
            .positions_in(&envelope)
            .into_iter()
            .map(|position| &self.features[position]);
        Ok(filter_features(&query.to_polygon(), self.features, candidates))
    }
}
