use super::geojson::Entity;
use super::hazard::{HazardDistribution, HazardTier};
use super::items::{Feature, ParsedCollection};
use super::query::{FilterResult, FilterStats};
use serde::Serialize;
use serde_json::to_string;
use std::error::Error;
use std::io::Write;

pub trait Output {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>>;
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>>;
}

fn round4(value: f64) -> f64 {
    (value * 10_000.).round() / 10_000.
}

#[derive(Serialize)]
struct JSONBasin {
    index: usize,
    label: String,
    tier: HazardTier,
    probability: f64,
    class_tier: HazardTier,
}

impl From<&Feature> for JSONBasin {
    fn from(feature: &Feature) -> Self {
        let hazard = feature.hazard();
        JSONBasin {
            index: feature.index,
            label: feature.label(),
            tier: hazard.tier,
            probability: hazard.value,
            class_tier: feature.hazard_class().tier,
        }
    }
}

#[derive(Serialize)]
struct JSONStatistics {
    basin_count: usize,
    total_area_km2: f64,
    hazard_distribution: HazardDistribution,
    average_probability_p3: f64,
}

impl From<&FilterStats> for JSONStatistics {
    fn from(stats: &FilterStats) -> Self {
        JSONStatistics {
            basin_count: stats.count,
            total_area_km2: round4(stats.total_area_km2),
            hazard_distribution: stats.distribution,
            average_probability_p3: round4(stats.mean_probability),
        }
    }
}

fn write_collection<S: Serialize>(
    writer: &mut dyn Write,
    features: Vec<Entity<S>>,
    name: Option<&'static str>,
    statistics: Option<S>,
) -> Result<(), Box<dyn Error>> {
    let feature_collection = Entity::FeatureCollection {
        name,
        statistics,
        features,
    };
    let string = to_string(&feature_collection)?;
    writeln!(writer, "{}", string)?;
    Ok(())
}

fn write_basins<'a>(
    writer: &mut dyn Write,
    features: impl IntoIterator<Item = &'a Feature>,
) -> Result<(), Box<dyn Error>> {
    for feature in features {
        let json = to_string(&JSONBasin::from(feature))?;
        writeln!(writer, "{}", json)?;
    }
    Ok(())
}

impl Output for ParsedCollection {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        let features = self.features.iter().map(Entity::from).collect();
        write_collection::<()>(writer, features, None, None)
    }

    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        write_basins(writer, &self.features)
    }
}

impl Output for FilterResult {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        let statistics = JSONStatistics::from(&self.stats);
        let features = self
            .basins()
            .into_iter()
            .filter_map(Entity::from_parts)
            .collect();
        write_collection(writer, features, Some("filtered_basins"), Some(statistics))
    }

    /// One statistics line, followed by one line per matched basin.
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        let json = to_string(&JSONStatistics::from(&self.stats))?;
        writeln!(writer, "{}", json)?;
        let basins = self.basins();
        write_basins(writer, basins.iter().filter_map(|parts| parts.first()))
    }
}
