//! Hazard tiers for debris-flow basins.
//!
//! Two sources feed a tier: the modeled likelihood `P_n` (a probability) and
//! the precomputed combined hazard class `H_n` (an integer 0..=3). The class
//! is only ever read, never derived from the probability here. Colors are
//! left to whoever draws the basins.

use super::items::{Feature, PropertyValue};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HazardTier {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
}

impl HazardTier {
    pub const ALL: [HazardTier; 4] = [
        HazardTier::High,
        HazardTier::Moderate,
        HazardTier::Low,
        HazardTier::VeryLow,
    ];

    /// Presentation weight, 0 for `VeryLow` up to 3 for `High`.
    pub fn weight(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            HazardTier::VeryLow => "Very Low",
            HazardTier::Low => "Low",
            HazardTier::Moderate => "Moderate",
            HazardTier::High => "High",
        }
    }
}

/// A tier together with the number it was derived from.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub tier: HazardTier,
    pub value: f64,
}

/// Modeled peak 15-minute rainfall intensities (mm/hr), one per `P_n`/`H_n`.
pub const I15_MM_HR: [u16; 4] = [16, 20, 24, 40];

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RainfallScenario(usize);

impl RainfallScenario {
    /// The 40 mm/hr scenario, which drives classification and statistics.
    pub const PRIMARY: RainfallScenario = RainfallScenario(3);

    pub fn all() -> impl Iterator<Item = RainfallScenario> {
        (0..I15_MM_HR.len()).map(RainfallScenario)
    }

    pub fn new(n: usize) -> Option<Self> {
        if n < I15_MM_HR.len() {
            Some(RainfallScenario(n))
        } else {
            None
        }
    }

    pub fn i15_mm_hr(self) -> u16 {
        I15_MM_HR[self.0]
    }

    pub fn probability_key(self) -> String {
        format!("P_{}", self.0)
    }

    pub fn class_key(self) -> String {
        format!("H_{}", self.0)
    }
}

/// Thresholds are inclusive lower bounds, NaN ends up as `VeryLow`.
pub fn classify(probability: f64) -> HazardTier {
    if probability >= 0.7 {
        HazardTier::High
    } else if probability >= 0.4 {
        HazardTier::Moderate
    } else if probability >= 0.2 {
        HazardTier::Low
    } else {
        HazardTier::VeryLow
    }
}

pub fn classify_class(value: f64) -> HazardTier {
    if value >= 3. {
        HazardTier::High
    } else if value >= 2. {
        HazardTier::Moderate
    } else if value >= 1. {
        HazardTier::Low
    } else {
        HazardTier::VeryLow
    }
}

fn coerce(value: Option<&PropertyValue>) -> f64 {
    value
        .and_then(PropertyValue::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(0.)
}

/// Classifies a raw attribute, anything that isn't a finite number counts as
/// `0.0`.
pub fn classify_value(value: Option<&PropertyValue>) -> Classification {
    let value = coerce(value);
    Classification {
        tier: classify(value),
        value,
    }
}

pub fn classify_class_value(value: Option<&PropertyValue>) -> Classification {
    let value = coerce(value);
    Classification {
        tier: classify_class(value),
        value,
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ScenarioHazard {
    pub i15_mm_hr: u16,
    pub probability: Classification,
    pub class: Classification,
}

impl Feature {
    pub fn hazard_at(&self, scenario: RainfallScenario) -> Classification {
        classify_value(self.properties.get(&scenario.probability_key()))
    }

    pub fn class_at(&self, scenario: RainfallScenario) -> Classification {
        classify_class_value(self.properties.get(&scenario.class_key()))
    }

    pub fn hazard(&self) -> Classification {
        self.hazard_at(RainfallScenario::PRIMARY)
    }

    pub fn hazard_class(&self) -> Classification {
        self.class_at(RainfallScenario::PRIMARY)
    }

    pub fn hazard_profile(&self) -> Vec<ScenarioHazard> {
        RainfallScenario::all()
            .map(|scenario| ScenarioHazard {
                i15_mm_hr: scenario.i15_mm_hr(),
                probability: self.hazard_at(scenario),
                class: self.class_at(scenario),
            })
            .collect()
    }
}

/// Most hazardous first; ties broken by probability, then by position.
pub fn rank_by_hazard(features: &[Feature]) -> Vec<&Feature> {
    let mut ranked: Vec<(usize, Classification, &Feature)> = features
        .iter()
        .enumerate()
        .map(|(position, feature)| (position, feature.hazard(), feature))
        .collect();
    ranked.sort_by(|(pos_a, a, _), (pos_b, b, _)| {
        b.tier
            .cmp(&a.tier)
            .then_with(|| b.value.total_cmp(&a.value))
            .then_with(|| pos_a.cmp(pos_b))
    });
    ranked.into_iter().map(|(_, _, feature)| feature).collect()
}

/// Number of basins per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HazardDistribution {
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Moderate")]
    pub moderate: usize,
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Very Low")]
    pub very_low: usize,
}

impl HazardDistribution {
    pub fn add(&mut self, tier: HazardTier) {
        match tier {
            HazardTier::High => self.high += 1,
            HazardTier::Moderate => self.moderate += 1,
            HazardTier::Low => self.low += 1,
            HazardTier::VeryLow => self.very_low += 1,
        }
    }

    pub fn get(&self, tier: HazardTier) -> usize {
        match tier {
            HazardTier::High => self.high,
            HazardTier::Moderate => self.moderate,
            HazardTier::Low => self.low,
            HazardTier::VeryLow => self.very_low,
        }
    }

    pub fn total(&self) -> usize {
        HazardTier::ALL.iter().map(|&tier| self.get(tier)).sum()
    }
}

impl Extend<HazardTier> for HazardDistribution {
    fn extend<I: IntoIterator<Item = HazardTier>>(&mut self, iter: I) {
        for tier in iter {
            self.add(tier);
        }
    }
}
