pub mod geo;
pub mod quality;

use crate::utils::round1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use geo::score_geo;
pub use quality::{QualityInputs, score_quality};

/// One scoring category: its points, the points it could have earned, and
/// the share of the total it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub key: String,
    pub name: String,
    /// Points per sub-metric before clamping to the ceiling
    pub sub_metrics: BTreeMap<String, f64>,
    pub score: f64,
    pub ceiling: f64,
    pub weight: f64,
}

impl CategoryScore {
    /// Builds a category from its sub-metrics; the score is their sum
    /// clamped to `[0, ceiling]`
    pub fn new(
        key: &str,
        name: &str,
        ceiling: f64,
        weight: f64,
        sub_metrics: impl IntoIterator<Item = (&'static str, f64)>,
    ) -> Self {
        let sub_metrics: BTreeMap<String, f64> = sub_metrics
            .into_iter()
            .map(|(name, points)| (name.to_string(), round1(points)))
            .collect();
        let raw: f64 = sub_metrics.values().sum();

        Self {
            key: key.to_string(),
            name: name.to_string(),
            score: round1(raw.clamp(0.0, ceiling)),
            sub_metrics,
            ceiling,
            weight,
        }
    }

    /// Share of the ceiling reached, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.ceiling <= 0.0 {
            return 0.0;
        }
        (self.score / self.ceiling).clamp(0.0, 1.0)
    }
}

/// All categories of one engine and the weighted total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub categories: Vec<CategoryScore>,
    pub total_score: f64,
}

impl ScoreBreakdown {
    /// Normalizes each category by its ceiling, then weights
    ///
    /// A category's internal formula can change without altering what
    /// the total means.
    pub fn combine(categories: Vec<CategoryScore>) -> Self {
        let weighted: f64 = categories.iter().map(|c| c.fraction() * c.weight).sum();
        let total_score = round1((weighted * 100.0).clamp(0.0, 100.0));
        Self {
            categories,
            total_score,
        }
    }

    pub fn category(&self, key: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.key == key)
    }
}
