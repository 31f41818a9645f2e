use crate::models::{EvaluationResult, Metric, MetricRecord, MetricTable, Rating};
use crate::normalize::NormalizationRange;
use serde::{Deserialize, Serialize};

/// Weight applied to each normalized metric.
///
/// Weights are not required to sum to 1; the default table peaks near 1.2,
/// which is what the rating thresholds are calibrated against.
pub type CriteriaWeights = MetricTable<f64>;

/// Per-metric normalization ranges.
pub type NormalizationTable = MetricTable<NormalizationRange>;

/// Immutable tables the engine scores against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: CriteriaWeights,
    pub ranges: NormalizationTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: MetricTable {
                population_density: 0.20,
                crime_rate: 0.20,
                income: 0.15,
                residential_ratio: 0.08,
                noise_level: 0.05,
                healthcare_access: 0.30,
                community_engagement: 0.10,
                environmental_quality: 0.12,
            },
            ranges: MetricTable {
                population_density: NormalizationRange::new(100.0, 10000.0, false),
                crime_rate: NormalizationRange::new(0.0, 500.0, true),
                income: NormalizationRange::new(20000.0, 150000.0, false),
                residential_ratio: NormalizationRange::new(0.0, 1.0, false),
                noise_level: NormalizationRange::new(0.0, 100.0, true),
                healthcare_access: NormalizationRange::new(0.0, 100.0, false),
                community_engagement: NormalizationRange::new(0.0, 100.0, false),
                environmental_quality: NormalizationRange::new(0.0, 100.0, false),
            },
        }
    }
}

/// How much a single metric added to the total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricContribution {
    pub metric: Metric,
    pub raw: f64,
    pub normalized: f64,
    pub weighted: f64,
}

/// Maps a total score onto a rating. Thresholds are inclusive lower bounds.
pub fn calculate_rating(score: f64) -> Rating {
    if score >= 1.5 {
        Rating::Excellent
    } else if score >= 0.8 {
        Rating::Good
    } else if score >= 0.4 {
        Rating::Average
    } else if score >= 0.2 {
        Rating::Poor
    } else {
        Rating::VeryPoor
    }
}

/// Normalizes, weights and sums a [`MetricRecord`].
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Per-metric contributions in [`Metric::ALL`] order.
    pub fn breakdown(&self, record: &MetricRecord) -> Vec<MetricContribution> {
        record
            .iter()
            .map(|(metric, &raw)| {
                let normalized = self.config.ranges.get(metric).apply(raw);
                MetricContribution {
                    metric,
                    raw,
                    normalized,
                    weighted: self.config.weights.get(metric) * normalized,
                }
            })
            .collect()
    }

    pub fn evaluate(&self, record: &MetricRecord) -> EvaluationResult {
        let contributions = self.breakdown(record);
        let score: f64 = contributions.iter().map(|c| c.weighted).sum();

        for c in &contributions {
            tracing::trace!(
                "{}: raw={} normalized={:.4} weighted={:.4}",
                c.metric,
                c.raw,
                c.normalized,
                c.weighted
            );
        }

        EvaluationResult {
            rating: calculate_rating(score),
            score,
        }
    }
}
