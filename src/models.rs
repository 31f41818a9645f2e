use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============ Metrics ============

/// The fixed set of neighborhood metrics that feed the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PopulationDensity,
    CrimeRate,
    Income,
    ResidentialRatio,
    NoiseLevel,
    HealthcareAccess,
    CommunityEngagement,
    EnvironmentalQuality,
}

impl Metric {
    /// Every metric, in scoring order.
    pub const ALL: [Metric; 8] = [
        Metric::PopulationDensity,
        Metric::CrimeRate,
        Metric::Income,
        Metric::ResidentialRatio,
        Metric::NoiseLevel,
        Metric::HealthcareAccess,
        Metric::CommunityEngagement,
        Metric::EnvironmentalQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::PopulationDensity => "population_density",
            Metric::CrimeRate => "crime_rate",
            Metric::Income => "income",
            Metric::ResidentialRatio => "residential_ratio",
            Metric::NoiseLevel => "noise_level",
            Metric::HealthcareAccess => "healthcare_access",
            Metric::CommunityEngagement => "community_engagement",
            Metric::EnvironmentalQuality => "environmental_quality",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`Metric`].
///
/// Every table holds all eight keys by construction, so a weight table, a
/// range table and a record can never disagree on their key sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTable<T> {
    pub population_density: T,
    pub crime_rate: T,
    pub income: T,
    pub residential_ratio: T,
    pub noise_level: T,
    pub healthcare_access: T,
    pub community_engagement: T,
    pub environmental_quality: T,
}

impl<T> MetricTable<T> {
    /// Builds a table by evaluating `f` once per metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            population_density: f(Metric::PopulationDensity),
            crime_rate: f(Metric::CrimeRate),
            income: f(Metric::Income),
            residential_ratio: f(Metric::ResidentialRatio),
            noise_level: f(Metric::NoiseLevel),
            healthcare_access: f(Metric::HealthcareAccess),
            community_engagement: f(Metric::CommunityEngagement),
            environmental_quality: f(Metric::EnvironmentalQuality),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::PopulationDensity => &self.population_density,
            Metric::CrimeRate => &self.crime_rate,
            Metric::Income => &self.income,
            Metric::ResidentialRatio => &self.residential_ratio,
            Metric::NoiseLevel => &self.noise_level,
            Metric::HealthcareAccess => &self.healthcare_access,
            Metric::CommunityEngagement => &self.community_engagement,
            Metric::EnvironmentalQuality => &self.environmental_quality,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut T {
        match metric {
            Metric::PopulationDensity => &mut self.population_density,
            Metric::CrimeRate => &mut self.crime_rate,
            Metric::Income => &mut self.income,
            Metric::ResidentialRatio => &mut self.residential_ratio,
            Metric::NoiseLevel => &mut self.noise_level,
            Metric::HealthcareAccess => &mut self.healthcare_access,
            Metric::CommunityEngagement => &mut self.community_engagement,
            Metric::EnvironmentalQuality => &mut self.environmental_quality,
        }
    }

    /// Iterates `(metric, value)` pairs in [`Metric::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Raw metric values for one address, before normalization.
pub type MetricRecord = MetricTable<f64>;

// ============ Addresses ============

/// A geocoded address that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    /// Administrative fields (country, city, postcode, road, ...).
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub lat: f64,
    pub lon: f64,
    pub place_type: String,
}

impl AddressDetails {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn country(&self) -> Option<&str> {
        self.field("country")
    }

    pub fn postcode(&self) -> Option<&str> {
        self.field("postcode")
    }

    /// Latitude and longitude, if both are usable numbers.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        (self.lat.is_finite() && self.lon.is_finite()).then_some((self.lat, self.lon))
    }
}

// ============ Evaluation ============

/// Categorical livability rating, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Average,
    Good,
    Excellent,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::VeryPoor => "Very Poor",
            Rating::Poor => "Poor",
            Rating::Average => "Average",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rating: Rating,
    pub score: f64,
}

// ============ API Models ============

#[derive(Debug, Clone, Deserialize)]
pub struct SingleAddressRequest {
    pub requested_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManyAddressesRequest {
    pub requested_addresses: Vec<String>,
}

/// Response of the single-address operation: a score, or the rejection message as a bare string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SingleAddressResponse {
    Evaluated(EvaluationResult),
    Rejected(String),
}

/// Outcome stored in one batch slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Evaluated(EvaluationResult),
    Rejected { error: String },
}

impl BatchOutcome {
    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        match self {
            BatchOutcome::Evaluated(result) => Some(result),
            BatchOutcome::Rejected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    /// The address exactly as the caller sent it.
    pub address: String,
    pub data: BatchOutcome,
}
