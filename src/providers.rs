//! Metric providers: one named value per [`Metric`], never failing.
//!
//! Upstream failures are absorbed here. A [`FallbackChain`] tries its
//! [`MetricSource`] tiers in order and settles on a fixed default when every
//! tier comes back empty, so the scoring engine always receives a full record.

use crate::errors::AppError;
use crate::models::{AddressDetails, Metric};
use crate::normalize::normalize;
use crate::services::{
    BuildingFootprintLookup, CountryDensityLookup, CrimeLookup, IncomeLookup,
    UrbanDensityLookup,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Population density used when no tier produced a value.
pub const DEFAULT_POPULATION_DENSITY: f64 = 5000.0;
/// Crime score used when the crime API is unusable.
pub const DEFAULT_CRIME_RATE: f64 = 25.0;
/// Residential ratio used when the building API is unusable.
pub const DEFAULT_RESIDENTIAL_RATIO: f64 = 0.0;
/// Placeholder mean household income.
pub const PLACEHOLDER_INCOME: f64 = 60000.0;
pub const PLACEHOLDER_NOISE_LEVEL: f64 = 30.0;
pub const PLACEHOLDER_HEALTHCARE_ACCESS: f64 = 85.0;
pub const PLACEHOLDER_COMMUNITY_ENGAGEMENT: f64 = 70.0;
pub const PLACEHOLDER_ENVIRONMENTAL_QUALITY: f64 = 75.0;

/// Incident count that maps to the maximum crime score.
const MAX_CRIMES: f64 = 500.0;

/// Building tags counted as residential besides anything containing "residential".
const RESIDENTIAL_TAGS: [&str; 4] = ["house", "apartments", "detached", "semidetached_house"];

/// Produces one metric for an address. Implementations must not fail.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    fn metric(&self) -> Metric;

    async fn fetch(&self, address: &AddressDetails) -> f64;
}

/// One tier of a fallback chain. `None` means "try the next tier".
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn value(&self, address: &AddressDetails) -> Option<f64>;
}

/// Returns the same value for every address.
#[derive(Debug, Clone, Copy)]
pub struct ConstantProvider {
    metric: Metric,
    value: f64,
}

impl ConstantProvider {
    pub fn new(metric: Metric, value: f64) -> Self {
        Self { metric, value }
    }

    /// The built-in value for `metric` when no real data source is wired.
    pub fn placeholder(metric: Metric) -> Self {
        let value = match metric {
            Metric::PopulationDensity => DEFAULT_POPULATION_DENSITY,
            Metric::CrimeRate => DEFAULT_CRIME_RATE,
            Metric::Income => PLACEHOLDER_INCOME,
            Metric::ResidentialRatio => DEFAULT_RESIDENTIAL_RATIO,
            Metric::NoiseLevel => PLACEHOLDER_NOISE_LEVEL,
            Metric::HealthcareAccess => PLACEHOLDER_HEALTHCARE_ACCESS,
            Metric::CommunityEngagement => PLACEHOLDER_COMMUNITY_ENGAGEMENT,
            Metric::EnvironmentalQuality => PLACEHOLDER_ENVIRONMENTAL_QUALITY,
        };
        Self::new(metric, value)
    }
}

#[async_trait]
impl MetricProvider for ConstantProvider {
    fn metric(&self) -> Metric {
        self.metric
    }

    async fn fetch(&self, _address: &AddressDetails) -> f64 {
        self.value
    }
}

/// Ordered list of sources; the first one that yields a value wins.
pub struct FallbackChain {
    metric: Metric,
    tiers: Vec<Box<dyn MetricSource>>,
    default: f64,
}

impl FallbackChain {
    pub fn new(metric: Metric, default: f64) -> Self {
        Self {
            metric,
            tiers: Vec::new(),
            default,
        }
    }

    /// Appends a tier, tried after every tier added before it.
    pub fn then(mut self, tier: impl MetricSource + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Urban area density, then country density, then [`DEFAULT_POPULATION_DENSITY`].
    pub fn population_density(
        urban: Arc<dyn UrbanDensityLookup>,
        country: Arc<dyn CountryDensityLookup>,
    ) -> Self {
        Self::new(Metric::PopulationDensity, DEFAULT_POPULATION_DENSITY)
            .then(UrbanAreaDensity::new(urban))
            .then(CountryDensity::new(country))
    }

    /// Police incident count, then [`DEFAULT_CRIME_RATE`].
    pub fn crime_rate(lookup: Arc<dyn CrimeLookup>, month: impl Into<String>) -> Self {
        Self::new(Metric::CrimeRate, DEFAULT_CRIME_RATE).then(CrimeRate::new(lookup, month))
    }

    /// Building footprint ratio, then [`DEFAULT_RESIDENTIAL_RATIO`].
    pub fn residential_ratio(lookup: Arc<dyn BuildingFootprintLookup>, radius_m: u32) -> Self {
        Self::new(Metric::ResidentialRatio, DEFAULT_RESIDENTIAL_RATIO)
            .then(ResidentialRatio::new(lookup, radius_m))
    }

    /// Postcode income, then [`PLACEHOLDER_INCOME`].
    pub fn income(lookup: Arc<dyn IncomeLookup>) -> Self {
        Self::new(Metric::Income, PLACEHOLDER_INCOME).then(PostcodeIncome::new(lookup))
    }
}

#[async_trait]
impl MetricProvider for FallbackChain {
    fn metric(&self) -> Metric {
        self.metric
    }

    async fn fetch(&self, address: &AddressDetails) -> f64 {
        for tier in &self.tiers {
            if let Some(value) = tier.value(address).await {
                tracing::debug!("{} resolved by {}: {}", self.metric, tier.name(), value);
                return value;
            }
            tracing::debug!("{}: {} had no value", self.metric, tier.name());
        }
        tracing::warn!(
            "{}: all sources unavailable, using default {}",
            self.metric,
            self.default
        );
        self.default
    }
}

/// Logs an upstream failure and turns it into "no value".
fn absorb<T>(source: &str, result: Result<Option<T>, AppError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{} unavailable: {}", source, e);
            None
        }
    }
}

// ============ Sources ============

/// Density of the urban area containing the coordinates.
pub struct UrbanAreaDensity {
    lookup: Arc<dyn UrbanDensityLookup>,
}

impl UrbanAreaDensity {
    pub fn new(lookup: Arc<dyn UrbanDensityLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl MetricSource for UrbanAreaDensity {
    fn name(&self) -> &'static str {
        "urban area density"
    }

    async fn value(&self, address: &AddressDetails) -> Option<f64> {
        let (lat, lon) = address.coordinates()?;
        absorb(self.name(), self.lookup.urban_area(lat, lon).await)?.density()
    }
}

/// National density of the address's country.
pub struct CountryDensity {
    lookup: Arc<dyn CountryDensityLookup>,
}

impl CountryDensity {
    pub fn new(lookup: Arc<dyn CountryDensityLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl MetricSource for CountryDensity {
    fn name(&self) -> &'static str {
        "country density"
    }

    async fn value(&self, address: &AddressDetails) -> Option<f64> {
        let country = address.country()?;
        absorb(self.name(), self.lookup.country(country).await)?.density()
    }
}

/// Converts an incident count into a 0-100 crime score.
pub fn crime_score(incident_count: usize) -> f64 {
    (incident_count as f64 / MAX_CRIMES * 100.0).min(100.0)
}

/// Incident count around the coordinates for a fixed month.
pub struct CrimeRate {
    lookup: Arc<dyn CrimeLookup>,
    month: String,
}

impl CrimeRate {
    pub fn new(lookup: Arc<dyn CrimeLookup>, month: impl Into<String>) -> Self {
        Self {
            lookup,
            month: month.into(),
        }
    }
}

#[async_trait]
impl MetricSource for CrimeRate {
    fn name(&self) -> &'static str {
        "police crime count"
    }

    async fn value(&self, address: &AddressDetails) -> Option<f64> {
        let (lat, lon) = address.coordinates()?;
        let incidents = self.lookup.incidents(lat, lon, &self.month).await;
        absorb(self.name(), incidents.map(Some)).map(|found| crime_score(found.len()))
    }
}

/// Whether an OSM `building` tag denotes housing.
pub fn is_residential_tag(tag: &str) -> bool {
    tag.contains("residential") || RESIDENTIAL_TAGS.contains(&tag)
}

/// Share of residential buildings; `0.0` when there are no buildings.
pub fn residential_share<'a>(tags: impl IntoIterator<Item = &'a str>) -> f64 {
    let (residential, total) = tags.into_iter().fold((0usize, 0usize), |(r, t), tag| {
        (r + usize::from(is_residential_tag(tag)), t + 1)
    });
    if total == 0 {
        0.0
    } else {
        residential as f64 / total as f64
    }
}

/// Residential share of the buildings within a radius.
pub struct ResidentialRatio {
    lookup: Arc<dyn BuildingFootprintLookup>,
    radius_m: u32,
}

impl ResidentialRatio {
    pub fn new(lookup: Arc<dyn BuildingFootprintLookup>, radius_m: u32) -> Self {
        Self { lookup, radius_m }
    }
}

#[async_trait]
impl MetricSource for ResidentialRatio {
    fn name(&self) -> &'static str {
        "building footprints"
    }

    async fn value(&self, address: &AddressDetails) -> Option<f64> {
        let (lat, lon) = address.coordinates()?;
        let buildings = self.lookup.buildings(lat, lon, self.radius_m).await;
        absorb(self.name(), buildings.map(Some))
            .map(|found| residential_share(found.iter().map(|b| b.building_tag.as_str())))
    }
}

/// Raw mean household income for the address's postcode.
pub struct PostcodeIncome {
    lookup: Arc<dyn IncomeLookup>,
}

impl PostcodeIncome {
    pub fn new(lookup: Arc<dyn IncomeLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl MetricSource for PostcodeIncome {
    fn name(&self) -> &'static str {
        "postcode income"
    }

    async fn value(&self, address: &AddressDetails) -> Option<f64> {
        let postcode = address.postcode()?;
        absorb(
            self.name(),
            self.lookup.mean_household_income(postcode).await.map(Some),
        )
    }
}

/// Income score for a postcode, normalized onto the 20 000 - 150 000 range.
///
/// Unlike the pipeline sources this surfaces [`AppError::DataNotFound`] when
/// the upstream response has no income figure.
pub struct IncomeProvider {
    lookup: Arc<dyn IncomeLookup>,
}

impl IncomeProvider {
    pub fn new(lookup: Arc<dyn IncomeLookup>) -> Self {
        Self { lookup }
    }

    pub async fn income_score(&self, postcode: &str) -> Result<f64, AppError> {
        let income = self.lookup.mean_household_income(postcode).await?;
        Ok(normalize(income, 20000.0, 150000.0, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AreaPopulation, Building, Incident};
    use std::collections::BTreeMap;

    fn address(country: Option<&str>, postcode: Option<&str>) -> AddressDetails {
        let mut fields = BTreeMap::new();
        if let Some(country) = country {
            fields.insert("country".to_string(), country.to_string());
        }
        if let Some(postcode) = postcode {
            fields.insert("postcode".to_string(), postcode.to_string());
        }
        AddressDetails {
            fields,
            lat: 51.5237,
            lon: -0.1585,
            place_type: "residential".to_string(),
        }
    }

    fn unreachable() -> AppError {
        AppError::ExternalApiError("connection refused".to_string())
    }

    struct FixedUrban(Result<Option<AreaPopulation>, AppError>);

    #[async_trait]
    impl UrbanDensityLookup for FixedUrban {
        async fn urban_area(&self, _: f64, _: f64) -> Result<Option<AreaPopulation>, AppError> {
            self.0.clone()
        }
    }

    struct FixedCountry(Result<Option<AreaPopulation>, AppError>);

    #[async_trait]
    impl CountryDensityLookup for FixedCountry {
        async fn country(&self, _: &str) -> Result<Option<AreaPopulation>, AppError> {
            self.0.clone()
        }
    }

    struct FixedCrime(Result<usize, AppError>);

    #[async_trait]
    impl CrimeLookup for FixedCrime {
        async fn incidents(&self, _: f64, _: f64, _: &str) -> Result<Vec<Incident>, AppError> {
            self.0
                .clone()
                .map(|n| vec![Incident::default(); n])
        }
    }

    struct FixedBuildings(Result<Vec<&'static str>, AppError>);

    #[async_trait]
    impl BuildingFootprintLookup for FixedBuildings {
        async fn buildings(&self, _: f64, _: f64, _: u32) -> Result<Vec<Building>, AppError> {
            self.0.clone().map(|tags| {
                tags.into_iter()
                    .map(|t| Building {
                        building_tag: t.to_string(),
                    })
                    .collect()
            })
        }
    }

    struct FixedIncome(Result<f64, AppError>);

    #[async_trait]
    impl IncomeLookup for FixedIncome {
        async fn mean_household_income(&self, _: &str) -> Result<f64, AppError> {
            self.0.clone()
        }
    }

    fn area(population: f64, area_km2: f64) -> Option<AreaPopulation> {
        Some(AreaPopulation {
            population,
            area_km2,
        })
    }

    #[tokio::test]
    async fn test_density_prefers_urban_area() {
        let chain = FallbackChain::population_density(
            Arc::new(FixedUrban(Ok(area(9_000_000.0, 1572.0)))),
            Arc::new(FixedCountry(Ok(area(67_000_000.0, 241_930.0)))),
        );
        assert_eq!(chain.fetch(&address(Some("United Kingdom"), None)).await, 5725.0);
    }

    #[tokio::test]
    async fn test_density_falls_back_to_country() {
        let chain = FallbackChain::population_density(
            Arc::new(FixedUrban(Err(unreachable()))),
            Arc::new(FixedCountry(Ok(area(67_000_000.0, 241_930.0)))),
        );
        assert_eq!(chain.fetch(&address(Some("United Kingdom"), None)).await, 276.0);
    }

    #[tokio::test]
    async fn test_density_falls_back_to_constant() {
        let chain = FallbackChain::population_density(
            Arc::new(FixedUrban(Err(unreachable()))),
            Arc::new(FixedCountry(Err(unreachable()))),
        );
        assert_eq!(
            chain.fetch(&address(Some("United Kingdom"), None)).await,
            5000.0
        );
    }

    #[tokio::test]
    async fn test_density_without_country_skips_country_tier() {
        let chain = FallbackChain::population_density(
            Arc::new(FixedUrban(Ok(None))),
            Arc::new(FixedCountry(Ok(area(1.0, 1.0)))),
        );
        assert_eq!(chain.fetch(&address(None, None)).await, 5000.0);
    }

    #[tokio::test]
    async fn test_urban_area_without_area_uses_next_tier() {
        let chain = FallbackChain::population_density(
            Arc::new(FixedUrban(Ok(area(9_000_000.0, 0.0)))),
            Arc::new(FixedCountry(Ok(area(1000.0, 10.0)))),
        );
        assert_eq!(chain.fetch(&address(Some("France"), None)).await, 100.0);
    }

    #[tokio::test]
    async fn test_crime_score_from_count() {
        let chain = FallbackChain::crime_rate(Arc::new(FixedCrime(Ok(50))), "2025-02");
        assert_eq!(chain.fetch(&address(None, None)).await, 10.0);
    }

    #[tokio::test]
    async fn test_crime_score_is_capped() {
        let chain = FallbackChain::crime_rate(Arc::new(FixedCrime(Ok(1200))), "2025-02");
        assert_eq!(chain.fetch(&address(None, None)).await, 100.0);
    }

    #[tokio::test]
    async fn test_crime_falls_back_on_failure() {
        let chain = FallbackChain::crime_rate(Arc::new(FixedCrime(Err(unreachable()))), "2025-02");
        assert_eq!(chain.fetch(&address(None, None)).await, 25.0);
    }

    #[tokio::test]
    async fn test_crime_falls_back_without_coordinates() {
        let chain = FallbackChain::crime_rate(Arc::new(FixedCrime(Ok(10))), "2025-02");
        let mut details = address(None, None);
        details.lat = f64::NAN;
        assert_eq!(chain.fetch(&details).await, 25.0);
    }

    #[tokio::test]
    async fn test_residential_ratio_counts_tags() {
        let chain = FallbackChain::residential_ratio(
            Arc::new(FixedBuildings(Ok(vec![
                "house",
                "residential",
                "apartments",
                "retail",
                "",
            ]))),
            200,
        );
        assert!((chain.fetch(&address(None, None)).await - 0.6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_residential_ratio_empty_is_zero() {
        let chain = FallbackChain::residential_ratio(Arc::new(FixedBuildings(Ok(vec![]))), 200);
        assert_eq!(chain.fetch(&address(None, None)).await, 0.0);
    }

    #[test]
    fn test_residential_tags() {
        assert!(is_residential_tag("residential"));
        assert!(is_residential_tag("semi_residential"));
        assert!(is_residential_tag("semidetached_house"));
        assert!(!is_residential_tag("commercial"));
        assert!(!is_residential_tag("houseboat"));
    }

    #[tokio::test]
    async fn test_income_score_normalizes() {
        let provider = IncomeProvider::new(Arc::new(FixedIncome(Ok(85000.0))));
        let score = provider.income_score("MK9 3HG").await.unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_income_score_surfaces_missing_field() {
        let provider = IncomeProvider::new(Arc::new(FixedIncome(Err(AppError::DataNotFound(
            "Income data not found in the API response.".to_string(),
        )))));
        let err = provider.income_score("MK9 3HG").await.unwrap_err();
        assert!(matches!(err, AppError::DataNotFound(_)));
    }

    #[tokio::test]
    async fn test_income_chain_uses_placeholder_without_postcode() {
        let chain = FallbackChain::income(Arc::new(FixedIncome(Ok(85000.0))));
        assert_eq!(chain.fetch(&address(None, None)).await, 60000.0);
        assert_eq!(chain.fetch(&address(None, Some("MK9 3HG"))).await, 85000.0);
    }

    #[tokio::test]
    async fn test_placeholders() {
        let details = address(None, None);
        assert_eq!(ConstantProvider::placeholder(Metric::NoiseLevel).fetch(&details).await, 30.0);
        assert_eq!(
            ConstantProvider::placeholder(Metric::HealthcareAccess)
                .fetch(&details)
                .await,
            85.0
        );
        assert_eq!(
            ConstantProvider::placeholder(Metric::CommunityEngagement)
                .fetch(&details)
                .await,
            70.0
        );
        assert_eq!(
            ConstantProvider::placeholder(Metric::EnvironmentalQuality)
                .fetch(&details)
                .await,
            75.0
        );
    }
}
