use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AddressDetails, Metric, MetricRecord, MetricTable};
use crate::providers::{ConstantProvider, FallbackChain, MetricProvider};
use crate::services::{OverpassService, PoliceService, TeleportService, WorldBankService};
use futures::future::join_all;
use std::sync::Arc;

/// Collects every metric for one address into a [`MetricRecord`].
#[derive(Clone)]
pub struct NeighborhoodAggregator {
    providers: MetricTable<Arc<dyn MetricProvider>>,
}

impl NeighborhoodAggregator {
    /// Fails if any provider sits in a slot other than its own metric.
    pub fn new(providers: MetricTable<Arc<dyn MetricProvider>>) -> Result<Self, AppError> {
        if let Some((slot, provider)) = providers.iter().find(|(m, p)| p.metric() != *m) {
            return Err(AppError::InternalError(format!(
                "provider for {} registered under {}",
                provider.metric(),
                slot
            )));
        }
        Ok(Self { providers })
    }

    /// Every metric served by its placeholder constant.
    pub fn placeholders() -> Self {
        Self {
            providers: MetricTable::from_fn(|metric| {
                Arc::new(ConstantProvider::placeholder(metric)) as Arc<dyn MetricProvider>
            }),
        }
    }

    /// Default wiring: live density, crime and building sources; placeholders elsewhere.
    ///
    /// Income stays on its placeholder; swap in [`FallbackChain::income`] with
    /// [`with_provider`](Self::with_provider) to use the postcode income API.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let density = FallbackChain::population_density(
            Arc::new(TeleportService::new(config)?),
            Arc::new(WorldBankService::new(config)?),
        );
        let crime = FallbackChain::crime_rate(
            Arc::new(PoliceService::new(config)?),
            config.crime_reference_month.clone(),
        );
        let residential = FallbackChain::residential_ratio(
            Arc::new(OverpassService::new(config)?),
            config.building_radius_m,
        );

        Ok(Self::placeholders()
            .with_provider(Arc::new(density))
            .with_provider(Arc::new(crime))
            .with_provider(Arc::new(residential)))
    }

    /// Replaces the provider for `provider.metric()`.
    pub fn with_provider(mut self, provider: Arc<dyn MetricProvider>) -> Self {
        let metric = provider.metric();
        *self.providers.get_mut(metric) = provider;
        self
    }

    /// Fetches all metrics concurrently. Never fails: providers settle on fallbacks.
    pub async fn collect(&self, address: &AddressDetails) -> MetricRecord {
        let values = join_all(
            Metric::ALL
                .iter()
                .map(|metric| self.providers.get(*metric).fetch(address)),
        )
        .await;

        let mut record = MetricTable::from_fn(|_| 0.0);
        for (metric, value) in Metric::ALL.into_iter().zip(values) {
            *record.get_mut(metric) = value;
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn details() -> AddressDetails {
        AddressDetails {
            fields: BTreeMap::new(),
            lat: 51.5,
            lon: -0.1,
            place_type: "city".to_string(),
        }
    }

    #[tokio::test]
    async fn test_placeholder_record() {
        let record = NeighborhoodAggregator::placeholders()
            .collect(&details())
            .await;

        assert_eq!(record.population_density, 5000.0);
        assert_eq!(record.crime_rate, 25.0);
        assert_eq!(record.income, 60000.0);
        assert_eq!(record.residential_ratio, 0.0);
        assert_eq!(record.noise_level, 30.0);
        assert_eq!(record.healthcare_access, 85.0);
        assert_eq!(record.community_engagement, 70.0);
        assert_eq!(record.environmental_quality, 75.0);
    }

    #[tokio::test]
    async fn test_with_provider_replaces_slot() {
        let aggregator = NeighborhoodAggregator::placeholders()
            .with_provider(Arc::new(ConstantProvider::new(Metric::NoiseLevel, 90.0)));
        let record = aggregator.collect(&details()).await;

        assert_eq!(record.noise_level, 90.0);
        assert_eq!(record.healthcare_access, 85.0);
    }

    #[test]
    fn test_new_rejects_misplaced_provider() {
        let mut providers = MetricTable::from_fn(|metric| {
            Arc::new(ConstantProvider::placeholder(metric)) as Arc<dyn MetricProvider>
        });
        providers.income = Arc::new(ConstantProvider::new(Metric::CrimeRate, 1.0));

        assert!(matches!(
            NeighborhoodAggregator::new(providers),
            Err(AppError::InternalError(_))
        ));
    }
}
