use crate::aggregator::NeighborhoodAggregator;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    AddressDetails, BatchEntry, BatchOutcome, EvaluationResult, SingleAddressResponse,
};
use crate::scoring::ScoringEngine;
use crate::services::NominatimService;
use crate::validator::{AddressValidator, Validation};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Addresses fetched concurrently in a batch.
const BATCH_CONCURRENCY: usize = 4;

/// Validate, aggregate and score addresses.
#[derive(Clone)]
pub struct Evaluator {
    validator: AddressValidator,
    aggregator: NeighborhoodAggregator,
    engine: ScoringEngine,
}

impl Evaluator {
    pub fn new(
        validator: AddressValidator,
        aggregator: NeighborhoodAggregator,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            validator,
            aggregator,
            engine,
        }
    }

    /// Wires the HTTP-backed geocoder and metric sources with default scoring.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let geocoder = Arc::new(NominatimService::new(config)?);
        Ok(Self::new(
            AddressValidator::new(geocoder),
            NeighborhoodAggregator::from_config(config)?,
            ScoringEngine::default(),
        ))
    }

    async fn score(&self, details: &AddressDetails) -> EvaluationResult {
        let record = self.aggregator.collect(details).await;
        let result = self.engine.evaluate(&record);
        tracing::debug!(
            "Scored {:?} ({}): {:.4} {}",
            details.coordinates(),
            details.place_type,
            result.score,
            result.rating
        );
        result
    }

    /// A rejected address yields its message; geocoder outages are returned as errors.
    pub async fn evaluate_single(&self, address: &str) -> Result<SingleAddressResponse, AppError> {
        match self.validator.validate(address).await? {
            Validation::Rejected(rejection) => {
                Ok(SingleAddressResponse::Rejected(rejection.to_string()))
            }
            Validation::Valid(details) => Ok(SingleAddressResponse::Evaluated(
                self.score(&details).await,
            )),
        }
    }

    /// One entry per input, in input order.
    ///
    /// Validation runs sequentially. Accepted addresses are then fetched and
    /// scored with up to [`BATCH_CONCURRENCY`] in flight. A rejected address,
    /// or one whose geocoding failed, gets an `{"error": ...}` entry and is
    /// never fetched. Geocoder failures carry the client-facing outage message,
    /// never the upstream error text.
    pub async fn evaluate_many(&self, addresses: &[String]) -> Vec<BatchEntry> {
        let mut validated = Vec::with_capacity(addresses.len());
        for address in addresses {
            let outcome = match self.validator.validate(address).await {
                Ok(Validation::Valid(details)) => Ok(details),
                Ok(Validation::Rejected(rejection)) => Err(rejection.to_string()),
                Err(e) => {
                    tracing::warn!("Geocoding failed for {}: {}", address, e);
                    Err(e.client_message())
                }
            };
            validated.push((address.clone(), outcome));
        }

        stream::iter(validated)
            .map(|(address, outcome)| async move {
                let data = match outcome {
                    Ok(details) => BatchOutcome::Evaluated(self.score(&details).await),
                    Err(error) => BatchOutcome::Rejected { error },
                };
                BatchEntry { address, data }
            })
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }
}
