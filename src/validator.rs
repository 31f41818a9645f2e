use crate::errors::AppError;
use crate::models::AddressDetails;
use crate::services::GeocodingLookup;
use std::fmt;
use std::sync::Arc;

/// Place types fine-grained enough to evaluate.
pub const ACCEPTED_PLACE_TYPES: [&str; 3] = ["residential", "postcode", "city"];

/// Why an address was turned away. Its `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The geocoder had no match.
    NotFound { address: String },
    /// The match is broader than a city (state, country) or unclassified.
    TooBroad { address: String, place_type: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotFound { address } => {
                write!(f, "The address: {} was not found", address)
            }
            Rejection::TooBroad { address, .. } => write!(
                f,
                "The address: {} is invalid, please enter a residential address",
                address
            ),
        }
    }
}

/// Outcome of validating one address.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(AddressDetails),
    Rejected(Rejection),
}

/// Resolves free text to an [`AddressDetails`] via a single geocoding lookup.
#[derive(Clone)]
pub struct AddressValidator {
    geocoder: Arc<dyn GeocodingLookup>,
}

impl AddressValidator {
    pub fn new(geocoder: Arc<dyn GeocodingLookup>) -> Self {
        Self { geocoder }
    }

    /// Upstream failures are errors; unmatched or overly broad addresses are [`Validation::Rejected`].
    pub async fn validate(&self, address: &str) -> Result<Validation, AppError> {
        if address.trim().is_empty() {
            return Ok(Validation::Rejected(Rejection::NotFound {
                address: address.to_string(),
            }));
        }

        let Some(candidate) = self.geocoder.lookup(address).await? else {
            tracing::info!("Address not found: {}", address);
            return Ok(Validation::Rejected(Rejection::NotFound {
                address: address.to_string(),
            }));
        };

        if !ACCEPTED_PLACE_TYPES.contains(&candidate.place_type.as_str()) {
            tracing::info!(
                "Address rejected as too broad ({}): {}",
                candidate.place_type,
                address
            );
            return Ok(Validation::Rejected(Rejection::TooBroad {
                address: address.to_string(),
                place_type: candidate.place_type,
            }));
        }

        Ok(Validation::Valid(AddressDetails {
            fields: candidate.address,
            lat: candidate.lat,
            lon: candidate.lon,
            place_type: candidate.place_type,
        }))
    }
}
