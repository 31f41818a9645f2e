use crate::errors::AppError;
use failsafe::backoff::Exponential;
use failsafe::failure_policy::ConsecutiveFailures;
use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::future::Future;
use std::time::Duration;

/// Circuit breaker shared by all calls to one upstream API.
pub type UpstreamBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Creates a circuit breaker for one upstream API.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While open, calls fail fast with [`AppError::ExternalApiError`], which
/// metric providers absorb into their fallback values.
pub fn create_upstream_circuit_breaker() -> UpstreamBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

/// Runs `call` through `breaker`, reporting an open circuit as an upstream error.
pub async fn guarded<T, F>(
    breaker: &UpstreamBreaker,
    upstream: &str,
    call: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match breaker.call(call).await {
        Ok(value) => Ok(value),
        Err(failsafe::Error::Inner(e)) => Err(e),
        Err(failsafe::Error::Rejected) => {
            tracing::warn!("{} circuit open, skipping call", upstream);
            Err(AppError::ExternalApiError(format!(
                "{} circuit breaker is open",
                upstream
            )))
        }
    }
}
