//! Livability API Library
//!
//! Scores how pleasant an address is to live in. An address is geocoded and
//! validated, eight neighborhood metrics are gathered from public APIs (with
//! fallbacks and placeholders), and the weighted, normalized sum is mapped to a
//! rating.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Scoring pipeline.
//! - `integrations`: Upstream API clients and reference data.
//! - `aggregator`: Concurrent collection of all metrics for an address.
//! - `circuit_breaker`: Per-upstream circuit breakers.
//! - `config`: Configuration management.
//! - `countries`: Country reference table and fuzzy lookup.
//! - `errors`: Error handling types.
//! - `evaluator`: Single and batch evaluation.
//! - `handlers`: HTTP request handlers.
//! - `models`: Metrics, ratings and request/response bodies.
//! - `normalize`: Min/max normalization.
//! - `providers`: Metric providers and fallback chains.
//! - `scoring`: Weights, ranges and the scoring engine.
//! - `services`: Upstream HTTP clients (geocoding, density, crime, buildings, income).
//! - `validator`: Address validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod aggregator;
pub mod circuit_breaker;
pub mod config;
pub mod countries;
pub mod errors;
pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod scoring;
pub mod services;
pub mod validator;
