//! Clients for the upstream APIs the evaluation pipeline consumes.
//!
//! Each upstream is described by a small async trait so the pipeline can be
//! exercised against fakes; the `*Service` structs are the HTTP implementations.

use crate::circuit_breaker::{create_upstream_circuit_breaker, guarded, UpstreamBreaker};
use crate::config::Config;
use crate::countries;
use crate::errors::{AppError, ResultExt};
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

// ============ Collaborator Contracts ============

/// Best geocoding match for a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub place_type: String,
    pub lat: f64,
    pub lon: f64,
    /// Administrative fields (country, city, postcode, ...).
    pub address: BTreeMap<String, String>,
}

/// Population and land area of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaPopulation {
    pub population: f64,
    pub area_km2: f64,
}

impl AreaPopulation {
    /// People per km², truncated to a whole number. `None` when either figure is unusable.
    pub fn density(&self) -> Option<f64> {
        if self.population > 0.0 && self.area_km2 > 0.0 {
            Some((self.population / self.area_km2).trunc())
        } else {
            None
        }
    }
}

/// A single reported crime.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Incident {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
}

/// A building footprint, reduced to its `building` tag (lower-cased, empty when absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    pub building_tag: String,
}

#[async_trait]
pub trait GeocodingLookup: Send + Sync {
    /// `Ok(None)` when nothing matched.
    async fn lookup(&self, query: &str) -> Result<Option<GeocodeCandidate>, AppError>;
}

#[async_trait]
pub trait UrbanDensityLookup: Send + Sync {
    /// `Ok(None)` when the coordinates are outside any known urban area.
    async fn urban_area(&self, lat: f64, lon: f64) -> Result<Option<AreaPopulation>, AppError>;
}

#[async_trait]
pub trait CountryDensityLookup: Send + Sync {
    /// `Ok(None)` when the name cannot be resolved to a country or the figures are missing.
    async fn country(&self, country_name: &str) -> Result<Option<AreaPopulation>, AppError>;
}

#[async_trait]
pub trait CrimeLookup: Send + Sync {
    async fn incidents(&self, lat: f64, lon: f64, month: &str) -> Result<Vec<Incident>, AppError>;
}

#[async_trait]
pub trait BuildingFootprintLookup: Send + Sync {
    async fn buildings(&self, lat: f64, lon: f64, radius_m: u32)
        -> Result<Vec<Building>, AppError>;
}

#[async_trait]
pub trait IncomeLookup: Send + Sync {
    /// Fails with [`AppError::DataNotFound`] when the response lacks the income field.
    async fn mean_household_income(&self, postcode: &str) -> Result<f64, AppError>;
}

// ============ HTTP Plumbing ============

/// Builds the shared HTTP client: bounded timeout and an identifying User-Agent.
pub fn http_client(config: &Config) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))
}

/// Sends `request` and decodes a JSON body, mapping transport, status and shape failures.
async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    upstream: &str,
) -> Result<T, AppError> {
    let response = request
        .send()
        .await
        .with_context(|| format!("{} request failed", upstream))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!("{} returned error {}: {}", upstream, status, error_text);
        return Err(AppError::ExternalApiError(format!(
            "{} returned status {}: {}",
            upstream, status, error_text
        )));
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", upstream))
}

// ============ Nominatim (geocoding) ============

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(rename = "type", default)]
    place_type: String,
    #[serde(default)]
    address: BTreeMap<String, Value>,
}

impl NominatimPlace {
    fn into_candidate(self) -> Result<GeocodeCandidate, AppError> {
        let parse = |raw: &str, field: &str| {
            raw.trim().parse::<f64>().map_err(|_| {
                AppError::ExternalApiError(format!("Nominatim returned a non-numeric {}", field))
            })
        };
        let lat = parse(&self.lat, "lat")?;
        let lon = parse(&self.lon, "lon")?;

        let address = self
            .address
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Number(n) => Some((key, n.to_string())),
                _ => None,
            })
            .collect();

        Ok(GeocodeCandidate {
            place_type: self.place_type,
            lat,
            lon,
            address,
        })
    }
}

/// OpenStreetMap Nominatim search client.
///
/// Results (including "no match") are cached for an hour so a batch that
/// repeats an address only hits the public instance once.
pub struct NominatimService {
    client: Client,
    base_url: String,
    breaker: UpstreamBreaker,
    cache: Cache<String, Option<GeocodeCandidate>>,
}

impl NominatimService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.nominatim_base_url.clone(),
            breaker: create_upstream_circuit_breaker(),
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
        })
    }
}

#[async_trait]
impl GeocodingLookup for NominatimService {
    async fn lookup(&self, query: &str) -> Result<Option<GeocodeCandidate>, AppError> {
        let cache_key = query.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!("Geocoding cache HIT for: {}", query);
            return Ok(cached);
        }

        let url = format!("{}/search", self.base_url);
        tracing::debug!("Nominatim search: {} q={}", url, query);

        let request = self
            .client
            .get(&url)
            .header("Accept-Language", "en")
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ]);

        let places: Vec<NominatimPlace> =
            guarded(&self.breaker, "Nominatim", fetch_json(request, "Nominatim")).await?;

        let candidate = match places.into_iter().next() {
            Some(place) => Some(place.into_candidate()?),
            None => None,
        };

        self.cache.insert(cache_key, candidate.clone()).await;
        Ok(candidate)
    }
}

// ============ Teleport (urban areas) ============

/// Teleport urban-area client: coordinates → urban area → population and area.
pub struct TeleportService {
    client: Client,
    base_url: String,
    breaker: UpstreamBreaker,
}

impl TeleportService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.teleport_base_url.clone(),
            breaker: create_upstream_circuit_breaker(),
        })
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<Option<AreaPopulation>, AppError> {
        let locations_url = format!("{}/locations/{},{}/", self.base_url, lat, lon);
        tracing::debug!("Teleport location lookup: {}", locations_url);
        let location: Value =
            fetch_json(self.client.get(&locations_url), "Teleport locations").await?;

        let Some(href) = location
            .pointer("/_links/ua:item/href")
            .and_then(Value::as_str)
        else {
            tracing::debug!("No urban area for {},{}", lat, lon);
            return Ok(None);
        };

        let Some(slug) = urban_area_slug(href) else {
            return Err(AppError::ExternalApiError(format!(
                "Unexpected Teleport urban area link: {}",
                href
            )));
        };

        let details_url = format!("{}/urban_areas/{}/details/", self.base_url, slug);
        tracing::debug!("Teleport urban area details: {}", details_url);
        let details: Value =
            fetch_json(self.client.get(&details_url), "Teleport details").await?;

        Ok(parse_urban_area_details(&details))
    }
}

/// Extracts the urban-area identifier from a link such as
/// `https://api.teleport.org/api/urban_areas/slug:london/`.
fn urban_area_slug(href: &str) -> Option<&str> {
    let mut segments = href.rsplit('/');
    let last = segments.next()?;
    let slug = if last.is_empty() { segments.next()? } else { last };
    (!slug.is_empty()).then_some(slug)
}

fn parse_urban_area_details(details: &Value) -> Option<AreaPopulation> {
    let find = |category_label: &str, item_label: &str| {
        details
            .get("categories")?
            .as_array()?
            .iter()
            .filter(|c| c.get("label").and_then(Value::as_str) == Some(category_label))
            .filter_map(|c| c.get("data").and_then(Value::as_array))
            .flatten()
            .find(|item| item.get("label").and_then(Value::as_str) == Some(item_label))
            .and_then(|item| item.get("float_value"))
            .and_then(Value::as_f64)
    };

    let population = find("Population", "Population")?;
    let area_km2 = find("Geography", "Area in square kilometers")?;
    Some(AreaPopulation {
        population,
        area_km2,
    })
}

#[async_trait]
impl UrbanDensityLookup for TeleportService {
    async fn urban_area(&self, lat: f64, lon: f64) -> Result<Option<AreaPopulation>, AppError> {
        guarded(&self.breaker, "Teleport", self.fetch(lat, lon)).await
    }
}

// ============ World Bank (countries) ============

/// World Bank indicators client for national population and land area.
pub struct WorldBankService {
    client: Client,
    base_url: String,
    year: u16,
    breaker: UpstreamBreaker,
}

impl WorldBankService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.worldbank_base_url.clone(),
            year: config.country_reference_year,
            breaker: create_upstream_circuit_breaker(),
        })
    }

    async fn indicator(&self, alpha3: &str, indicator: &str) -> Result<Option<f64>, AppError> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url, alpha3, indicator
        );
        let year = self.year.to_string();
        tracing::debug!("World Bank indicator: {} date={}", url, year);

        let body: Value = fetch_json(
            self.client
                .get(&url)
                .query(&[("format", "json"), ("date", year.as_str())]),
            "World Bank",
        )
        .await?;

        Ok(body.pointer("/1/0/value").and_then(Value::as_f64))
    }

    async fn fetch(&self, alpha3: &str) -> Result<Option<AreaPopulation>, AppError> {
        let Some(population) = self.indicator(alpha3, "SP.POP.TOTL").await? else {
            return Ok(None);
        };
        let Some(area_km2) = self.indicator(alpha3, "AG.LND.TOTL.K2").await? else {
            return Ok(None);
        };
        Ok(Some(AreaPopulation {
            population,
            area_km2,
        }))
    }
}

#[async_trait]
impl CountryDensityLookup for WorldBankService {
    async fn country(&self, country_name: &str) -> Result<Option<AreaPopulation>, AppError> {
        let Some(country) = countries::search_fuzzy(country_name) else {
            tracing::debug!("Could not resolve country name: {}", country_name);
            return Ok(None);
        };
        guarded(&self.breaker, "World Bank", self.fetch(country.alpha3)).await
    }
}

// ============ data.police.uk (crime) ============

/// Street-level crime client; the API searches a one-mile radius around the point.
pub struct PoliceService {
    client: Client,
    base_url: String,
    breaker: UpstreamBreaker,
}

impl PoliceService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.police_base_url.clone(),
            breaker: create_upstream_circuit_breaker(),
        })
    }
}

#[async_trait]
impl CrimeLookup for PoliceService {
    async fn incidents(&self, lat: f64, lon: f64, month: &str) -> Result<Vec<Incident>, AppError> {
        let url = format!("{}/crimes-street/all-crime", self.base_url);
        let (lat, lng) = (lat.to_string(), lon.to_string());
        tracing::debug!("Police crimes lookup: {} lat={} lng={} date={}", url, lat, lng, month);

        let request = self
            .client
            .get(&url)
            .query(&[("lat", lat.as_str()), ("lng", lng.as_str()), ("date", month)]);

        guarded(&self.breaker, "Police", fetch_json(request, "Police")).await
    }
}

// ============ Overpass (building footprints) ============

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// Builds the Overpass QL query for building ways around a point.
pub fn building_query(lat: f64, lon: f64, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:25];(way[\"building\"](around:{},{},{}););out body;",
        radius_m, lat, lon
    )
}

/// OpenStreetMap Overpass client.
pub struct OverpassService {
    client: Client,
    base_url: String,
    breaker: UpstreamBreaker,
}

impl OverpassService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.overpass_base_url.clone(),
            breaker: create_upstream_circuit_breaker(),
        })
    }
}

#[async_trait]
impl BuildingFootprintLookup for OverpassService {
    async fn buildings(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
    ) -> Result<Vec<Building>, AppError> {
        let url = format!("{}/interpreter", self.base_url);
        let query = building_query(lat, lon, radius_m);
        tracing::debug!("Overpass query: {}", query);

        let request = self.client.get(&url).query(&[("data", query.as_str())]);
        let response: OverpassResponse =
            guarded(&self.breaker, "Overpass", fetch_json(request, "Overpass")).await?;

        Ok(response
            .elements
            .into_iter()
            .map(|element| Building {
                building_tag: element
                    .tags
                    .get("building")
                    .map(|tag| tag.to_lowercase())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

// ============ Crystal Roof (income) ============

/// Removes spaces and upper-cases a postcode (`mk9 3hg` → `MK93HG`).
pub fn clean_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Mean household income by postcode.
pub struct CrystalRoofService {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: UpstreamBreaker,
}

impl CrystalRoofService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.income_base_url.clone(),
            api_key: config.income_api_key.clone(),
            breaker: create_upstream_circuit_breaker(),
        })
    }
}

#[async_trait]
impl IncomeLookup for CrystalRoofService {
    async fn mean_household_income(&self, postcode: &str) -> Result<f64, AppError> {
        let url = format!(
            "{}/income/mean-household-income/postcode/v1/{}",
            self.base_url,
            clean_postcode(postcode)
        );
        // Redact key from logs
        tracing::debug!("Income lookup: {}?api_key=[REDACTED]", url);

        let request = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())]);
        let body: Value =
            guarded(&self.breaker, "Crystal Roof", fetch_json(request, "Crystal Roof")).await?;

        body.get("mean_household_income")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                AppError::DataNotFound("Income data not found in the API response.".to_string())
            })
    }
}
