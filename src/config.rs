use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub nominatim_base_url: String,
    pub teleport_base_url: String,
    pub worldbank_base_url: String,
    pub police_base_url: String,
    pub overpass_base_url: String,
    pub income_base_url: String,
    pub income_api_key: String,
    /// Upper bound on every outbound call.
    pub http_timeout_secs: u64,
    /// `YYYY-MM` month queried from the crime API.
    pub crime_reference_month: String,
    /// Year queried for national population and land area.
    pub country_reference_year: u16,
    pub building_radius_m: u32,
    pub user_agent: String,
    pub cors_allowed_origin: Option<String>,
    /// Sustained requests per second allowed per client IP.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

const NANOS_PER_SECOND: u64 = 1_000_000_000;

fn base_url(var: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn number<T: std::str::FromStr>(var: &str, default: &str) -> anyhow::Result<T> {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a valid number", var))
}

/// Checks that a month string looks like `2025-02`.
pub fn validate_month(month: &str) -> anyhow::Result<()> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("CRIME_REFERENCE_MONTH must be formatted as YYYY-MM"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: number("PORT", "8000")
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            nominatim_base_url: base_url(
                "NOMINATIM_BASE_URL",
                "https://nominatim.openstreetmap.org",
            )?,
            teleport_base_url: base_url("TELEPORT_BASE_URL", "https://api.teleport.org/api")?,
            worldbank_base_url: base_url("WORLDBANK_BASE_URL", "http://api.worldbank.org/v2")?,
            police_base_url: base_url("POLICE_BASE_URL", "https://data.police.uk/api")?,
            overpass_base_url: base_url("OVERPASS_BASE_URL", "https://overpass-api.de/api")?,
            income_base_url: base_url(
                "INCOME_BASE_URL",
                "https://crystalroof.co.uk/customer-api",
            )?,
            income_api_key: std::env::var("INCOME_API_KEY")
                .unwrap_or_else(|_| "DEMO".to_string())
                .trim()
                .to_string(),
            http_timeout_secs: number("HTTP_TIMEOUT_SECS", "5")?,
            crime_reference_month: std::env::var("CRIME_REFERENCE_MONTH")
                .unwrap_or_else(|_| "2025-02".to_string()),
            country_reference_year: number("COUNTRY_REFERENCE_YEAR", "2021")?,
            building_radius_m: number("BUILDING_RADIUS_M", "200")?,
            user_agent: std::env::var("USER_AGENT")
                .unwrap_or_else(|_| "door-to-door-service-evaluator/1.0".to_string()),
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            rate_limit_per_second: number("RATE_LIMIT_PER_SECOND", "10")?,
            rate_limit_burst: number("RATE_LIMIT_BURST", "20")?,
        };

        config.validate()?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Nominatim Base URL: {}", config.nominatim_base_url);
        tracing::debug!("Teleport Base URL: {}", config.teleport_base_url);
        tracing::debug!("World Bank Base URL: {}", config.worldbank_base_url);
        tracing::debug!("Police Base URL: {}", config.police_base_url);
        tracing::debug!("Overpass Base URL: {}", config.overpass_base_url);
        if let Some(ref origin) = config.cors_allowed_origin {
            tracing::info!("CORS restricted to origin: {}", origin);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Checks the ranges that `from_env` cannot express through parsing alone.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.income_api_key.is_empty() {
            anyhow::bail!("INCOME_API_KEY cannot be empty");
        }
        if !(1..=60).contains(&self.http_timeout_secs) {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be between 1 and 60");
        }
        validate_month(&self.crime_reference_month)?;
        if !(1960..=2100).contains(&self.country_reference_year) {
            anyhow::bail!("COUNTRY_REFERENCE_YEAR must be between 1960 and 2100");
        }
        if self.building_radius_m == 0 {
            anyhow::bail!("BUILDING_RADIUS_M must be greater than zero");
        }
        if self.user_agent.trim().is_empty() {
            anyhow::bail!("USER_AGENT cannot be empty");
        }
        if self.rate_limit_per_second == 0 || self.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be greater than zero");
        }
        if self.rate_limit_per_second > NANOS_PER_SECOND {
            anyhow::bail!("RATE_LIMIT_PER_SECOND cannot exceed {}", NANOS_PER_SECOND);
        }
        Ok(())
    }

    /// Time to replenish one rate limiter token, so that
    /// `rate_limit_per_second` requests are admitted per second once the burst is spent.
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_nanos(NANOS_PER_SECOND / self.rate_limit_per_second.max(1))
    }

    /// Configuration with every upstream pointed at one base URL, for mock servers.
    pub fn for_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            port: 0,
            nominatim_base_url: base.clone(),
            teleport_base_url: base.clone(),
            worldbank_base_url: base.clone(),
            police_base_url: base.clone(),
            overpass_base_url: base.clone(),
            income_base_url: base,
            income_api_key: "DEMO".to_string(),
            http_timeout_secs: 2,
            crime_reference_month: "2025-02".to_string(),
            country_reference_year: 2021,
            building_radius_m: 200,
            user_agent: "livability-api-tests/0.1".to_string(),
            cors_allowed_origin: None,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}
