use std::env;
use std::time::Duration;

use payrelay::{
    CrmCredentials, Environment, ProviderCredentials, DIALEDIN_UPDATE_LEAD_URL,
};
use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

/// Names of the credential variables checked by `/api/test-config`.
pub const REQUIRED_VARS: [&str; 5] = [
    "NUVEI_MERCHANT_ID",
    "NUVEI_SITE_ID",
    "NUVEI_SECRET_KEY",
    "DIALEDIN_TOKEN",
    "DIALEDIN_ACCID",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Interval after which one request slot is replenished.
    pub fn replenish_interval(&self) -> Duration {
        self.window / self.max_requests.max(1)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Clone)]
pub struct RelayConfig {
    pub environment: Environment,
    pub nuvei_merchant_id: Option<String>,
    pub nuvei_site_id: Option<String>,
    pub nuvei_secret_key: Option<String>,
    /// Nuvei endpoint; defaults to the one matching `environment`.
    pub nuvei_url: String,
    pub dialedin_token: Option<String>,
    pub dialedin_accid: Option<String>,
    pub dialedin_url: String,
    pub port: u16,
    /// CORS allowed origins for `/api`
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("environment", &self.environment)
            .field("nuvei_merchant_id", &self.nuvei_merchant_id)
            .field("nuvei_site_id", &self.nuvei_site_id)
            .field(
                "nuvei_secret_key",
                &self.nuvei_secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("nuvei_url", &self.nuvei_url)
            .field(
                "dialedin_token",
                &self.dialedin_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("dialedin_accid", &self.dialedin_accid)
            .field("dialedin_url", &self.dialedin_url)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit", &self.rate_limit)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        let environment = Environment::default();
        Self {
            environment,
            nuvei_merchant_id: None,
            nuvei_site_id: None,
            nuvei_secret_key: None,
            nuvei_url: environment.tokenization_url().to_string(),
            dialedin_token: None,
            dialedin_accid: None,
            dialedin_url: DIALEDIN_UPDATE_LEAD_URL.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            rate_limit: RateLimitConfig::default(),
            metrics_token: None,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match var("RELAY_ENV") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidEnvironment)?,
            None => Environment::default(),
        };

        let nuvei_url = var("NUVEI_TOKENIZATION_URL")
            .unwrap_or_else(|| environment.tokenization_url().to_string());
        Url::parse(&nuvei_url).map_err(|_| ConfigError::InvalidUrl(nuvei_url.clone()))?;

        let dialedin_url =
            var("DIALEDIN_UPDATE_URL").unwrap_or_else(|| DIALEDIN_UPDATE_LEAD_URL.to_string());
        Url::parse(&dialedin_url).map_err(|_| ConfigError::InvalidUrl(dialedin_url.clone()))?;

        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        let max_requests = parse_or(
            var("RATE_LIMIT_MAX_REQUESTS"),
            "RATE_LIMIT_MAX_REQUESTS",
            DEFAULT_RATE_LIMIT_MAX_REQUESTS,
        )?;
        let window_secs = parse_or(
            var("RATE_LIMIT_WINDOW_SECS"),
            "RATE_LIMIT_WINDOW_SECS",
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        )?;
        if max_requests == 0 || window_secs == 0 {
            return Err(ConfigError::InvalidNumber("RATE_LIMIT_*", "0".to_string()));
        }

        let config = Self {
            environment,
            nuvei_merchant_id: var("NUVEI_MERCHANT_ID"),
            nuvei_site_id: var("NUVEI_SITE_ID"),
            nuvei_secret_key: var("NUVEI_SECRET_KEY"),
            nuvei_url,
            dialedin_token: var("DIALEDIN_TOKEN"),
            dialedin_accid: var("DIALEDIN_ACCID"),
            dialedin_url,
            port,
            allowed_origins,
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
            metrics_token: var("METRICS_TOKEN"),
        };

        if config.provider_credentials().is_none() {
            tracing::warn!("Nuvei credentials incomplete, tokenization will issue mock tokens");
        }
        if config.crm_credentials().is_none() {
            tracing::warn!("DialedIn credentials incomplete, lead updates will be skipped");
        }
        if config.allowed_origins.iter().any(|o| o == "*") && environment.is_production() {
            tracing::warn!("wildcard CORS origin '*' configured in production");
        }

        Ok(config)
    }

    /// Nuvei credentials, if all three values are present.
    pub fn provider_credentials(&self) -> Option<ProviderCredentials> {
        Some(ProviderCredentials {
            merchant_id: self.nuvei_merchant_id.clone()?,
            site_id: self.nuvei_site_id.clone()?,
            secret_key: self.nuvei_secret_key.clone()?,
        })
    }

    /// DialedIn credentials, if both values are present.
    pub fn crm_credentials(&self) -> Option<CrmCredentials> {
        Some(CrmCredentials {
            token: self.dialedin_token.clone()?,
            account_id: self.dialedin_accid.clone()?,
        })
    }

    /// Which of [`REQUIRED_VARS`] are unset.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let values = [
            &self.nuvei_merchant_id,
            &self.nuvei_site_id,
            &self.nuvei_secret_key,
            &self.dialedin_token,
            &self.dialedin_accid,
        ];
        REQUIRED_VARS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(name, raw)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid value for {0}: {1}")]
    InvalidNumber(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.nuvei_url, payrelay::NUVEI_SANDBOX_URL);
        assert_eq!(config.dialedin_url, DIALEDIN_UPDATE_LEAD_URL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(900));
        assert!(config.provider_credentials().is_none());
        assert_eq!(config.missing_required(), REQUIRED_VARS.to_vec());
    }

    #[test]
    fn test_production_selects_live_endpoint() {
        let config = load(&[("RELAY_ENV", "production")]).unwrap();
        assert_eq!(config.nuvei_url, payrelay::NUVEI_PRODUCTION_URL);
    }

    #[test]
    fn test_endpoint_override() {
        let config = load(&[
            ("RELAY_ENV", "production"),
            ("NUVEI_TOKENIZATION_URL", "http://127.0.0.1:9000/tokenize"),
        ])
        .unwrap();
        assert_eq!(config.nuvei_url, "http://127.0.0.1:9000/tokenize");
    }

    #[test]
    fn test_credentials_require_all_parts() {
        let config = load(&[("NUVEI_MERCHANT_ID", "m"), ("NUVEI_SITE_ID", "s")]).unwrap();
        assert!(config.provider_credentials().is_none());
        assert_eq!(
            config.missing_required(),
            vec!["NUVEI_SECRET_KEY", "DIALEDIN_TOKEN", "DIALEDIN_ACCID"]
        );

        let config = load(&[
            ("NUVEI_MERCHANT_ID", "m"),
            ("NUVEI_SITE_ID", "s"),
            ("NUVEI_SECRET_KEY", "k"),
            ("DIALEDIN_TOKEN", "t"),
            ("DIALEDIN_ACCID", "a"),
        ])
        .unwrap();
        assert!(config.provider_credentials().is_some());
        assert!(config.crm_credentials().is_some());
        assert!(config.missing_required().is_empty());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = load(&[("NUVEI_MERCHANT_ID", "  "), ("DIALEDIN_TOKEN", "")]).unwrap();
        assert!(config.nuvei_merchant_id.is_none());
        assert!(config.dialedin_token.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("RELAY_ENV", "staging")]),
            Err(ConfigError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::InvalidNumber("PORT", _))
        ));
        assert!(matches!(
            load(&[("DIALEDIN_UPDATE_URL", "not a url")]),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(load(&[("RATE_LIMIT_MAX_REQUESTS", "0")]).is_err());
    }

    #[test]
    fn test_origins_split() {
        let config = load(&[("ALLOWED_ORIGINS", "https://a.example, https://b.example,")]).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_replenish_interval() {
        let limit = RateLimitConfig::default();
        assert_eq!(limit.replenish_interval(), Duration::from_secs(9));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("NUVEI_SECRET_KEY", "very-secret"), ("DIALEDIN_TOKEN", "tok")]).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("\"tok\""));
    }
}
