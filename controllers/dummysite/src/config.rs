//! Controller configuration.
//!
//! Everything is read from environment variables once at start-up:
//!
//! | Variable | Default |
//! |---|---|
//! | `WATCH_NAMESPACE` (or `K8S_NAMESPACE`) | `default` |
//! | `WATCH_ALL_NAMESPACES` | `false` |
//! | `FETCH_TIMEOUT_SECS` | `10` |
//! | `INGRESS_DOMAIN` | `dummysite.io` |
//! | `SITE_IMAGE` | `nginx:alpine` |
//! | `MAX_CONCURRENT_RECONCILES` | `4` |
//! | `METRICS_PORT` | `5000` |

use crate::error::ControllerError;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_INGRESS_DOMAIN: &str = "dummysite.io";
const DEFAULT_SITE_IMAGE: &str = "nginx:alpine";
const DEFAULT_MAX_CONCURRENT_RECONCILES: usize = 4;
const DEFAULT_METRICS_PORT: u16 = 5000;

/// Runtime configuration for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    /// Upper bound for fetching a site's content
    pub fetch_timeout: Duration,
    /// Domain appended to the site name to form the ingress host
    pub ingress_domain: String,
    /// Web server image serving the fetched page
    pub site_image: String,
    /// Maximum number of sites reconciled at the same time
    pub max_concurrent_reconciles: usize,
    /// Port of the metrics and probe server
    pub metrics_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            ingress_domain: DEFAULT_INGRESS_DOMAIN.to_string(),
            site_image: DEFAULT_SITE_IMAGE.to_string(),
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let watch_all: bool = parse_or(get("WATCH_ALL_NAMESPACES"), "WATCH_ALL_NAMESPACES", false)?;
        let namespace = if watch_all {
            None
        } else {
            Some(
                get("WATCH_NAMESPACE")
                    .or_else(|| get("K8S_NAMESPACE"))
                    .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            )
        };

        let fetch_timeout_secs: u64 =
            parse_or(get("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        if fetch_timeout_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let max_concurrent_reconciles: usize = parse_or(
            get("MAX_CONCURRENT_RECONCILES"),
            "MAX_CONCURRENT_RECONCILES",
            DEFAULT_MAX_CONCURRENT_RECONCILES,
        )?;
        if max_concurrent_reconciles == 0 {
            return Err(ControllerError::InvalidConfig(
                "MAX_CONCURRENT_RECONCILES must be greater than zero".to_string(),
            ));
        }

        let ingress_domain = get("INGRESS_DOMAIN")
            .map(|d| d.trim_matches('.').to_string())
            .unwrap_or_else(|| DEFAULT_INGRESS_DOMAIN.to_string());

        Ok(Self {
            namespace,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            ingress_domain,
            site_image: get("SITE_IMAGE").unwrap_or_else(|| DEFAULT_SITE_IMAGE.to_string()),
            max_concurrent_reconciles,
            metrics_port: parse_or(get("METRICS_PORT"), "METRICS_PORT", DEFAULT_METRICS_PORT)?,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ControllerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| {
            ControllerError::InvalidConfig(format!("{key}='{raw}' is not valid: {e}"))
        }),
    }
}
