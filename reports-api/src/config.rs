//! API Configuration Module
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use std::net::SocketAddr;
use std::time::Duration;

use reports_core::{DEFAULT_ITEMS_QUERY_COUNT, MAX_ITEMS_QUERY_COUNT};

use crate::error::{ApiError, ApiResult};

/// Route prefix every REST endpoint hangs off.
pub const DEFAULT_BASE_URI: &str = "/_opendistro/_reports";
pub const DEFAULT_DEFINITIONS_INDEX: &str = ".opendistro-reports-definitions";
pub const DEFAULT_INSTANCES_INDEX: &str = ".opendistro-reports-instances";

// ============================================================================
// REPORTS CONFIGURATION
// ============================================================================

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportsConfig {
    /// Interface to bind.
    pub bind: String,

    pub port: u16,

    /// Route prefix, without a trailing slash.
    pub base_uri: String,

    /// Backend index holding report definitions.
    pub definitions_index: String,

    /// Backend index holding report instances.
    pub instances_index: String,

    /// Page size used when a list request names none. Always in
    /// `1..=MAX_ITEMS_QUERY_COUNT`.
    pub default_items_query_count: u32,

    /// Per-request timeout applied by the HTTP layer.
    pub request_timeout: Duration,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            base_uri: DEFAULT_BASE_URI.to_string(),
            definitions_index: DEFAULT_DEFINITIONS_INDEX.to_string(),
            instances_index: DEFAULT_INSTANCES_INDEX.to_string(),
            default_items_query_count: DEFAULT_ITEMS_QUERY_COUNT,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ReportsConfig {
    /// Create ReportsConfig from environment variables.
    ///
    /// Environment variables:
    /// - `REPORTS_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `REPORTS_API_PORT` or `PORT`: Listen port (default: 3000)
    /// - `REPORTS_BASE_URI`: Route prefix (default: /_opendistro/_reports)
    /// - `REPORTS_DEFINITIONS_INDEX`: Definitions index name
    /// - `REPORTS_INSTANCES_INDEX`: Instances index name
    /// - `REPORTS_DEFAULT_ITEMS_QUERY_COUNT`: Default page size, clamped to 1..=1000 (default: 100)
    /// - `REPORTS_REQUEST_TIMEOUT_SECS`: Request timeout (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparseable values fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("REPORTS_API_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let base_uri = lookup("REPORTS_BASE_URI")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| s.starts_with('/'))
            .unwrap_or(defaults.base_uri);

        let default_items_query_count = lookup("REPORTS_DEFAULT_ITEMS_QUERY_COUNT")
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| n.clamp(1, MAX_ITEMS_QUERY_COUNT as u32))
            .unwrap_or(defaults.default_items_query_count);

        let request_timeout = lookup("REPORTS_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            bind: lookup("REPORTS_API_BIND").unwrap_or(defaults.bind),
            port,
            base_uri,
            definitions_index: lookup("REPORTS_DEFINITIONS_INDEX")
                .unwrap_or(defaults.definitions_index),
            instances_index: lookup("REPORTS_INSTANCES_INDEX").unwrap_or(defaults.instances_index),
            default_items_query_count,
            request_timeout,
        }
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ApiError::internal_error(format!("Invalid bind address: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportsConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ReportsConfig::default());
        assert_eq!(config.base_uri, "/_opendistro/_reports");
        assert_eq!(config.default_items_query_count, 100);
    }

    #[test]
    fn test_port_fallback_and_priority() {
        let config = ReportsConfig::from_lookup(lookup_from(&[("PORT", "8080")]));
        assert_eq!(config.port, 8080);

        let config = ReportsConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("REPORTS_API_PORT", "9200"),
        ]));
        assert_eq!(config.port, 9200);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config =
            ReportsConfig::from_lookup(lookup_from(&[("REPORTS_DEFAULT_ITEMS_QUERY_COUNT", "0")]));
        assert_eq!(config.default_items_query_count, 1);

        let config = ReportsConfig::from_lookup(lookup_from(&[(
            "REPORTS_DEFAULT_ITEMS_QUERY_COUNT",
            "50000",
        )]));
        assert_eq!(config.default_items_query_count, 1000);
    }

    #[test]
    fn test_base_uri_normalized() {
        let config =
            ReportsConfig::from_lookup(lookup_from(&[("REPORTS_BASE_URI", "/_plugins/_reports/")]));
        assert_eq!(config.base_uri, "/_plugins/_reports");

        let config = ReportsConfig::from_lookup(lookup_from(&[("REPORTS_BASE_URI", "reports")]));
        assert_eq!(config.base_uri, DEFAULT_BASE_URI);
    }

    #[test]
    fn test_socket_addr() -> ApiResult<()> {
        let config = ReportsConfig::from_lookup(lookup_from(&[("REPORTS_API_BIND", "127.0.0.1")]));
        assert_eq!(config.socket_addr()?.port(), 3000);
        Ok(())
    }
}
