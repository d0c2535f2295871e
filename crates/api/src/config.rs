//! Service configuration loaded from environment variables.

use std::time::Duration;

use booking::{CircuitBreakerConfig, HttpClientConfig};

pub const BOOKING_SERVICE_PORT: u16 = 3000;
pub const HOTEL_SERVICE_PORT: u16 = 3001;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: 3000 for booking, 3001 for hotel)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
/// - `HOTEL_SERVICE_URL`, `HOTEL_CLIENT_TIMEOUT_MS`,
///   `HOTEL_CLIENT_MAX_RETRIES`, `HOTEL_CLIENT_BACKOFF_MS`: the booking
///   service's hotel client
/// - `HOTEL_CIRCUIT_FAILURE_THRESHOLD`, `HOTEL_CIRCUIT_OPEN_MS`: its
///   circuit breaker
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub hotel_service_url: String,
    pub hotel_client_timeout: Duration,
    pub hotel_client_max_retries: u32,
    pub hotel_client_backoff: Duration,
    pub hotel_circuit_failure_threshold: u32,
    pub hotel_circuit_open: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env(default_port: u16) -> Self {
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(default_port: u16, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::with_port(default_port);
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let millis = |key: &str, default: Duration| {
            number(key).map(Duration::from_millis).unwrap_or(default)
        };
        let count = |key: &str, default: u32| {
            number(key)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            hotel_service_url: lookup("HOTEL_SERVICE_URL").unwrap_or(defaults.hotel_service_url),
            hotel_client_timeout: millis("HOTEL_CLIENT_TIMEOUT_MS", defaults.hotel_client_timeout),
            hotel_client_max_retries: count(
                "HOTEL_CLIENT_MAX_RETRIES",
                defaults.hotel_client_max_retries,
            )
            .max(1),
            hotel_client_backoff: millis("HOTEL_CLIENT_BACKOFF_MS", defaults.hotel_client_backoff),
            hotel_circuit_failure_threshold: count(
                "HOTEL_CIRCUIT_FAILURE_THRESHOLD",
                defaults.hotel_circuit_failure_threshold,
            )
            .max(1),
            hotel_circuit_open: millis("HOTEL_CIRCUIT_OPEN_MS", defaults.hotel_circuit_open),
        }
    }

    fn with_port(port: u16) -> Self {
        let client = HttpClientConfig::default();
        let circuit = CircuitBreakerConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port,
            log_level: "info".to_string(),
            database_url: None,
            hotel_service_url: client.base_url,
            hotel_client_timeout: client.timeout,
            hotel_client_max_retries: client.max_attempts,
            hotel_client_backoff: client.initial_backoff,
            hotel_circuit_failure_threshold: circuit.failure_threshold,
            hotel_circuit_open: circuit.open_for,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings of the live hotel client.
    ///
    /// `HOTEL_CLIENT_MAX_RETRIES` counts attempts, the first included.
    pub fn http_client(&self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.hotel_service_url.clone(),
            timeout: self.hotel_client_timeout,
            max_attempts: self.hotel_client_max_retries,
            initial_backoff: self.hotel_client_backoff,
            max_backoff: HttpClientConfig::default()
                .max_backoff
                .max(self.hotel_client_backoff),
        }
    }

    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.hotel_circuit_failure_threshold,
            open_for: self.hotel_circuit_open,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_port(BOOKING_SERVICE_PORT)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(HOTEL_SERVICE_PORT, lookup(&[]));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.hotel_service_url, "http://127.0.0.1:3001");
        assert_eq!(config.hotel_client_timeout, Duration::from_millis(5000));
        assert_eq!(config.hotel_client_max_retries, 3);
        assert_eq!(config.hotel_circuit_failure_threshold, 5);
        assert_eq!(config.hotel_circuit_open, Duration::from_millis(30_000));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(
            BOOKING_SERVICE_PORT,
            lookup(&[
                ("PORT", "8080"),
                ("DATABASE_URL", "postgres://localhost/booking"),
                ("HOTEL_SERVICE_URL", "http://hotel:3001"),
                ("HOTEL_CLIENT_TIMEOUT_MS", "250"),
                ("HOTEL_CLIENT_MAX_RETRIES", "5"),
                ("HOTEL_CLIENT_BACKOFF_MS", "100"),
                ("HOTEL_CIRCUIT_OPEN_MS", "1000"),
            ]),
        );
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/booking")
        );

        let client = config.http_client();
        assert_eq!(client.base_url, "http://hotel:3001");
        assert_eq!(client.timeout, Duration::from_millis(250));
        assert_eq!(client.max_attempts, 5);
        assert_eq!(client.initial_backoff, Duration::from_millis(100));
        assert_eq!(client.max_backoff, Duration::from_millis(3000));

        let circuit = config.circuit_breaker();
        assert_eq!(circuit.failure_threshold, 5);
        assert_eq!(circuit.open_for, Duration::from_millis(1000));
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let config = Config::from_lookup(
            BOOKING_SERVICE_PORT,
            lookup(&[
                ("PORT", "http"),
                ("DATABASE_URL", "  "),
                ("HOTEL_CLIENT_MAX_RETRIES", "0"),
                ("HOTEL_CLIENT_TIMEOUT_MS", "soon"),
            ]),
        );
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.hotel_client_max_retries, 1);
        assert_eq!(config.hotel_client_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }
}
