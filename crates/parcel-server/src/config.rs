//! Environment-derived service configuration.

use std::time::Duration;

/// Runtime configuration, read once at startup. Every knob has a default so
/// a local instance starts with nothing but `PARCEL_DATABASE_URL` exported.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub monitor_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let listen_addr =
            std::env::var("PARCEL_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
        let database_url = std::env::var("PARCEL_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/parcel".into());
        let db_max_connections = std::env::var("PARCEL_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(5);
        let monitor_interval_secs = std::env::var("PARCEL_MONITOR_INTERVAL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(5);

        Self {
            listen_addr,
            database_url,
            db_max_connections,
            monitor_interval: Duration::from_secs(monitor_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        // The PARCEL_* names are service-specific; a test environment does
        // not set them.
        let config = Config::from_env();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.monitor_interval, Duration::from_secs(5));
    }
}
