//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use presence_types::{Coordinate, Venue, VenueId, VenueSecret, VenueStatus, VerificationParams};

use crate::RpcError;

/// Configuration for a presence service instance.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// HTTP API port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Allowed CORS origins. Empty disables CORS, `"*"` allows any origin.
    #[serde(default)]
    pub cors_allow_origins: Vec<String>,

    /// Whether to expose the Prometheus `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Code rotation and proximity parameters.
    #[serde(default)]
    pub verification: VerificationParams,

    /// Venues written to the store at startup. Meant for development setups;
    /// production venues arrive through onboarding.
    #[serde(default)]
    pub venues: Vec<SeedVenue>,
}

/// A venue as written in the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedVenue {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_seed_status")]
    pub status: VenueStatus,
    /// Code rotation secret, hex encoded.
    pub secret_hex: String,
    #[serde(default)]
    pub max_range_meters: Option<f64>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./presence_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_rpc_port() -> u16 {
    7480
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_seed_status() -> VenueStatus {
    VenueStatus::Confirmed
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SeedVenue {
    pub fn to_venue(&self) -> Result<Venue, RpcError> {
        let invalid = |what: String| RpcError::Config(format!("venue {:?}: {what}", self.id));
        let id = VenueId::parse(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        let location =
            Coordinate::new(self.latitude, self.longitude).map_err(|e| invalid(e.to_string()))?;
        let secret_bytes =
            hex::decode(self.secret_hex.trim()).map_err(|e| invalid(format!("secret_hex: {e}")))?;
        let secret = VenueSecret::new(secret_bytes).map_err(|e| invalid(e.to_string()))?;
        let venue = Venue {
            id,
            name: self.name.clone(),
            location,
            status: self.status,
            secret,
            max_range_meters: self.max_range_meters,
        };
        venue.validate().map_err(|e| invalid(e.to_string()))?;
        Ok(venue)
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, RpcError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RpcError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RpcError> {
        toml::from_str(s).map_err(|e| RpcError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RpcError> {
        toml::to_string_pretty(self).map_err(|e| RpcError::Config(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Check parameters and decode every seeded venue.
    pub fn seed_venues(&self) -> Result<Vec<Venue>, RpcError> {
        self.venues.iter().map(SeedVenue::to_venue).collect()
    }

    pub fn validate(&self) -> Result<(), RpcError> {
        self.verification
            .validate()
            .map_err(|e| RpcError::Config(e.to_string()))?;
        if self.map_size_mb == 0 {
            return Err(RpcError::Config("map_size_mb must be positive".into()));
        }
        self.seed_venues().map(|_| ())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            rpc_port: default_rpc_port(),
            cors_allow_origins: Vec::new(),
            enable_metrics: default_true(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            verification: VerificationParams::default(),
            venues: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEEDED: &str = r#"
        rpc_port = 9000

        [verification]
        code_window_secs = 60

        [[venues]]
        id = "popup-seoul"
        name = "Seoul Popup"
        latitude = 37.5665
        longitude = 126.9780
        secret_hex = "000102030405060708090a0b0c0d0e0f"

        [[venues]]
        id = "popup-busan"
        name = "Busan Popup"
        latitude = 35.1796
        longitude = 129.0756
        status = "pending"
        secret_hex = "0f0e0d0c0b0a09080706050403020100"
        max_range_meters = 250.0
    "#;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ServiceConfig::default();
        let toml_str = config.to_toml_string().expect("serializable");
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.verification, config.verification);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 7480);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.verification.code_digits, 6);
        assert_eq!(config.verification.code_window_secs, 30);
        assert!(config.venues.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn seeded_venues_decode() {
        let config = ServiceConfig::from_toml_str(SEEDED).expect("should parse");
        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.verification.code_window_secs, 60);
        assert_eq!(config.verification.code_digits, 6); // default

        let venues = config.seed_venues().expect("valid venues");
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].status, VenueStatus::Confirmed);
        assert_eq!(venues[0].secret.as_bytes()[15], 0x0f);
        assert_eq!(venues[1].status, VenueStatus::Pending);
        assert_eq!(venues[1].max_range_meters, Some(250.0));
    }

    #[test]
    fn short_secret_is_a_config_error() {
        let mut config = ServiceConfig::default();
        config.venues.push(SeedVenue {
            id: "v".into(),
            name: "V".into(),
            latitude: 0.0,
            longitude: 0.0,
            status: VenueStatus::Confirmed,
            secret_hex: "abcd".into(),
            max_range_meters: None,
        });
        assert!(matches!(config.validate(), Err(RpcError::Config(_))));
    }

    #[test]
    fn bad_window_is_a_config_error() {
        let config = ServiceConfig::from_toml_str("[verification]\ncode_window_secs = 0")
            .expect("should parse");
        assert!(matches!(config.validate(), Err(RpcError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file(std::path::Path::new("/nonexistent/presence.toml"));
        assert!(matches!(result, Err(RpcError::Config(_))));
    }
}
