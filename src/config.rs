use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transfer::retry::RetryPolicy;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Application id sent as `ait-id` and stamped on published messages
    pub ait_id: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL for the account store
    pub postgres_url: String,
    #[serde(default)]
    pub reservation: ReservationConfig,
    pub broker: BrokerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Reservation service endpoints, HTTP timeouts and retry budget
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ReservationConfig {
    pub reserve_url: String,
    pub cancel_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub attempts: u32,
    pub backoff_delay_ms: u64,
    pub backoff_delay_max_ms: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            reserve_url: "http://localhost:9001/Reservation".to_string(),
            cancel_url: "http://localhost:9001/CancelReservation".to_string(),
            connect_timeout_ms: 1000,
            request_timeout_ms: 1000,
            attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            backoff_delay_ms: 100,
            backoff_delay_max_ms: 500,
        }
    }
}

impl ReservationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.backoff_delay_ms),
            Duration::from_millis(self.backoff_delay_max_ms),
        )
    }
}

/// Fulfillment broker settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrokerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    /// Upper bound on waiting for a delivery acknowledgement
    #[serde(default = "default_broker_timeout_ms")]
    pub timeout_ms: u64,
    /// Extra producer properties passed through verbatim (e.g. `acks`)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_broker_timeout_ms() -> u64 {
    1000
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Dump the effective configuration at debug level, credentials redacted
    pub fn log_effective(&self) {
        let mut redacted = self.clone();
        redacted.postgres_url = redact_url(&self.postgres_url);
        match serde_yaml::to_string(&redacted) {
            Ok(yaml) => debug!("Effective configuration:\n{}", yaml),
            Err(e) => debug!(error = %e, "Effective configuration could not be rendered"),
        }
    }
}

/// Replace the userinfo part of a URL (`user:pass@`) with `***@`
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
