use crate::types::UpstreamHealth;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate health of the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Both upstreams answered
    Healthy,
    /// At least one upstream failed its probe
    Unhealthy,
}

/// Reachability of a single upstream
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl From<bool> for ConnectionState {
    fn from(ok: bool) -> Self {
        if ok {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

/// Body of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// RFC 3339 time of the probe
    pub timestamp: String,
    pub version: String,
    /// Per-upstream state, keyed `l1_connection` / `l2_connection`
    pub services: BTreeMap<String, ConnectionState>,
}

impl HealthReport {
    /// Build a report from one probe of each upstream
    pub fn from_probe(probe: UpstreamHealth, at: DateTime<Utc>) -> Self {
        let status = if probe.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        let services = BTreeMap::from([
            ("l1_connection".to_string(), ConnectionState::from(probe.l1)),
            ("l2_connection".to_string(), ConnectionState::from(probe.l2)),
        ]);

        Self {
            status,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
