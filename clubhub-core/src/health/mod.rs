//! Health reporting for the HTTP surface

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime};

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Degraded => 200,
            HealthStatus::Unhealthy => 503,
        }
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub timestamp: SystemTime,
    pub components: Vec<ComponentHealth>,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Builds health reports; holds only process start time and version
#[derive(Debug, Clone)]
pub struct HealthChecker {
    started: Instant,
    version: String,
}

impl HealthChecker {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            version: version.into(),
        }
    }

    /// Aggregate component results: any unhealthy wins, then any degraded
    pub fn report(&self, components: Vec<ComponentHealth>) -> HealthCheck {
        let status = if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthCheck {
            status,
            timestamp: SystemTime::now(),
            components,
            version: self.version.clone(),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

/// Built-in health checks
pub mod checks {
    use super::*;

    /// Round-trip latency above this marks the store as degraded
    pub const SLOW_STORE_THRESHOLD: Duration = Duration::from_millis(500);

    /// Classify the outcome of a store ping
    pub fn check_store(ping: Result<Duration, String>) -> ComponentHealth {
        match ping {
            Ok(latency) if latency > SLOW_STORE_THRESHOLD => ComponentHealth::degraded(
                "store",
                format!("Store responded in {} ms", latency.as_millis()),
            ),
            Ok(_) => ComponentHealth::healthy("store"),
            Err(e) => ComponentHealth::unhealthy("store", e),
        }
    }
}
