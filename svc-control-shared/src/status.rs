use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Traffic-light color derived from a service's runtime facts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    #[default]
    Red,
    Green,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Red => "red",
            StatusColor::Green => "green",
        }
    }
}

impl Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container health check result as reported by the runtime.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Starting,
    /// The container defines no health check.
    #[default]
    None,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
            HealthState::Starting => "starting",
            HealthState::None => "none",
        }
    }
}

impl Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged view of one supervised service: settings plus live runtime facts.
///
/// Runtime fields are empty strings (and `running` is false) when no container
/// carries the service label.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub enabled: bool,
    pub status: String,
    pub status_color: StatusColor,
    pub running: bool,
    pub health_status: String,
    pub supports_disable: bool,
    pub supports_restart: bool,
    pub start_date_utc: String,
    pub uptime: String,
    pub uptime_seconds: u64,
    pub container_name: String,
    pub container_id: String,
    pub container_image: String,
}

impl ServiceStatus {
    pub fn is_green(&self) -> bool {
        self.status_color == StatusColor::Green
    }
}
