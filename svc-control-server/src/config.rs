use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::models::catalog::ServiceCatalog;

pub const SETTINGS_FILE_VAR: &str = "SVC_CONTROL_SETTINGS_FILE";
pub const DEFAULT_SETTINGS_FILE: &str = "./settings.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value \"{value}\" ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub settings_file: PathBuf,
    pub database_url: String,
    pub db_pool_size: u32,
    pub docker_socket: String,
    pub service_label: String,
    pub bind_address: String,
    pub rest_port: u16,
    pub ws_port: u16,
    pub push_interval: Duration,
    pub healthy_uptime_secs: u64,
    pub health_sample_interval: Duration,
    pub health_tiles: u32,
    pub health_retention_days: u32,
    pub host_restart_command: String,
    pub log_level: String,
}

/// Path of the bootstrap settings file, read before anything else.
pub fn settings_file_from_env() -> PathBuf {
    std::env::var(SETTINGS_FILE_VAR)
        .unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.into())
        .into()
}

impl AppConfig {
    pub fn from_env(catalog: &ServiceCatalog) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), catalog)
    }

    /// Environment first, then the control service's declared defaults in the
    /// settings file, then compiled defaults.
    pub fn from_lookup<F>(lookup: F, catalog: &ServiceCatalog) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let text = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let layered = |key: &str, setting: &str, default: &str| {
            var(key)
                .or_else(|| catalog.control_default(setting).map(str::to_string))
                .unwrap_or_else(|| default.to_string())
        };

        let settings_file = text(SETTINGS_FILE_VAR, DEFAULT_SETTINGS_FILE).into();
        let database_url = text("SVC_CONTROL_DATABASE_URL", "sqlite://svc_control.db");
        let db_pool_size = parse("SVC_CONTROL_DB_POOL_SIZE", text("SVC_CONTROL_DB_POOL_SIZE", "10"))?;
        let docker_socket = layered(
            "SVC_CONTROL_DOCKER_SOCKET",
            "docker_access_socket_file_name",
            "/var/run/docker.sock",
        );
        let service_label = text("SVC_CONTROL_SERVICE_LABEL", "ham_docker_container_name");
        let bind_address = text("SVC_CONTROL_BIND_ADDRESS", "0.0.0.0");
        let rest_port = parse(
            "SVC_CONTROL_REST_PORT",
            layered("SVC_CONTROL_REST_PORT", "svc_control_ws_port_number", "3002"),
        )?;
        let ws_port = parse(
            "SVC_CONTROL_WS_PORT",
            layered(
                "SVC_CONTROL_WS_PORT",
                "svc_control_ws_websocket_port_number",
                "3003",
            ),
        )?;
        let push_interval_secs: u64 = parse(
            "SVC_CONTROL_PUSH_INTERVAL_SECS",
            text("SVC_CONTROL_PUSH_INTERVAL_SECS", "5"),
        )?;
        let healthy_uptime_secs = parse(
            "SVC_CONTROL_HEALTHY_UPTIME_SECS",
            text("SVC_CONTROL_HEALTHY_UPTIME_SECS", "60"),
        )?;
        let sample_secs: u64 = parse(
            "SVC_CONTROL_HEALTH_SAMPLE_SECS",
            text("SVC_CONTROL_HEALTH_SAMPLE_SECS", "60"),
        )?;
        let health_tiles = parse(
            "SVC_CONTROL_HEALTH_TILES",
            text("SVC_CONTROL_HEALTH_TILES", "96"),
        )?;
        let health_retention_days = parse(
            "SVC_CONTROL_HEALTH_RETENTION_DAYS",
            text("SVC_CONTROL_HEALTH_RETENTION_DAYS", "400"),
        )?;
        let host_restart_command = text(
            "SVC_CONTROL_HOST_RESTART_COMMAND",
            "sudo /sbin/shutdown -r now",
        );
        let log_level = var("SVC_CONTROL_LOG")
            .or_else(|| var("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            settings_file,
            database_url,
            db_pool_size: nonzero("SVC_CONTROL_DB_POOL_SIZE", db_pool_size)?,
            docker_socket,
            service_label,
            bind_address,
            rest_port,
            ws_port,
            push_interval: Duration::from_secs(nonzero(
                "SVC_CONTROL_PUSH_INTERVAL_SECS",
                push_interval_secs,
            )?),
            healthy_uptime_secs,
            health_sample_interval: Duration::from_secs(nonzero(
                "SVC_CONTROL_HEALTH_SAMPLE_SECS",
                sample_secs,
            )?),
            health_tiles: nonzero("SVC_CONTROL_HEALTH_TILES", health_tiles)?,
            health_retention_days,
            host_restart_command,
            log_level,
        })
    }

    pub fn rest_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.rest_port)
    }

    pub fn ws_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.ws_port)
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed: Result<T, T::Err> = value.trim().parse();
    match parsed {
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn nonzero<T>(var: &'static str, value: T) -> Result<T, ConfigError>
where
    T: Default + PartialEq + ToString,
{
    if value == T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
