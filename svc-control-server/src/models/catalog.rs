use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::db::Store;
use crate::response::ServerResult;

/// Name of the control plane's own entry in the settings file.
pub const CONTROL_SERVICE_NAME: &str = "svc_control_ws";

/// Settings files written by hand use both `true` and `"true"`.
fn de_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(d)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid flag \"{other}\" (expected true or false)"
            ))),
        },
    }
}

fn default_visible() -> bool {
    true
}

fn default_data_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SettingDefinition {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub editable: bool,
    #[serde(default = "default_visible", deserialize_with = "de_flag")]
    pub visible: bool,
}

impl SettingDefinition {
    /// Value seeded into the store; falls back to the declared default.
    pub fn initial_value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.default_value)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Vec<SettingDefinition>,
}

impl ServiceDefinition {
    pub fn setting(&self, name: &str) -> Option<&SettingDefinition> {
        self.settings.iter().find(|s| s.name == name)
    }
}

/// Statically known services, in definition order.
///
/// Built once at startup from the settings file and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ServiceCatalog {
    pub services: Vec<ServiceDefinition>,
}

impl ServiceCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let catalog: ServiceCatalog = serde_json::from_str(contents)?;
        for (i, service) in catalog.services.iter().enumerate() {
            if catalog.services[..i].iter().any(|s| s.name == service.name) {
                anyhow::bail!("Service \"{}\" is defined more than once", service.name);
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Declared default of one of the control plane's own settings.
    pub fn control_default(&self, setting: &str) -> Option<&str> {
        self.get(CONTROL_SERVICE_NAME)
            .and_then(|svc| svc.setting(setting))
            .map(|s| s.default_value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Registers every service and seeds its declared settings.
    ///
    /// Safe to run on every start: existing editable values are kept.
    pub async fn register(&self, store: &Store) -> ServerResult<()> {
        for service in &self.services {
            store.ensure_service_registered(&service.name).await?;
            for setting in &service.settings {
                store
                    .upsert_setting_defaults(&service.name, setting)
                    .await?;
            }
        }
        info!("Registered {} services in the settings store", self.services.len());
        Ok(())
    }
}
