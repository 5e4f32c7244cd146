use serde::{Deserialize, Serialize};

/// Setting toggling whether a service should run at all.
pub const SERVICE_ENABLED: &str = "service_enabled";
/// Capability flag: the service may be enabled/disabled by users.
pub const SERVICE_CAN_DISABLE: &str = "service_can_disable";
/// Capability flag: the service's container may be restarted on demand.
pub const SERVICE_CAN_RESTART: &str = "service_can_restart";

/// Settings are stored as strings; flags use the literal `"true"`.
pub fn flag_value(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

pub fn flag_string(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SettingView {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub value: String,
    pub data_type: String,
    pub visible: bool,
    pub editable: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ServiceSettings {
    pub name: String,
    pub settings: Vec<SettingView>,
}

impl ServiceSettings {
    pub fn value_of(&self, setting: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|s| s.name == setting)
            .map(|s| s.value.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SettingValue {
    pub name: String,
    pub value: String,
}

/// Request body for changing one editable setting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UpdateSettingBody {
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EnabledState {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_value() {
        assert!(flag_value("true"));
        assert!(flag_value(" TRUE "));
        assert!(!flag_value("false"));
        assert!(!flag_value(""));
        assert!(!flag_value("yes"));
    }

    #[test]
    fn test_value_of() {
        let settings = ServiceSettings {
            name: "aprsis".into(),
            settings: vec![SettingView {
                name: SERVICE_ENABLED.into(),
                value: "true".into(),
                ..Default::default()
            }],
        };
        assert_eq!(settings.value_of(SERVICE_ENABLED), Some("true"));
        assert_eq!(settings.value_of(SERVICE_CAN_RESTART), None);
    }
}
