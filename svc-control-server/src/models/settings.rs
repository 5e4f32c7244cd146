use svc_control_shared::settings::{
    SERVICE_CAN_DISABLE, SERVICE_CAN_RESTART, SERVICE_ENABLED, ServiceSettings, SettingValue,
    SettingView, flag_value,
};
use tracing::debug;

use crate::db::Store;
use crate::models::catalog::SettingDefinition;
use crate::response::{ServerError, ServerResult};

/// One persisted key/value pair scoped to a service.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SettingRecord {
    pub name: String,
    pub value: String,
    pub default_value: String,
    pub display_name: String,
    pub description: String,
    pub data_type: String,
    pub editable: bool,
    pub visible: bool,
}

impl From<&SettingRecord> for SettingView {
    fn from(record: &SettingRecord) -> Self {
        SettingView {
            name: record.name.clone(),
            display_name: record.display_name.clone(),
            description: record.description.clone(),
            value: record.value.clone(),
            data_type: record.data_type.clone(),
            visible: record.visible,
            editable: record.editable,
        }
    }
}

impl From<&SettingRecord> for SettingValue {
    fn from(record: &SettingRecord) -> Self {
        SettingValue {
            name: record.name.clone(),
            value: record.value.clone(),
        }
    }
}

/// Flags the reconciler and dispatcher read out of a service's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceFlags {
    pub enabled: bool,
    pub supports_disable: bool,
    pub supports_restart: bool,
}

impl ServiceFlags {
    pub fn from_records(records: &[SettingRecord]) -> Self {
        let flag = |name: &str| {
            records
                .iter()
                .find(|r| r.name == name)
                .is_some_and(|r| flag_value(&r.value))
        };
        Self {
            enabled: flag(SERVICE_ENABLED),
            supports_disable: flag(SERVICE_CAN_DISABLE),
            supports_restart: flag(SERVICE_CAN_RESTART),
        }
    }
}

pub fn to_service_settings(name: &str, records: &[SettingRecord]) -> ServiceSettings {
    ServiceSettings {
        name: name.to_string(),
        settings: records.iter().map(SettingView::from).collect(),
    }
}

impl Store {
    /// Idempotent: registering a known service is a no-op.
    pub async fn ensure_service_registered(&self, name: &str) -> ServerResult<()> {
        sqlx::query("INSERT INTO service (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Seeds a setting from configuration.
    ///
    /// A missing row is inserted. An existing row always takes the declared
    /// metadata, but its value is only overwritten when the declaration is not
    /// editable; editable values set by users are kept.
    pub async fn upsert_setting_defaults(
        &self,
        service: &str,
        setting: &SettingDefinition,
    ) -> ServerResult<()> {
        let service_id = self.require_service_id(service).await?;

        sqlx::query(
            "INSERT INTO setting
                (service_id, name, value, default_value, display_name, description,
                 data_type, editable, visible)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (service_id, name) DO UPDATE SET
                value = CASE WHEN excluded.editable = 0 THEN excluded.value ELSE setting.value END,
                default_value = excluded.default_value,
                display_name = excluded.display_name,
                description = excluded.description,
                data_type = excluded.data_type,
                editable = excluded.editable,
                visible = excluded.visible",
        )
        .bind(service_id)
        .bind(&setting.name)
        .bind(setting.initial_value())
        .bind(&setting.default_value)
        .bind(&setting.display_name)
        .bind(&setting.description)
        .bind(&setting.data_type)
        .bind(setting.editable)
        .bind(setting.visible)
        .execute(&self.pool)
        .await?;

        debug!(service, setting = %setting.name, "Upserted setting defaults");
        Ok(())
    }

    pub async fn get_settings(&self, service: &str) -> ServerResult<Vec<SettingRecord>> {
        let service_id = self.require_service_id(service).await?;
        let records = sqlx::query_as::<_, SettingRecord>(
            "SELECT name, value, default_value, display_name, description, data_type,
                    editable, visible
             FROM setting WHERE service_id = ? ORDER BY id",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn get_setting(&self, service: &str, setting: &str) -> ServerResult<SettingRecord> {
        let service_id = self.require_service_id(service).await?;
        sqlx::query_as::<_, SettingRecord>(
            "SELECT name, value, default_value, display_name, description, data_type,
                    editable, visible
             FROM setting WHERE service_id = ? AND name = ?",
        )
        .bind(service_id)
        .bind(setting)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServerError::unknown_setting(service, setting))
    }

    pub async fn set_setting_value(
        &self,
        service: &str,
        setting: &str,
        value: &str,
    ) -> ServerResult<()> {
        let service_id = self.require_service_id(service).await?;
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM setting WHERE service_id = ? AND name = ?")
                .bind(service_id)
                .bind(setting)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(ServerError::unknown_setting(service, setting));
        }

        let result = sqlx::query("UPDATE setting SET value = ? WHERE service_id = ? AND name = ?")
            .bind(value)
            .bind(service_id)
            .bind(setting)
            .execute(&self.pool)
            .await?;

        // The row may have vanished between the lookup and the update.
        if result.rows_affected() == 0 {
            return Err(ServerError::NoRowsAffected(format!(
                "setting {setting} of service {service} was not updated"
            )));
        }
        debug!(service, setting, value, "Updated setting value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::ServiceCatalog;

    fn definition(name: &str, value: &str, editable: bool) -> SettingDefinition {
        SettingDefinition {
            name: name.to_string(),
            value: Some(value.to_string()),
            default_value: value.to_string(),
            display_name: format!("{name} display"),
            description: String::new(),
            data_type: "string".to_string(),
            editable,
            visible: true,
        }
    }

    async fn service_names(store: &Store) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM service ORDER BY id")
            .fetch_all(&store.pool)
            .await
            .unwrap()
    }

    async fn store_with(service: &str) -> Store {
        let store = Store::memory().await;
        store.ensure_service_registered(service).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = store_with("direwolf").await;
        store.ensure_service_registered("direwolf").await.unwrap();
        store.ensure_service_registered("aprsis").await.unwrap();
        assert_eq!(service_names(&store).await, vec!["direwolf", "aprsis"]);
    }

    #[tokio::test]
    async fn test_upsert_twice_leaves_one_record() {
        let store = store_with("svc").await;
        let def = definition("callsign", "N0CALL", true);
        store.upsert_setting_defaults("svc", &def).await.unwrap();
        store.upsert_setting_defaults("svc", &def).await.unwrap();

        let records = store.get_settings("svc").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "N0CALL");
    }

    #[tokio::test]
    async fn test_editable_value_is_sticky() {
        let store = store_with("svc").await;
        store
            .upsert_setting_defaults("svc", &definition("callsign", "N0CALL", true))
            .await
            .unwrap();
        store
            .upsert_setting_defaults("svc", &definition("callsign", "K1ABC", true))
            .await
            .unwrap();
        assert_eq!(store.get_setting("svc", "callsign").await.unwrap().value, "N0CALL");

        // A user edit survives a later bootstrap as well.
        store.set_setting_value("svc", "callsign", "W1AW").await.unwrap();
        store
            .upsert_setting_defaults("svc", &definition("callsign", "N0CALL", true))
            .await
            .unwrap();
        assert_eq!(store.get_setting("svc", "callsign").await.unwrap().value, "W1AW");
    }

    #[tokio::test]
    async fn test_non_editable_value_follows_configuration() {
        let store = store_with("svc").await;
        store
            .upsert_setting_defaults("svc", &definition("x", "A", false))
            .await
            .unwrap();
        store
            .upsert_setting_defaults("svc", &definition("x", "B", false))
            .await
            .unwrap();
        assert_eq!(store.get_setting("svc", "x").await.unwrap().value, "B");
    }

    #[tokio::test]
    async fn test_metadata_refreshed_on_sticky_setting() {
        let store = store_with("svc").await;
        store
            .upsert_setting_defaults("svc", &definition("x", "A", true))
            .await
            .unwrap();
        let mut updated = definition("x", "B", true);
        updated.display_name = "Renamed".to_string();
        updated.visible = false;
        store.upsert_setting_defaults("svc", &updated).await.unwrap();

        let record = store.get_setting("svc", "x").await.unwrap();
        assert_eq!(record.value, "A");
        assert_eq!(record.default_value, "B");
        assert_eq!(record.display_name, "Renamed");
        assert!(!record.visible);
    }

    #[tokio::test]
    async fn test_upsert_for_unknown_service() {
        let store = Store::memory().await;
        let res = store
            .upsert_setting_defaults("ghost", &definition("x", "A", false))
            .await;
        assert_eq!(res, Err(ServerError::unknown_service("ghost")));
    }

    #[tokio::test]
    async fn test_get_settings_unknown_service() {
        let store = Store::memory().await;
        assert_eq!(
            store.get_settings("ghost").await,
            Err(ServerError::unknown_service("ghost"))
        );
    }

    #[tokio::test]
    async fn test_set_setting_value_errors() {
        let store = store_with("svc").await;
        assert_eq!(
            store.set_setting_value("ghost", "x", "1").await,
            Err(ServerError::unknown_service("ghost"))
        );
        assert_eq!(
            store.set_setting_value("svc", "x", "1").await,
            Err(ServerError::unknown_setting("svc", "x"))
        );
    }

    #[tokio::test]
    async fn test_service_flags() {
        let store = store_with("svc").await;
        store
            .upsert_setting_defaults("svc", &definition(SERVICE_ENABLED, "true", true))
            .await
            .unwrap();
        store
            .upsert_setting_defaults("svc", &definition(SERVICE_CAN_DISABLE, "true", false))
            .await
            .unwrap();
        let flags = ServiceFlags::from_records(&store.get_settings("svc").await.unwrap());
        assert_eq!(
            flags,
            ServiceFlags {
                enabled: true,
                supports_disable: true,
                supports_restart: false,
            }
        );
    }

    #[tokio::test]
    async fn test_catalog_register_seeds_store() {
        let catalog = ServiceCatalog::from_json(
            r#"{ "services": [
                { "name": "a", "settings": [ { "name": "service_enabled", "value": "true", "editable": true } ] },
                { "name": "b" }
            ] }"#,
        )
        .unwrap();
        let store = Store::memory().await;
        catalog.register(&store).await.unwrap();
        catalog.register(&store).await.unwrap();

        assert_eq!(service_names(&store).await, vec!["a", "b"]);
        let settings = to_service_settings("a", &store.get_settings("a").await.unwrap());
        assert_eq!(settings.value_of(SERVICE_ENABLED), Some("true"));
        assert!(store.get_settings("b").await.unwrap().is_empty());
    }
}
