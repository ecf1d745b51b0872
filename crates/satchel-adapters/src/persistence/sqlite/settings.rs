use async_trait::async_trait;
use serde_json::Value;

use satchel_core::ids::TutorId;
use satchel_ports::error::PortError;
use satchel_ports::outbound::SettingsProvider;

use super::SqliteDb;

/// Scope key for the marketplace-wide settings row.
const SITE_SCOPE: &str = "site";

impl SqliteDb {
    pub async fn put_site_settings(&self, data: &Value) -> Result<(), PortError> {
        self.put_settings(SITE_SCOPE, data).await
    }

    pub async fn put_tutor_overrides(
        &self,
        tutor: &TutorId,
        data: &Value,
    ) -> Result<(), PortError> {
        self.put_settings(&tutor.to_string(), data).await
    }

    async fn put_settings(&self, scope: &str, data: &Value) -> Result<(), PortError> {
        let data =
            serde_json::to_string(data).map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO settings (scope, data) VALUES (?, ?)
             ON CONFLICT(scope) DO UPDATE SET data = excluded.data",
        )
        .bind(scope)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn settings_for(&self, scope: &str) -> Result<Option<Value>, PortError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM settings WHERE scope = ?")
            .bind(scope)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let value: Value = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SettingsProvider for SqliteDb {
    /// A fresh install has no settings row yet; `Null` normalizes to
    /// the built-in defaults downstream.
    async fn site_settings(&self) -> Result<Value, PortError> {
        Ok(self
            .settings_for(SITE_SCOPE)
            .await?
            .unwrap_or(Value::Null))
    }

    async fn tutor_overrides(&self, tutor: &TutorId) -> Result<Option<Value>, PortError> {
        self.settings_for(&tutor.to_string()).await
    }
}
