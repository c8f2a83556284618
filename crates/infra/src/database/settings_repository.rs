//! SQLite-backed settings store.
//!
//! Holds the Deel credential rows and the automation flag. Upserts run
//! as one transaction so a partially applied settings update is never
//! observable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use deelbridge_core::ports::{SettingUpsert, SettingsStore};
use deelbridge_domain::Result as DomainResult;
use rusqlite::params;
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use crate::errors::map_join_error;

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository {
    db: Arc<DbManager>,
}

impl SqliteSettingsRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsRepository {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT value FROM deel_settings WHERE key = ?1")
                .map_err(map_sql_error)?;
            let mut rows = stmt.query(params![key]).map_err(map_sql_error)?;

            match rows.next().map_err(map_sql_error)? {
                Some(row) => Ok(Some(row.get(0).map_err(map_sql_error)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, settings: &[SettingUpsert]) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let settings = settings.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let now = Utc::now().timestamp();

            for setting in &settings {
                tx.execute(
                    "INSERT INTO deel_settings (key, value, description, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         description = COALESCE(excluded.description, deel_settings.description),
                         updated_at = excluded.updated_at",
                    params![setting.key, setting.value, setting.description, now],
                )
                .map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM deel_settings WHERE key = ?1", params![key])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteSettingsRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");
        let manager = Arc::new(DbManager::new(&db_path, 2).expect("manager created"));
        manager.run_migrations().expect("migrations run");
        (SqliteSettingsRepository::new(manager), temp_dir)
    }

    fn upsert(key: &str, value: &str) -> SettingUpsert {
        SettingUpsert { key: key.to_string(), value: value.to_string(), description: None }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_key_reads_as_none() {
        let (repo, _temp_dir) = setup_repository().await;
        assert_eq!(repo.get("deel_api_token").await.expect("get"), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_batch_writes_all_rows() {
        let (repo, _temp_dir) = setup_repository().await;

        repo.upsert(&[
            upsert("deel_api_token", "secret-1234"),
            upsert("deel_api_base_url", "https://api.letsdeel.com"),
        ])
        .await
        .expect("upsert");

        assert_eq!(
            repo.get("deel_api_token").await.expect("get"),
            Some("secret-1234".to_string())
        );
        assert_eq!(
            repo.get("deel_api_base_url").await.expect("get"),
            Some("https://api.letsdeel.com".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_overwrites_value_and_keeps_description() {
        let (repo, _temp_dir) = setup_repository().await;

        repo.upsert(&[SettingUpsert {
            key: "deel_api_token".to_string(),
            value: "old".to_string(),
            description: Some("Deel API authentication token".to_string()),
        }])
        .await
        .expect("first upsert");

        repo.upsert(&[upsert("deel_api_token", "new")]).await.expect("second upsert");

        assert_eq!(repo.get("deel_api_token").await.expect("get"), Some("new".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_removes_the_row() {
        let (repo, _temp_dir) = setup_repository().await;

        repo.upsert(&[upsert("deel_auto_sync_enabled", "true")]).await.expect("upsert");
        repo.delete("deel_auto_sync_enabled").await.expect("delete");

        assert_eq!(repo.get("deel_auto_sync_enabled").await.expect("get"), None);
    }
}
