use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Key holding a user's serialized food log.
pub const FOOD_ITEMS_KEY: &str = "foodItems";
/// Key holding a user's serialized profile.
pub const USER_PROFILE_KEY: &str = "userProfile";

/// String values addressed by owner and key. A missing key is a normal
/// state, not an error.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()>;
    async fn delete(&self, owner: Uuid, key: &str) -> anyhow::Result<()>;
}

/// Reads and decodes `key`. Absent or undecodable values yield the default;
/// corrupted data is logged and otherwise ignored. Only store failures are
/// errors.
pub async fn load_or_default<T>(store: &dyn KvStore, owner: Uuid, key: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(owner, key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(error = %e, %owner, key, "stored value is malformed; falling back to defaults");
            Ok(T::default())
        }
    }
}

pub async fn save_json<T: Serialize>(
    store: &dyn KvStore,
    owner: Uuid,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("encode {key}"))?;
    store.put(owner, key, raw).await
}

#[derive(Clone)]
pub struct PgKvStore {
    db: PgPool,
}

impl PgKvStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT value
              FROM kv_entries
             WHERE owner_id = $1 AND key = $2
            "#,
        )
        .bind(owner)
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("kv get {key}"))?;
        Ok(row.map(|(v,)| v))
    }

    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (owner_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(owner)
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .with_context(|| format!("kv put {key}"))?;
        Ok(())
    }

    async fn delete(&self, owner: Uuid, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE owner_id = $1 AND key = $2")
            .bind(owner)
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("kv delete {key}"))?;
        Ok(())
    }
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<(Uuid, String), String>>,
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, owner: Uuid, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&(owner, key.to_string()))
            .cloned())
    }

    async fn put(&self, owner: Uuid, key: &str, value: String) -> anyhow::Result<()> {
        self.entries
            .write()
            .await
            .insert((owner, key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, owner: Uuid, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(&(owner, key.to_string()));
        Ok(())
    }
}
