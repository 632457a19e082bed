use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ai::client::{DisabledModel, GeminiClient, GenerativeModel};
use crate::ai::generations::RequestGenerations;
use crate::auth::repo::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::config::{AppConfig, StorageBackend};
use crate::store::{KvStore, MemoryKvStore, PgKvStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub store: Arc<dyn KvStore>,
    pub ai: Arc<dyn GenerativeModel>,
    pub generations: Arc<RequestGenerations>,
    /// Serializes load-apply-persist cycles on the key-value store.
    pub write_lock: Arc<Mutex<()>>,
    /// Present only with the postgres backend.
    pub db: Option<sqlx::PgPool>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (users, store, db) = match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;
                (
                    Arc::new(PgUserRepo::new(db.clone())) as Arc<dyn UserRepo>,
                    Arc::new(PgKvStore::new(db.clone())) as Arc<dyn KvStore>,
                    Some(db),
                )
            }
            StorageBackend::Memory => {
                warn!("using in-memory storage; data is lost on restart");
                (
                    Arc::new(MemoryUserRepo::default()) as Arc<dyn UserRepo>,
                    Arc::new(MemoryKvStore::default()) as Arc<dyn KvStore>,
                    None,
                )
            }
        };

        let ai: Arc<dyn GenerativeModel> = match GeminiClient::from_config(&config.ai)? {
            Some(client) => {
                info!(model = %config.ai.model, "AI features enabled");
                Arc::new(client)
            }
            None => {
                warn!("GEMINI_API_KEY not set; AI routes will answer 502");
                Arc::new(DisabledModel)
            }
        };

        Ok(Self::from_parts(config, users, store, ai, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        store: Arc<dyn KvStore>,
        ai: Arc<dyn GenerativeModel>,
        db: Option<sqlx::PgPool>,
    ) -> Self {
        Self {
            config,
            users,
            store,
            ai,
            generations: Arc::new(RequestGenerations::default()),
            write_lock: Arc::new(Mutex::new(())),
            db,
        }
    }

    /// In-memory state for tests, answering AI calls with `ai`.
    #[cfg(test)]
    pub fn fake(ai: Arc<dyn GenerativeModel>) -> Self {
        use crate::config::{AiConfig, JwtConfig};

        let config = Arc::new(AppConfig {
            storage: StorageBackend::Memory,
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            ai: AiConfig {
                api_key: None,
                model: "test".into(),
                timeout_secs: 1,
            },
        });
        Self::from_parts(
            config,
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryKvStore::default()),
            ai,
            None,
        )
    }
}
