use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Without a key every AI route answers with a "not configured" error.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = match env_or("STORAGE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("unknown STORAGE_BACKEND `{other}` (expected postgres or memory)"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "nutrilog"),
            audience: env_or("JWT_AUDIENCE", "nutrilog-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            timeout_secs: env_parse("AI_TIMEOUT_SECS", 30),
        };
        Ok(Self {
            storage,
            database_url,
            jwt,
            ai,
        })
    }
}
