use tracing::warn;
use uuid::Uuid;

use crate::nutrition::log::FoodLog;
use crate::store::{load_or_default, save_json, KvStore, FOOD_ITEMS_KEY};

pub async fn load(store: &dyn KvStore, owner: Uuid) -> anyhow::Result<FoodLog> {
    let log: FoodLog = load_or_default(store, owner, FOOD_ITEMS_KEY).await?;
    if let Err(e) = log.validate() {
        warn!(error = %e, %owner, "stored food log fails validation; starting empty");
        return Ok(FoodLog::default());
    }
    Ok(log)
}

/// An empty log removes the key instead of storing `[]`.
pub async fn save(store: &dyn KvStore, owner: Uuid, log: &FoodLog) -> anyhow::Result<()> {
    if log.is_empty() {
        return store.delete(owner, FOOD_ITEMS_KEY).await;
    }
    save_json(store, owner, FOOD_ITEMS_KEY, log).await
}
