use tracing::warn;
use uuid::Uuid;

use crate::nutrition::types::UserProfile;
use crate::store::{load_or_default, save_json, KvStore, USER_PROFILE_KEY};

/// Stored profile, or the default one when nothing usable is stored.
pub async fn load(store: &dyn KvStore, owner: Uuid) -> anyhow::Result<UserProfile> {
    let profile: UserProfile = load_or_default(store, owner, USER_PROFILE_KEY).await?;
    if let Err(e) = profile.validate() {
        warn!(error = %e, %owner, "stored profile fails validation; using defaults");
        return Ok(UserProfile::default());
    }
    Ok(profile)
}

pub async fn save(store: &dyn KvStore, owner: Uuid, profile: &UserProfile) -> anyhow::Result<()> {
    save_json(store, owner, USER_PROFILE_KEY, profile).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    #[tokio::test]
    async fn absent_profile_is_default() {
        let store = MemoryKvStore::default();
        let profile = load(&store, Uuid::new_v4()).await.unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[tokio::test]
    async fn out_of_range_profile_is_replaced() {
        let store = MemoryKvStore::default();
        let owner = Uuid::new_v4();
        store
            .put(
                owner,
                USER_PROFILE_KEY,
                r#"{"currentWeight":-4,"goalWeight":70,"dailyGoal":2000,"macroGoal":{"protein":1,"carbs":1,"fat":1}}"#.into(),
            )
            .await
            .unwrap();
        assert_eq!(load(&store, owner).await.unwrap(), UserProfile::default());
    }

    #[tokio::test]
    async fn saved_profile_round_trips() {
        let store = MemoryKvStore::default();
        let owner = Uuid::new_v4();
        let profile = UserProfile { daily_goal: 1900.0, age: None, ..UserProfile::default() };
        save(&store, owner, &profile).await.unwrap();
        assert_eq!(load(&store, owner).await.unwrap(), profile);
    }
}
