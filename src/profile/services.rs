use tracing::{info, warn};
use uuid::Uuid;

use super::repo;
use crate::error::ServiceError;
use crate::nutrition::profile::ProfileAction;
use crate::nutrition::tdee::{estimate, MetricsInput, TdeeEstimate};
use crate::nutrition::types::UserProfile;
use crate::nutrition::NutritionError;
use crate::state::AppState;

pub async fn get(state: &AppState, owner: Uuid) -> Result<UserProfile, ServiceError> {
    Ok(repo::load(state.store.as_ref(), owner).await?)
}

pub async fn apply(
    state: &AppState,
    owner: Uuid,
    action: ProfileAction,
) -> Result<UserProfile, ServiceError> {
    let (profile, ()) = mutate(state, owner, |profile| profile.apply(action)).await?;
    Ok(profile)
}

/// Estimate without saving; gaps in `input` come from the stored profile.
pub async fn estimate_tdee(
    state: &AppState,
    owner: Uuid,
    input: MetricsInput,
) -> Result<TdeeEstimate, ServiceError> {
    let profile = repo::load(state.store.as_ref(), owner).await?;
    Ok(estimate_from(&profile, input)?)
}

/// Estimate and adopt the result in one locked step.
pub async fn apply_tdee(
    state: &AppState,
    owner: Uuid,
    input: MetricsInput,
) -> Result<(TdeeEstimate, UserProfile), ServiceError> {
    let (profile, result) = mutate(state, owner, |profile| {
        let result = estimate_from(profile, input)?;
        profile.apply(ProfileAction::ApplyTdee(result.clone()))?;
        Ok(result)
    })
    .await?;
    Ok((result, profile))
}

fn estimate_from(profile: &UserProfile, input: MetricsInput) -> Result<TdeeEstimate, NutritionError> {
    let input = input.or_profile(profile);
    let weekly_goal = input.weekly_goal.unwrap_or_default();
    Ok(estimate(input.into_metrics()?, weekly_goal))
}

/// Load, change, persist under the shared write lock. A rejected change is
/// never written.
async fn mutate<T>(
    state: &AppState,
    owner: Uuid,
    change: impl FnOnce(&mut UserProfile) -> Result<T, NutritionError>,
) -> Result<(UserProfile, T), ServiceError> {
    let _guard = state.write_lock.lock().await;
    let store = state.store.as_ref();

    let mut profile = repo::load(store, owner).await?;
    let out = change(&mut profile).map_err(|e| {
        warn!(error = %e, %owner, "profile change rejected");
        e
    })?;
    repo::save(store, owner, &profile).await?;

    info!(%owner, daily_goal = profile.daily_goal, "profile saved");
    Ok((profile, out))
}
