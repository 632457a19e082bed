use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{Dashboard, Progress};
use super::repo;
use crate::error::ServiceError;
use crate::nutrition::aggregate::{daily_trend, macro_distribution, summarize_day};
use crate::nutrition::goals::evaluate;
use crate::nutrition::log::{LogAction, LogChange};
use crate::profile;
use crate::state::AppState;

/// Load, apply, persist. The write lock keeps concurrent requests from
/// interleaving, and nothing is returned until the new snapshot is stored.
pub async fn apply(
    state: &AppState,
    owner: Uuid,
    action: LogAction,
) -> Result<LogChange, ServiceError> {
    let _guard = state.write_lock.lock().await;
    let store = state.store.as_ref();

    let mut log = repo::load(store, owner).await?;
    let change = log.apply(action).map_err(|e| {
        warn!(error = %e, %owner, "food log action rejected");
        e
    })?;
    repo::save(store, owner, &log).await?;

    match &change {
        LogChange::Added(items) => info!(%owner, count = items.len(), "food entries added"),
        LogChange::Updated(item) => info!(%owner, id = %item.id, "food entry updated"),
        LogChange::Removed(item) => info!(%owner, id = %item.id, "food entry removed"),
    }
    Ok(change)
}

pub async fn dashboard(state: &AppState, owner: Uuid, date: Date) -> Result<Dashboard, ServiceError> {
    let store = state.store.as_ref();
    let log = repo::load(store, owner).await?;
    let profile = profile::repo::load(store, owner).await?;

    let summary = summarize_day(log.items(), date);
    let goals = evaluate(&summary.totals, &profile);
    Ok(Dashboard { summary, goals })
}

pub async fn progress(
    state: &AppState,
    owner: Uuid,
    end: Date,
    days: u16,
) -> Result<Progress, ServiceError> {
    let store = state.store.as_ref();
    let log = repo::load(store, owner).await?;
    let profile = profile::repo::load(store, owner).await?;

    Ok(Progress {
        daily_goal: profile.daily_goal,
        days: daily_trend(log.items(), end, days),
        macro_distribution: macro_distribution(log.items()),
    })
}
