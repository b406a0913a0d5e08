//! # Pools
//!
//! Pool creation, partial updates, and the `OPEN -> CLOSED` lifecycle.
//!
//! Closing is the only transition-triggering operation: it is valid while the
//! pool is `OPEN`, returns the aggregation summary over the pool's
//! contributions, and fails with a conflict on any terminal pool. The
//! deadline sweep drives the same operation from a background task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::Store,
    error::AppError,
    models::{Pool, PoolStatus, PoolVisibility},
    state::AppState,
    visibility::{aggregate, PoolSummary},
};

const DEFAULT_CURRENCY: &str = "ARS";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolInput {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub contributions_visibility: PoolVisibility,
    pub target_amount: Option<f64>,
    pub currency: Option<String>,
    pub deadline: DateTime<Utc>,
}

/// Absent fields leave the stored value untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePoolInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub contributions_visibility: Option<PoolVisibility>,
    pub target_amount: Option<f64>,
    pub currency: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<PoolStatus>,
}

pub async fn create_pool(
    store: &dyn Store,
    owner_id: Uuid,
    input: CreatePoolInput,
) -> Result<Pool, AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    if input.deadline <= Utc::now() {
        return Err(AppError::Validation("deadline must be in the future".into()));
    }
    if let Some(target) = input.target_amount {
        if !(target > 0.0) {
            return Err(AppError::Validation("target amount must be positive".into()));
        }
    }

    let pool = Pool {
        id: Uuid::new_v4(),
        owner_id,
        title: input.title,
        description: input.description,
        is_public: input.is_public,
        contributions_visibility: input.contributions_visibility,
        status: PoolStatus::Open,
        currency: input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.into()),
        target_amount: input.target_amount,
        deadline: input.deadline,
        created_at: Utc::now(),
    };

    store.create_pool(pool).await
}

pub async fn update_pool(
    store: &dyn Store,
    pool_id: Uuid,
    owner_id: Uuid,
    input: UpdatePoolInput,
) -> Result<Pool, AppError> {
    let pool = store
        .pool_by_id(pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;
    if pool.owner_id != owner_id {
        return Err(AppError::Forbidden);
    }

    if let Some(status) = input.status {
        // Closed and cancelled are terminal.
        if status != pool.status && pool.status.is_terminal() {
            return Err(AppError::Conflict("Cannot reopen a closed pool".into()));
        }
    }

    let mut updated = pool;
    if let Some(title) = input.title {
        updated.title = title;
    }
    if let Some(description) = input.description {
        updated.description = Some(description);
    }
    if let Some(is_public) = input.is_public {
        updated.is_public = is_public;
    }
    if let Some(visibility) = input.contributions_visibility {
        updated.contributions_visibility = visibility;
    }
    if let Some(target_amount) = input.target_amount {
        updated.target_amount = Some(target_amount);
    }
    if let Some(currency) = input.currency {
        updated.currency = currency;
    }
    if let Some(deadline) = input.deadline {
        updated.deadline = deadline;
    }
    if let Some(status) = input.status {
        updated.status = status;
    }

    store.update_pool(updated).await
}

/// Closes an `OPEN` pool and returns the aggregation summary over its
/// contributions. `owner_id` is `None` when the sweep closes on behalf of the
/// deadline rather than a caller.
pub async fn close_pool(
    store: &dyn Store,
    pool_id: Uuid,
    owner_id: Option<Uuid>,
) -> Result<PoolSummary, AppError> {
    let pool = store
        .pool_by_id(pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;

    if let Some(owner_id) = owner_id {
        if pool.owner_id != owner_id {
            return Err(AppError::Forbidden);
        }
    }

    if pool.status != PoolStatus::Open {
        return Err(AppError::Conflict("Pool is not open".into()));
    }

    let contributions = store.contributions_by_pool(pool_id).await?;
    let summary = aggregate(&contributions);

    let mut closed = pool;
    closed.status = PoolStatus::Closed;
    store.update_pool(closed).await?;

    Ok(summary)
}

/// Closes every `OPEN` pool whose deadline has passed, returning the count.
/// A re-run finds nothing: only `OPEN` pools are selected.
pub async fn auto_close_expired_pools(store: &dyn Store) -> Result<usize, AppError> {
    let expired = store.expired_open_pools(Utc::now()).await?;
    let count = expired.len();

    for pool in expired {
        close_pool(store, pool.id, None).await?;
    }

    Ok(count)
}

pub fn spawn_deadline_sweep(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(state.config.sweep_interval_secs));
        loop {
            ticker.tick().await;
            match auto_close_expired_pools(state.store.as_ref()).await {
                Ok(0) => {}
                Ok(count) => info!("Deadline sweep closed {count} pools"),
                Err(err) => warn!("Deadline sweep failed: {err}"),
            }
        }
    });
}
