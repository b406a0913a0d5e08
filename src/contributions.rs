//! # Contributions
//!
//! Recording a contribution charges through the payment capability and writes
//! an immutable row; there is no update or delete path. Listing applies
//! access control (private pools require ownership or an invite token) and
//! then the visibility filter.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    database::Store,
    error::AppError,
    invites::invite_is_expired,
    models::{Contribution, PoolStatus},
    payment::{PaymentProvider, PaymentRequest},
    visibility::filter_contributions,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContributionInput {
    pub amount: f64,
    pub is_visible_to_others: bool,
}

pub async fn create_contribution(
    store: &dyn Store,
    payments: &dyn PaymentProvider,
    user_id: Uuid,
    pool_id: Uuid,
    input: CreateContributionInput,
) -> Result<Contribution, AppError> {
    // NaN fails this comparison too.
    if !(input.amount > 0.0) {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let pool = store
        .pool_by_id(pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;
    if pool.status != PoolStatus::Open {
        return Err(AppError::Conflict("Pool is not open".into()));
    }

    let receipt = payments
        .process_payment(PaymentRequest {
            user_id,
            pool_id,
            amount: input.amount,
        })
        .await?;

    let contribution = Contribution {
        id: Uuid::new_v4(),
        pool_id,
        user_id,
        amount: input.amount,
        currency: pool.currency,
        is_visible_to_others: input.is_visible_to_others,
        payment_status: receipt.status,
        payment_provider: payments.name().into(),
        payment_reference: receipt.reference,
        created_at: Utc::now(),
    };

    store.create_contribution(contribution).await
}

/// Loads a pool's contributions as one viewer sees them.
///
/// A private pool is readable by its owner, or by anyone presenting an
/// invite token minted for that pool; everyone else gets `Forbidden` before
/// any rows are loaded.
pub async fn list_contributions(
    store: &dyn Store,
    pool_id: Uuid,
    viewer_id: Uuid,
    invite: Option<&str>,
) -> Result<Vec<Contribution>, AppError> {
    let pool = store
        .pool_by_id(pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;
    let is_owner = pool.owner_id == viewer_id;

    if !pool.is_public && !is_owner {
        let token = invite.ok_or(AppError::Forbidden)?;
        let invite = store
            .invite_by_token(token)
            .await?
            .filter(|invite| invite.pool_id == pool_id)
            .ok_or(AppError::Forbidden)?;
        if invite_is_expired(&invite, Utc::now()) {
            return Err(AppError::Forbidden);
        }
    }

    let contributions = store.contributions_by_pool(pool_id).await?;
    Ok(filter_contributions(
        &pool,
        &contributions,
        Some(viewer_id),
        is_owner,
    ))
}
