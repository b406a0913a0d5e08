//! # Invites
//!
//! Tokenized links granting read access to a private pool without owning it.
//! Tokens are opaque UUID strings; minting one notifies the owner through the
//! email capability.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    database::Store,
    email::{EmailSender, InviteEmail},
    error::AppError,
    models::InviteToken,
};

/// Trimmed pool summary returned when a token validates: enough for the
/// invite landing page, nothing a non-member should not see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePoolInfo {
    pub id: Uuid,
    pub title: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidatedInvite {
    pub pool: InvitePoolInfo,
}

pub fn invite_is_expired(invite: &InviteToken, now: DateTime<Utc>) -> bool {
    invite.expires_at.is_some_and(|expires_at| expires_at < now)
}

pub async fn generate_invite(
    store: &dyn Store,
    mailer: &dyn EmailSender,
    pool_id: Uuid,
    owner_id: Uuid,
) -> Result<InviteToken, AppError> {
    let pool = store
        .pool_by_id(pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;
    if pool.owner_id != owner_id {
        return Err(AppError::Forbidden);
    }

    let invite = store
        .create_invite(InviteToken {
            id: Uuid::new_v4(),
            pool_id,
            token: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            expires_at: None,
        })
        .await?;

    let to = store
        .user_by_id(owner_id)
        .await?
        .map(|owner| owner.email)
        .unwrap_or_else(|| owner_id.to_string());
    mailer
        .send_invite_email(InviteEmail {
            to,
            pool_title: pool.title,
            invite_url: invite.token.clone(),
        })
        .await?;

    Ok(invite)
}

pub async fn validate_invite(store: &dyn Store, token: &str) -> Result<ValidatedInvite, AppError> {
    let invite = store
        .invite_by_token(token)
        .await?
        .ok_or(AppError::NotFound("invite"))?;
    if invite_is_expired(&invite, Utc::now()) {
        return Err(AppError::Forbidden);
    }

    let pool = store
        .pool_by_id(invite.pool_id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;

    Ok(ValidatedInvite {
        pool: InvitePoolInfo {
            id: pool.id,
            title: pool.title,
            is_public: pool.is_public,
        },
    })
}
