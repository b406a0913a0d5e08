//! # Data Models
//!
//! Persisted entities as one set of structs shared by the Postgres and
//! in-memory stores. Rows map 1:1 onto the tables in `migrations/`, while the
//! serde names follow the JSON casing the frontend consumes.
//!
//! Enum wire form is SCREAMING_SNAKE_CASE on both the JSON and the Postgres
//! side. A visibility value we do not recognize deserializes as `Public`, the
//! permissive branch of the filter rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "pool_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    Open,
    Closed,
    Cancelled,
}

impl PoolStatus {
    /// `Closed` and `Cancelled` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "pool_visibility", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolVisibility {
    Anonymous,
    // Unknown values fall through to the permissive branch.
    #[serde(other)]
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub contributions_visibility: PoolVisibility,
    pub status: PoolStatus,
    pub currency: String,
    pub target_amount: Option<f64>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Immutable once written, the filter and aggregator only ever read these.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub is_visible_to_others: bool,
    pub payment_status: PaymentStatus,
    pub payment_provider: String,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Capability token granting read access to a private pool's contributions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteToken {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
