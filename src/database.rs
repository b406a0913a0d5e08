//! # Storage
//!
//! One relational schema (see `migrations/`), two stores behind the same
//! trait.
//!
//! ## Requirements
//!
//! - Users, pools, contributions, and invite tokens with referential
//!   integrity (a contribution never outlives its pool reference)
//! - Contribution listings in insertion order, the filter is stable and must
//!   receive rows the way they were written
//! - Email uniqueness surfaced as a conflict, not a driver error
//!
//! ## Implementation
//!
//! - [`PgStore`]: sqlx over Postgres, runtime-checked queries, embedded
//!   migrations run at startup
//! - [`MemoryStore`]: `Mutex<Vec<_>>` tables for tests and local demos, same
//!   ordering guarantees as the SQL store
//!
//! The store is handed to [`crate::state::AppState`] as `Arc<dyn Store>` at
//! construction, so tests swap implementations without touching the services.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Contribution, InviteToken, Pool, PoolStatus, User},
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, AppError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn create_pool(&self, pool: Pool) -> Result<Pool, AppError>;
    async fn pool_by_id(&self, id: Uuid) -> Result<Option<Pool>, AppError>;
    /// Replaces the stored row for `pool.id`.
    async fn update_pool(&self, pool: Pool) -> Result<Pool, AppError>;
    async fn pools_by_owner(&self, owner_id: Uuid) -> Result<Vec<Pool>, AppError>;
    async fn public_open_pools(&self) -> Result<Vec<Pool>, AppError>;
    /// `OPEN` pools whose deadline is at or before `now`.
    async fn expired_open_pools(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, AppError>;

    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, AppError>;
    async fn contributions_by_pool(&self, pool_id: Uuid) -> Result<Vec<Contribution>, AppError>;

    async fn create_invite(&self, invite: InviteToken) -> Result<InviteToken, AppError>;
    async fn invite_by_token(&self, token: &str) -> Result<Option<InviteToken>, AppError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(err) if is_unique_violation(&err) => {
                Err(AppError::Conflict("Email already registered".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_pool(&self, pool: Pool) -> Result<Pool, AppError> {
        sqlx::query(
            "INSERT INTO pools (id, owner_id, title, description, is_public,
                                contributions_visibility, status, currency,
                                target_amount, deadline, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(pool.id)
        .bind(pool.owner_id)
        .bind(&pool.title)
        .bind(&pool.description)
        .bind(pool.is_public)
        .bind(pool.contributions_visibility)
        .bind(pool.status)
        .bind(&pool.currency)
        .bind(pool.target_amount)
        .bind(pool.deadline)
        .bind(pool.created_at)
        .execute(&self.pool)
        .await?;
        Ok(pool)
    }

    async fn pool_by_id(&self, id: Uuid) -> Result<Option<Pool>, AppError> {
        let pool = sqlx::query_as::<_, Pool>("SELECT * FROM pools WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(pool)
    }

    async fn update_pool(&self, pool: Pool) -> Result<Pool, AppError> {
        let result = sqlx::query(
            "UPDATE pools
             SET title = $2, description = $3, is_public = $4,
                 contributions_visibility = $5, status = $6, currency = $7,
                 target_amount = $8, deadline = $9
             WHERE id = $1",
        )
        .bind(pool.id)
        .bind(&pool.title)
        .bind(&pool.description)
        .bind(pool.is_public)
        .bind(pool.contributions_visibility)
        .bind(pool.status)
        .bind(&pool.currency)
        .bind(pool.target_amount)
        .bind(pool.deadline)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("pool"));
        }
        Ok(pool)
    }

    async fn pools_by_owner(&self, owner_id: Uuid) -> Result<Vec<Pool>, AppError> {
        let pools = sqlx::query_as::<_, Pool>(
            "SELECT * FROM pools WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pools)
    }

    async fn public_open_pools(&self) -> Result<Vec<Pool>, AppError> {
        let pools = sqlx::query_as::<_, Pool>(
            "SELECT * FROM pools WHERE is_public AND status = 'OPEN' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(pools)
    }

    async fn expired_open_pools(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, AppError> {
        let pools = sqlx::query_as::<_, Pool>(
            "SELECT * FROM pools WHERE status = 'OPEN' AND deadline <= $1 ORDER BY deadline",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(pools)
    }

    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, AppError> {
        sqlx::query(
            "INSERT INTO contributions (id, pool_id, user_id, amount, currency,
                                        is_visible_to_others, payment_status,
                                        payment_provider, payment_reference, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(contribution.id)
        .bind(contribution.pool_id)
        .bind(contribution.user_id)
        .bind(contribution.amount)
        .bind(&contribution.currency)
        .bind(contribution.is_visible_to_others)
        .bind(contribution.payment_status)
        .bind(&contribution.payment_provider)
        .bind(&contribution.payment_reference)
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await?;
        Ok(contribution)
    }

    async fn contributions_by_pool(&self, pool_id: Uuid) -> Result<Vec<Contribution>, AppError> {
        let contributions = sqlx::query_as::<_, Contribution>(
            "SELECT * FROM contributions WHERE pool_id = $1 ORDER BY created_at, id",
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contributions)
    }

    async fn create_invite(&self, invite: InviteToken) -> Result<InviteToken, AppError> {
        sqlx::query(
            "INSERT INTO invite_tokens (id, pool_id, token, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(invite.id)
        .bind(invite.pool_id)
        .bind(&invite.token)
        .bind(invite.created_at)
        .bind(invite.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn invite_by_token(&self, token: &str) -> Result<Option<InviteToken>, AppError> {
        let invite =
            sqlx::query_as::<_, InviteToken>("SELECT * FROM invite_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(invite)
    }
}

/// In-memory tables, insertion-ordered like their SQL counterparts.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    pools: Vec<Pool>,
    contributions: Vec<Contribution>,
    invites: Vec<InviteToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut tables = self.inner.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_pool(&self, pool: Pool) -> Result<Pool, AppError> {
        let mut tables = self.inner.lock().unwrap();
        tables.pools.push(pool.clone());
        Ok(pool)
    }

    async fn pool_by_id(&self, id: Uuid) -> Result<Option<Pool>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.pools.iter().find(|p| p.id == id).cloned())
    }

    async fn update_pool(&self, pool: Pool) -> Result<Pool, AppError> {
        let mut tables = self.inner.lock().unwrap();
        let stored = tables
            .pools
            .iter_mut()
            .find(|p| p.id == pool.id)
            .ok_or(AppError::NotFound("pool"))?;
        *stored = pool.clone();
        Ok(pool)
    }

    async fn pools_by_owner(&self, owner_id: Uuid) -> Result<Vec<Pool>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .pools
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn public_open_pools(&self) -> Result<Vec<Pool>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .pools
            .iter()
            .filter(|p| p.is_public && p.status == PoolStatus::Open)
            .cloned()
            .collect())
    }

    async fn expired_open_pools(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .pools
            .iter()
            .filter(|p| p.status == PoolStatus::Open && p.deadline <= now)
            .cloned()
            .collect())
    }

    async fn create_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, AppError> {
        let mut tables = self.inner.lock().unwrap();
        tables.contributions.push(contribution.clone());
        Ok(contribution)
    }

    async fn contributions_by_pool(&self, pool_id: Uuid) -> Result<Vec<Contribution>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .contributions
            .iter()
            .filter(|c| c.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn create_invite(&self, invite: InviteToken) -> Result<InviteToken, AppError> {
        let mut tables = self.inner.lock().unwrap();
        tables.invites.push(invite.clone());
        Ok(invite)
    }

    async fn invite_by_token(&self, token: &str) -> Result<Option<InviteToken>, AppError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.invites.iter().find(|i| i.token == token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, PoolVisibility};

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Demo User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            created_at: Utc::now(),
        }
    }

    fn pool(owner_id: Uuid) -> Pool {
        Pool {
            id: Uuid::new_v4(),
            owner_id,
            title: "Asado fund".into(),
            description: None,
            is_public: true,
            contributions_visibility: PoolVisibility::Public,
            status: PoolStatus::Open,
            currency: "ARS".into(),
            target_amount: None,
            deadline: Utc::now() + chrono::Duration::days(7),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(user("demo@vaquita.local")).await.unwrap();

        let err = store
            .create_user(user("demo@vaquita.local"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_pool_replaces_row() {
        let store = MemoryStore::new();
        let created = store.create_pool(pool(Uuid::new_v4())).await.unwrap();

        let mut closed = created.clone();
        closed.status = PoolStatus::Closed;
        store.update_pool(closed).await.unwrap();

        let fetched = store.pool_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, PoolStatus::Closed);
    }

    #[tokio::test]
    async fn test_update_missing_pool_not_found() {
        let store = MemoryStore::new();
        let err = store.update_pool(pool(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("pool")));
    }

    #[tokio::test]
    async fn test_contributions_keep_insertion_order() {
        let store = MemoryStore::new();
        let pool = store.create_pool(pool(Uuid::new_v4())).await.unwrap();

        let mut ids = Vec::new();
        for amount in [10.0, 20.0, 30.0] {
            let contribution = Contribution {
                id: Uuid::new_v4(),
                pool_id: pool.id,
                user_id: Uuid::new_v4(),
                amount,
                currency: "ARS".into(),
                is_visible_to_others: true,
                payment_status: PaymentStatus::Paid,
                payment_provider: "MOCK".into(),
                payment_reference: Uuid::new_v4().to_string(),
                created_at: Utc::now(),
            };
            ids.push(contribution.id);
            store.create_contribution(contribution).await.unwrap();
        }

        let listed = store.contributions_by_pool(pool.id).await.unwrap();
        let listed_ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn test_expired_open_pools_skips_closed() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut expired = pool(Uuid::new_v4());
        expired.deadline = now - chrono::Duration::hours(1);
        let expired = store.create_pool(expired).await.unwrap();

        let mut closed = pool(Uuid::new_v4());
        closed.deadline = now - chrono::Duration::hours(1);
        closed.status = PoolStatus::Closed;
        store.create_pool(closed).await.unwrap();

        let mut future = pool(Uuid::new_v4());
        future.deadline = now + chrono::Duration::hours(1);
        store.create_pool(future).await.unwrap();

        let found = store.expired_open_pools(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, expired.id);
    }

    #[tokio::test]
    async fn test_invite_lookup_by_token() {
        let store = MemoryStore::new();
        let invite = InviteToken {
            id: Uuid::new_v4(),
            pool_id: Uuid::new_v4(),
            token: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            expires_at: None,
        };
        store.create_invite(invite.clone()).await.unwrap();

        let found = store.invite_by_token(&invite.token).await.unwrap();
        assert_eq!(found.unwrap().id, invite.id);
        assert!(store.invite_by_token("missing").await.unwrap().is_none());
    }
}
