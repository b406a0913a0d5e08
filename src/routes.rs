use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{self, AuthUser, LoginInput, LoginResponse, RegisterInput, UserInfo},
    contributions::{self, CreateContributionInput},
    error::AppError,
    invites::{self, ValidatedInvite},
    models::{Contribution, InviteToken, Pool},
    pools::{self, CreatePoolInput, UpdatePoolInput},
    state::AppState,
    visibility::PoolSummary,
};

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::register(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = auth::login(state.store.as_ref(), &state.config.jwt_secret, input).await?;
    Ok(Json(response))
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserInfo>, AppError> {
    let user = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

pub async fn create_pool_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(input): Json<CreatePoolInput>,
) -> Result<impl IntoResponse, AppError> {
    let pool = pools::create_pool(state.store.as_ref(), user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

pub async fn list_pools_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Pool>>, AppError> {
    Ok(Json(state.store.pools_by_owner(user.user_id).await?))
}

pub async fn public_pools_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Pool>>, AppError> {
    Ok(Json(state.store.public_open_pools().await?))
}

pub async fn get_pool_handler(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Pool>, AppError> {
    let pool = state
        .store
        .pool_by_id(id)
        .await?
        .ok_or(AppError::NotFound("pool"))?;
    Ok(Json(pool))
}

pub async fn update_pool_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePoolInput>,
) -> Result<Json<Pool>, AppError> {
    let pool = pools::update_pool(state.store.as_ref(), id, user.user_id, input).await?;
    Ok(Json(pool))
}

pub async fn close_pool_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PoolSummary>, AppError> {
    let summary = pools::close_pool(state.store.as_ref(), id, Some(user.user_id)).await?;
    Ok(Json(summary))
}

pub async fn create_contribution_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateContributionInput>,
) -> Result<impl IntoResponse, AppError> {
    let contribution = contributions::create_contribution(
        state.store.as_ref(),
        state.payments.as_ref(),
        user.user_id,
        id,
        input,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(contribution)))
}

#[derive(Debug, Deserialize)]
pub struct ContributionListQuery {
    pub invite: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContributionList {
    pub contributions: Vec<Contribution>,
}

pub async fn list_contributions_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ContributionListQuery>,
) -> Result<Json<ContributionList>, AppError> {
    let contributions = contributions::list_contributions(
        state.store.as_ref(),
        id,
        user.user_id,
        query.invite.as_deref(),
    )
    .await?;
    Ok(Json(ContributionList { contributions }))
}

pub async fn create_invite_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InviteToken>, AppError> {
    let invite = invites::generate_invite(
        state.store.as_ref(),
        state.mailer.as_ref(),
        id,
        user.user_id,
    )
    .await?;
    Ok(Json(invite))
}

pub async fn validate_invite_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ValidatedInvite>, AppError> {
    let validated = invites::validate_invite(state.store.as_ref(), &token).await?;
    Ok(Json(validated))
}
