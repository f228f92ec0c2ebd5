use axum::Json;
use axum::extract::{Path, Query, State};

use crate::api::auth::AuthUser;
use crate::error::AppError;
use crate::models::oauth::redact;
use crate::models::*;
use crate::state::AppState;

fn parse_provider(raw: &str) -> Result<Provider, AppError> {
    raw.parse::<Provider>().map_err(AppError::BadRequest)
}

pub async fn auth_url(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<AuthUrlQuery>,
) -> Result<Json<AuthUrlResponse>, AppError> {
    let provider = parse_provider(&provider)?;
    if !state.config.oauth.provider(provider).is_configured() {
        return Err(AppError::BadRequest(format!("{} OAuth is not configured", provider)));
    }

    let auth_url = state
        .config
        .oauth
        .authorization_url(provider, query.state.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(AuthUrlResponse { auth_url }))
}

pub async fn callback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
    Json(req): Json<OAuthCallbackRequest>,
) -> Result<Json<OAuthTokenView>, AppError> {
    let provider = parse_provider(&provider)?;
    if req.code.is_empty() {
        return Err(AppError::BadRequest("code must not be empty".to_string()));
    }

    let token = state.tokens.connect(&user.user_id, provider, &req.code).await?;
    Ok(Json(OAuthTokenView::from(&token)))
}

pub async fn get_token(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
) -> Result<Json<OAuthTokenView>, AppError> {
    let provider = parse_provider(&provider)?;
    let token = state
        .tokens
        .get_token(&user.user_id, provider)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(OAuthTokenView::from(&token)))
}

/// Returns a usable access token (redacted), refreshing it first if stale.
pub async fn refresh_token(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let provider = parse_provider(&provider)?;
    let access_token = state
        .tokens
        .get_valid_access_token(&user.user_id, provider)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(RefreshTokenResponse {
        provider: provider.to_string(),
        token_preview: redact(&access_token),
        message: "Access token is valid".to_string(),
    }))
}
