//! OAuth token storage and refresh-on-demand.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::tokens::{self, NewToken};
use crate::error::AppError;
use crate::models::{OAuthToken, Provider, TokenResponse};
use crate::oauth::{ExchangeError, TokenExchange};

/// Tokens expiring within this window are refreshed before use.
pub const TOKEN_REFRESH_SKEW_SECS: i64 = 5 * 60;

/// Synthetic lifetime for providers whose tokens never expire.
pub const NON_EXPIRING_TOKEN_DAYS: i64 = 365;

/// Why no usable token could be produced. Callers only ever see `None`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no token stored")]
    NotConnected,

    #[error("token is stale and no refresh token is stored")]
    RefreshUnavailable,

    #[error("token exchange failed: {0}")]
    ExchangeFailed(#[from] ExchangeError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RefreshLocks = Arc<DashMap<(String, Provider), Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct TokenLifecycleManager {
    db: SqlitePool,
    exchange: Arc<dyn TokenExchange>,
    /// Serializes refreshes per (user, provider).
    refresh_locks: RefreshLocks,
}

impl TokenLifecycleManager {
    pub fn new(db: SqlitePool, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            db,
            exchange,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// A currently usable access token, refreshing it when stale.
    ///
    /// Missing tokens, missing refresh tokens and exchange failures all come
    /// back as `Ok(None)`; only storage failures are errors.
    pub async fn get_valid_access_token(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> Result<Option<String>, AppError> {
        match self.resolve_access_token(user_id, provider).await {
            Ok(token) => Ok(Some(token)),
            Err(TokenError::NotConnected) => {
                info!(user_id, %provider, "integration not connected");
                Ok(None)
            }
            Err(TokenError::RefreshUnavailable) => {
                warn!(user_id, %provider, "token stale and no refresh token stored");
                Ok(None)
            }
            Err(TokenError::ExchangeFailed(e)) => {
                error!(user_id, %provider, error = %e, "token refresh failed");
                Ok(None)
            }
            Err(TokenError::Database(e)) => Err(AppError::Database(e)),
        }
    }

    async fn resolve_access_token(&self, user_id: &str, provider: Provider) -> Result<String, TokenError> {
        let stored = tokens::find_token(&self.db, user_id, provider)
            .await?
            .ok_or(TokenError::NotConnected)?;
        if is_fresh(&stored, Utc::now()) {
            return Ok(stored.access_token);
        }

        // Entries are never evicted; at most one per (user, provider).
        let lock = self
            .refresh_locks
            .entry((user_id.to_string(), provider))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have refreshed while we waited for the lock.
        let stored = tokens::find_token(&self.db, user_id, provider)
            .await?
            .ok_or(TokenError::NotConnected)?;
        if is_fresh(&stored, Utc::now()) {
            return Ok(stored.access_token);
        }

        let refresh_token = stored
            .refresh_token
            .as_deref()
            .ok_or(TokenError::RefreshUnavailable)?;

        info!(user_id, %provider, "access token stale, refreshing");
        let refreshed = self.exchange.refresh(provider, refresh_token).await?;

        let expires_at = expiry_for(provider, refreshed.expires_in, Utc::now());
        let updated = tokens::update_refreshed_token(
            &self.db,
            &stored.id,
            &refreshed.access_token,
            &refreshed.token_type,
            expires_at,
            refreshed.refresh_token.as_deref(),
        )
        .await?;
        if !updated {
            warn!(user_id, %provider, "token row disappeared during refresh");
        }

        Ok(refreshed.access_token)
    }

    /// Stores the result of an OAuth exchange, replacing any earlier token
    /// for the same (user, provider).
    pub async fn save_token(
        &self,
        user_id: &str,
        provider: Provider,
        response: &TokenResponse,
    ) -> Result<OAuthToken, AppError> {
        let expires_at = expiry_for(provider, response.expires_in, Utc::now());
        let token = tokens::upsert_token(
            &self.db,
            NewToken {
                user_id,
                provider,
                access_token: &response.access_token,
                refresh_token: response.refresh_token.as_deref(),
                token_type: &response.token_type,
                expires_at,
            },
        )
        .await?;

        info!(user_id, %provider, token_id = %token.id, "oauth token saved");
        Ok(token)
    }

    /// Exchanges an authorization code and stores the resulting token.
    pub async fn connect(&self, user_id: &str, provider: Provider, code: &str) -> Result<OAuthToken, AppError> {
        let response = self
            .exchange
            .exchange_code(provider, code)
            .await
            .map_err(|e| match e {
                ExchangeError::Rejected(detail) => AppError::BadRequest(detail),
                other => AppError::Upstream(other.to_string()),
            })?;

        self.save_token(user_id, provider, &response).await
    }

    pub async fn get_token(&self, user_id: &str, provider: Provider) -> Result<Option<OAuthToken>, AppError> {
        Ok(tokens::find_token(&self.db, user_id, provider).await?)
    }
}

/// Fresh means an expiry is known and lies beyond the skew window.
fn is_fresh(token: &OAuthToken, now: DateTime<Utc>) -> bool {
    token
        .expires_at
        .is_some_and(|expires_at| expires_at > now + Duration::seconds(TOKEN_REFRESH_SKEW_SECS))
}

fn expiry_for(provider: Provider, expires_in: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match expires_in {
        Some(secs) => Some(now + Duration::seconds(secs)),
        None if !provider.tokens_expire() => Some(now + Duration::days(NON_EXPIRING_TOKEN_DAYS)),
        None => None,
    }
}
