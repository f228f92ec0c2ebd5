pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use thiserror::Error;

use crate::config::OAuthConfig;
use crate::models::{Provider, TokenResponse};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token endpoint rejected the grant: {0}")]
    Rejected(String),

    #[error("malformed token response: {0}")]
    Malformed(String),

    #[error("provider {0} is not configured")]
    NotConfigured(Provider),
}

/// Talks to a provider's OAuth token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> Result<TokenResponse, ExchangeError>;

    async fn exchange_code(&self, provider: Provider, code: &str)
        -> Result<TokenResponse, ExchangeError>;
}

pub struct OAuthHttpClient {
    client: Client,
    config: OAuthConfig,
}

impl OAuthHttpClient {
    pub fn new(config: OAuthConfig, timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    async fn request_token(
        &self,
        provider: Provider,
        grant: &[(&str, &str)],
    ) -> Result<TokenResponse, ExchangeError> {
        let cfg = self.config.provider(provider);
        if !cfg.is_configured() {
            return Err(ExchangeError::NotConfigured(provider));
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", cfg.client_id.as_str()),
            ("client_secret", cfg.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .client
            .post(&cfg.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw: dto::RawTokenResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        match raw.into_parsed() {
            dto::Parsed::Token(token) => Ok(token),
            dto::Parsed::Rejected(detail) => Err(ExchangeError::Rejected(detail)),
            dto::Parsed::Malformed(reason) => Err(ExchangeError::Malformed(reason.to_string())),
        }
    }
}

#[async_trait]
impl TokenExchange for OAuthHttpClient {
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> Result<TokenResponse, ExchangeError> {
        tracing::debug!(%provider, "refreshing access token");
        self.request_token(
            provider,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<TokenResponse, ExchangeError> {
        let redirect_uri = self.config.provider(provider).redirect_uri.clone();
        tracing::debug!(%provider, "exchanging authorization code");
        self.request_token(
            provider,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
            ],
        )
        .await
    }
}
