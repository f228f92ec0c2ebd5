//! Configuration loaded from the environment (and `.env` when present).

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::models::Provider;

/// OAuth client settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub github: ProviderConfig,
    pub drive: ProviderConfig,
}

impl OAuthConfig {
    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Github => &self.github,
            Provider::Drive => &self.drive,
        }
    }

    /// Consent-screen URL for `provider`.
    pub fn authorization_url(
        &self,
        provider: Provider,
        state: Option<&str>,
    ) -> Result<String, ConfigError> {
        let cfg = self.provider(provider);
        let state = state.unwrap_or("default_state");

        let mut params = vec![
            ("client_id", cfg.client_id.as_str()),
            ("redirect_uri", cfg.redirect_uri.as_str()),
            ("scope", cfg.scope.as_str()),
            ("state", state),
        ];
        if provider == Provider::Drive {
            // Google only issues a refresh token for offline access with consent.
            params.push(("response_type", "code"));
            params.push(("access_type", "offline"));
            params.push(("prompt", "consent"));
        }

        let url = reqwest::Url::parse_with_params(&cfg.auth_url, &params)
            .map_err(|e| ConfigError::Invalid("auth_url", e.to_string()))?;
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    pub oauth: OAuthConfig,
    pub oauth_http_timeout: Duration,
    pub ai_api_base_url: String,
    pub ai_api_timeout: Duration,
}

impl Default for Config {
    /// Test configuration; never reaches a real provider.
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            oauth: OAuthConfig {
                github: ProviderConfig {
                    client_id: "test_github_id".to_string(),
                    client_secret: "test_github_secret".to_string(),
                    redirect_uri: "http://localhost:3000/oauth/github/callback".to_string(),
                    auth_url: GITHUB_AUTH_URL.to_string(),
                    token_url: GITHUB_TOKEN_URL.to_string(),
                    scope: "repo".to_string(),
                },
                drive: ProviderConfig {
                    client_id: "test_google_id".to_string(),
                    client_secret: "test_google_secret".to_string(),
                    redirect_uri: "http://localhost:3000/oauth/drive/callback".to_string(),
                    auth_url: GOOGLE_AUTH_URL.to_string(),
                    token_url: GOOGLE_TOKEN_URL.to_string(),
                    scope: DRIVE_SCOPE.to_string(),
                },
            },
            oauth_http_timeout: Duration::from_secs(10),
            ai_api_base_url: "http://localhost:8001".to_string(),
            ai_api_timeout: Duration::from_secs(60),
        }
    }
}

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host: IpAddr = var_or("HOST", "127.0.0.1")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid("HOST", e.to_string()))?;
        let port = parse_var("PORT", 3000u16)?;

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://tara.db?mode=rwc"),
            addr: SocketAddr::new(host, port),
            oauth: OAuthConfig {
                github: ProviderConfig {
                    client_id: var_or("GITHUB_CLIENT_ID", ""),
                    client_secret: var_or("GITHUB_CLIENT_SECRET", ""),
                    redirect_uri: var_or(
                        "GITHUB_REDIRECT_URI",
                        "http://localhost:3000/oauth/github/callback",
                    ),
                    auth_url: var_or("GITHUB_AUTH_URL", GITHUB_AUTH_URL),
                    token_url: var_or("GITHUB_TOKEN_URL", GITHUB_TOKEN_URL),
                    scope: var_or("GITHUB_SCOPE", "repo"),
                },
                drive: ProviderConfig {
                    client_id: var_or("GOOGLE_CLIENT_ID", ""),
                    client_secret: var_or("GOOGLE_CLIENT_SECRET", ""),
                    redirect_uri: var_or(
                        "GOOGLE_REDIRECT_URI",
                        "http://localhost:3000/oauth/drive/callback",
                    ),
                    auth_url: var_or("GOOGLE_AUTH_URL", GOOGLE_AUTH_URL),
                    token_url: var_or("GOOGLE_TOKEN_URL", GOOGLE_TOKEN_URL),
                    scope: var_or("GOOGLE_DRIVE_SCOPE", DRIVE_SCOPE),
                },
            },
            oauth_http_timeout: Duration::from_secs(parse_var("OAUTH_HTTP_TIMEOUT_SECS", 10u64)?),
            ai_api_base_url: var_or("AI_API_BASE_URL", "http://localhost:8001"),
            ai_api_timeout: Duration::from_secs(parse_var("AI_API_TIMEOUT_SECS", 60u64)?),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(key, e.to_string())),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_auth_url_requests_offline_access() {
        let config = Config::default();
        let url = config
            .oauth
            .authorization_url(Provider::Drive, Some("xyz"))
            .unwrap();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=test_google_id"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("state=xyz"));
    }

    #[test]
    fn github_auth_url_uses_default_state() {
        let config = Config::default();
        let url = config.oauth.authorization_url(Provider::Github, None).unwrap();

        assert!(url.starts_with(GITHUB_AUTH_URL));
        assert!(url.contains("scope=repo"));
        assert!(url.contains("state=default_state"));
        assert!(!url.contains("access_type"));
    }

    #[test]
    fn unset_provider_is_not_configured() {
        let mut config = Config::default();
        config.oauth.github.client_secret.clear();
        assert!(!config.oauth.github.is_configured());
        assert!(config.oauth.drive.is_configured());
    }
}
