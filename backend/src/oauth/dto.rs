use serde::Deserialize;

use crate::models::TokenResponse;
use crate::models::oauth::default_token_type;

/// Raw token endpoint body. GitHub answers errors with HTTP 200 and an
/// `error` field, so every field is optional until validated.
#[derive(Debug, Deserialize)]
pub struct RawTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

pub enum Parsed {
    Token(TokenResponse),
    Rejected(String),
    Malformed(&'static str),
}

impl RawTokenResponse {
    pub fn into_parsed(self) -> Parsed {
        if let Some(error) = self.error {
            let detail = match self.error_description {
                Some(desc) => format!("{}: {}", error, desc),
                None => error,
            };
            return Parsed::Rejected(detail);
        }

        match self.access_token {
            Some(access_token) if !access_token.is_empty() => Parsed::Token(TokenResponse {
                access_token,
                token_type: self.token_type.unwrap_or_else(default_token_type),
                expires_in: self.expires_in,
                refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
                scope: self.scope,
            }),
            _ => Parsed::Malformed("missing access_token"),
        }
    }
}
