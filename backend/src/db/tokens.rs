use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{OAuthToken, Provider};

const TOKEN_COLUMNS: &str = "id, user_id, provider, access_token, refresh_token, token_type, \
     expires_at, created_at, updated_at";

pub async fn find_token(
    db: &SqlitePool,
    user_id: &str,
    provider: Provider,
) -> Result<Option<OAuthToken>, sqlx::Error> {
    sqlx::query_as::<_, OAuthToken>(&format!(
        "SELECT {} FROM oauth_tokens WHERE user_id = ?1 AND provider = ?2",
        TOKEN_COLUMNS
    ))
    .bind(user_id)
    .bind(provider.as_str())
    .fetch_optional(db)
    .await
}

#[derive(Debug, Clone)]
pub struct NewToken<'a> {
    pub user_id: &'a str,
    pub provider: Provider,
    pub access_token: &'a str,
    pub refresh_token: Option<&'a str>,
    pub token_type: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}

/// One row per (user, provider). A missing refresh token keeps the stored one.
pub async fn upsert_token(db: &SqlitePool, token: NewToken<'_>) -> Result<OAuthToken, sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO oauth_tokens
            (id, user_id, provider, access_token, refresh_token, token_type,
            expires_at, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        ON CONFLICT (user_id, provider) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = COALESCE(excluded.refresh_token, oauth_tokens.refresh_token),
            token_type = excluded.token_type,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(token.user_id)
    .bind(token.provider.as_str())
    .bind(token.access_token)
    .bind(token.refresh_token)
    .bind(token.token_type)
    .bind(token.expires_at)
    .bind(now)
    .execute(db)
    .await?;

    find_token(db, token.user_id, token.provider)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Writes refreshed credentials in place; returns false if the row is gone.
pub async fn update_refreshed_token(
    db: &SqlitePool,
    id: &str,
    access_token: &str,
    token_type: &str,
    expires_at: Option<DateTime<Utc>>,
    rotated_refresh_token: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE oauth_tokens
        SET access_token = ?1,
            token_type = ?2,
            expires_at = ?3,
            refresh_token = COALESCE(?4, refresh_token),
            updated_at = ?5
        WHERE id = ?6
        "#,
    )
    .bind(access_token)
    .bind(token_type)
    .bind(expires_at)
    .bind(rotated_refresh_token)
    .bind(Utc::now())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_test_db() -> SqlitePool {
        let pool = crate::db::connect_in_memory()
            .await
            .expect("Failed to create test db");
        crate::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row_and_refresh_token() {
        let pool = setup_test_db().await;
        let expires = Utc::now() + Duration::hours(1);

        let first = upsert_token(
            &pool,
            NewToken {
                user_id: "u1",
                provider: Provider::Drive,
                access_token: "access-1",
                refresh_token: Some("refresh-1"),
                token_type: "Bearer",
                expires_at: Some(expires),
            },
        )
        .await
        .expect("Failed to save token");
        assert_eq!(first.refresh_token.as_deref(), Some("refresh-1"));

        let second = upsert_token(
            &pool,
            NewToken {
                user_id: "u1",
                provider: Provider::Drive,
                access_token: "access-2",
                refresh_token: None,
                token_type: "Bearer",
                expires_at: Some(expires),
            },
        )
        .await
        .expect("Failed to save token");

        assert_eq!(second.id, first.id);
        assert_eq!(second.access_token, "access-2");
        assert_eq!(second.refresh_token.as_deref(), Some("refresh-1"));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM oauth_tokens")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_tokens_are_scoped_by_provider() {
        let pool = setup_test_db().await;

        upsert_token(
            &pool,
            NewToken {
                user_id: "u1",
                provider: Provider::Github,
                access_token: "gho_abc",
                refresh_token: None,
                token_type: "bearer",
                expires_at: None,
            },
        )
        .await
        .unwrap();

        assert!(find_token(&pool, "u1", Provider::Drive).await.unwrap().is_none());
        let github = find_token(&pool, "u1", Provider::Github).await.unwrap().unwrap();
        assert_eq!(github.provider, "github");
        assert!(github.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_update_refreshed_token_in_place() {
        let pool = setup_test_db().await;
        let stored = upsert_token(
            &pool,
            NewToken {
                user_id: "u1",
                provider: Provider::Drive,
                access_token: "old",
                refresh_token: Some("keep-me"),
                token_type: "Bearer",
                expires_at: Some(Utc::now()),
            },
        )
        .await
        .unwrap();

        let new_expiry = Utc::now() + Duration::seconds(3600);
        let updated = update_refreshed_token(&pool, &stored.id, "new", "Bearer", Some(new_expiry), None)
            .await
            .unwrap();
        assert!(updated);

        let reloaded = find_token(&pool, "u1", Provider::Drive).await.unwrap().unwrap();
        assert_eq!(reloaded.access_token, "new");
        assert_eq!(reloaded.refresh_token.as_deref(), Some("keep-me"));
        assert!(reloaded.expires_at.unwrap() > stored.expires_at.unwrap());

        assert!(!update_refreshed_token(&pool, "missing", "x", "Bearer", None, None).await.unwrap());
    }
}
