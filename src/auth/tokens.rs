use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::guard::Identity;

/// Opaque bearer credential. Validity is derived from its age, never stored.
#[derive(Debug, Clone, FromRow)]
pub struct Token {
    pub id: i64,
    pub token: Uuid,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
}

/// Oldest creation time still accepted at `now`.
pub fn expiry_cutoff(now: OffsetDateTime, ttl_sec: i64) -> OffsetDateTime {
    now - Duration::seconds(ttl_sec)
}

/// Persist a fresh random token for `user_id`. Call only after the password checked out.
pub async fn issue(db: &PgPool, user_id: i64) -> sqlx::Result<Token> {
    let token = sqlx::query_as::<_, Token>(
        r#"
        INSERT INTO tokens (token, created_at, user_id)
        VALUES ($1, $2, $3)
        RETURNING id, token, created_at, user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(OffsetDateTime::now_utc())
    .bind(user_id)
    .fetch_one(db)
    .await?;
    debug!(user_id, token_id = token.id, "token issued");
    Ok(token)
}

/// Look up a live token and load its owner.
///
/// Expired and unknown tokens both come back as `None`.
pub async fn resolve(db: &PgPool, presented: Uuid, ttl_sec: i64) -> sqlx::Result<Option<Identity>> {
    let cutoff = expiry_cutoff(OffsetDateTime::now_utc(), ttl_sec);
    sqlx::query_as::<_, Identity>(
        r#"
        SELECT u.id, u.email, u.role
          FROM tokens t
          JOIN users u ON u.id = t.user_id
         WHERE t.token = $1
           AND t.created_at >= $2
        "#,
    )
    .bind(presented)
    .bind(cutoff)
    .fetch_optional(db)
    .await
}
