use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record. The OTP pair and password hash never serialize; `token` is
/// transient and only populated in login-type responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub role: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<i32>,
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    #[serde(skip_serializing)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub otp_expired: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub status_deleted: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub user_created: Option<serde_json::Value>,
    pub user_updated: Option<serde_json::Value>,
    pub user_deleted: Option<serde_json::Value>,
    #[sqlx(default)]
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub role: &'a str,
    pub display_name: &'a str,
    pub email: &'a str,
    pub password: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub status: i32,
}

#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub role: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Lookup used by the login paths: active accounts only, which also
    /// excludes soft-deleted rows since deletion forces status to 0.
    pub async fn find_active_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND status = 1")
                .bind(email)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    /// Any-status lookup; the signup duplicate check runs against this.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn email_taken_by_other(db: &PgPool, email: &str, id: Uuid) -> anyhow::Result<bool> {
        let existing =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(existing.is_some())
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (role, display_name, email, password, image_url, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.role)
        .bind(new.display_name)
        .bind(new.email)
        .bind(new.password)
        .bind(new.image_url)
        .bind(new.status)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: ProfileChanges<'_>,
        stamp: &serde_json::Value,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                role = COALESCE($2, role),
                display_name = COALESCE($3, display_name),
                email = COALESCE($4, email),
                password = COALESCE($5, password),
                image_url = COALESCE($6, image_url),
                updated_at = now(),
                user_updated = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.role)
        .bind(changes.display_name)
        .bind(changes.email)
        .bind(changes.password)
        .bind(changes.image_url)
        .bind(stamp)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_otp(
        db: &PgPool,
        id: Uuid,
        otp: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET otp = $2, otp_expired = $3, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(otp)
            .bind(expiry)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Single-use redemption: one conditional UPDATE clears the OTP pair and
    /// installs the new password, so two concurrent resets with the same code
    /// cannot both succeed.
    pub async fn consume_otp(
        db: &PgPool,
        otp: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET otp = NULL, otp_expired = NULL, password = $2, updated_at = now()
            WHERE otp = $1 AND otp_expired > now() AND status_deleted = 0
            RETURNING *
            "#,
        )
        .bind(otp)
        .bind(password)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn soft_delete(
        db: &PgPool,
        id: Uuid,
        stamp: &serde_json::Value,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET status = 0, status_deleted = 1, deleted_at = now(), user_deleted = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(stamp)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            role: "member".into(),
            display_name: "Alice Example".into(),
            email: "alice@example.com".into(),
            password: Some("$argon2id$hash".into()),
            image_url: None,
            status: Some(1),
            otp: Some("abc123def456".into()),
            otp_expired: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            status_deleted: 0,
            deleted_at: None,
            user_created: None,
            user_updated: None,
            user_deleted: None,
            token: None,
        }
    }

    #[test]
    fn secrets_never_serialize() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("otp").is_none());
        assert!(json.get("otpExpired").is_none());
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("statusDeleted").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn token_appears_only_when_set() {
        let mut user = sample();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("token").is_none());
        user.token = Some("jwt".into());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["token"], "jwt");
    }
}
