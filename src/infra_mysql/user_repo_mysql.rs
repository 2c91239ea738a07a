use super::util::store_error;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn upsert_social(&self, profile: &SocialProfile) -> Result<UserRecord, StoreError> {
        let username = profile.username();

        sqlx::query(
            r#"
INSERT INTO user (username, email, nickname, is_social, social_provider, role)
VALUES (?, ?, ?, TRUE, ?, 'USER')
ON DUPLICATE KEY UPDATE email = VALUES(email), nickname = VALUES(nickname)
"#,
        )
        .bind(&username)
        .bind(profile.email.as_deref())
        .bind(profile.nickname.as_deref())
        .bind(profile.provider.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        let row = sqlx::query("SELECT id, role FROM user WHERE username = ? AND is_social = TRUE")
            .bind(&username)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let identity: Identity = row.try_get("id").map_err(store_error)?;
        let role: String = row.try_get("role").map_err(store_error)?;
        let role = role.parse::<Role>().map_err(StoreError::Internal)?;

        Ok(UserRecord {
            identity,
            username,
            role,
        })
    }
}
