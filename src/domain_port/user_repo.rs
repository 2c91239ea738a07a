use super::StoreError;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub identity: Identity,
    pub username: String,
    pub role: Role,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Create the social account on first login, refresh email and nickname
    /// on later ones.
    async fn upsert_social(&self, profile: &SocialProfile) -> Result<UserRecord, StoreError>;
}
