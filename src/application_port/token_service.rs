use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token malformed")]
    MalformedToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token not found")]
    TokenNotFound,
    #[error("token mismatch")]
    TokenMismatch,
    #[error("infrastructure unavailable: {0}")]
    InfrastructureUnavailable(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// True for every failure that must look identical to the caller.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::ExpiredToken
                | AuthError::TokenNotFound
                | AuthError::TokenMismatch
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => AuthError::InfrastructureUnavailable(e),
            StoreError::Internal(e) => AuthError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies the two JWT kinds. Purely local, never suspends.
pub trait TokenCodec: Send + Sync {
    fn issue_access_token(
        &self,
        principal: Principal,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    fn issue_refresh_token(
        &self,
        principal: Principal,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    fn verify_access_token(&self, token: &str) -> Result<VerifiedToken, AuthError>;
    fn verify_refresh_token(&self, token: &str) -> Result<VerifiedToken, AuthError>;
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Mint a pair after a successful login and register its refresh half.
    async fn issue_tokens(&self, identity: Identity, role: Role) -> Result<TokenPair, AuthError>;

    /// Same storage side effect, for flows that deliver the access token
    /// through a separate channel.
    async fn issue_refresh_only(
        &self,
        identity: Identity,
        role: Role,
    ) -> Result<RefreshToken, AuthError>;

    /// Single-use exchange of a refresh token for a new pair.
    async fn rotate(&self, presented: &str) -> Result<TokenPair, AuthError>;

    /// Drop the session the presented token belongs to, if it is still the
    /// current one. Never fails on a bad token.
    async fn logout(&self, presented: &str) -> Result<(), AuthError>;

    /// Unconditionally end the identity's session.
    async fn revoke(&self, identity: Identity) -> Result<(), AuthError>;

    fn verify_access(&self, token: &str) -> Result<Principal, AuthError>;
}
