use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SocialLoginError {
    #[error(transparent)]
    Profile(#[from] SocialProfileError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SocialLoginResult {
    pub identity: Identity,
    pub refresh_token: RefreshToken,
}

#[async_trait::async_trait]
pub trait SocialLoginService: Send + Sync {
    /// Finish an upstream-verified OAuth login. Only a refresh token is
    /// issued; the client trades it for a pair through the cookie exchange.
    async fn complete(
        &self,
        provider: SocialProvider,
        attributes: &serde_json::Value,
    ) -> Result<SocialLoginResult, SocialLoginError>;
}
