use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct RealTokenService {
    token_codec: Arc<dyn TokenCodec>,
    token_store: Arc<dyn TokenStore>,
}

impl RealTokenService {
    pub fn new(token_codec: Arc<dyn TokenCodec>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            token_codec,
            token_store,
        }
    }

    /// The stored record lives exactly as long as the token it holds.
    fn ttl_until(until: DateTime<Utc>) -> Duration {
        let secs = (until - Utc::now()).num_seconds();
        Duration::from_secs(secs.max(1) as u64)
    }

    fn mint_pair(&self, principal: Principal) -> Result<(TokenPair, Duration), AuthError> {
        let (access_token, _) = self.token_codec.issue_access_token(principal)?;
        let (refresh_token, refresh_exp) = self.token_codec.issue_refresh_token(principal)?;
        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            Self::ttl_until(refresh_exp),
        ))
    }

    async fn rotate_inner(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let principal = self.token_codec.verify_refresh_token(presented)?.principal;
        let (pair, ttl) = self.mint_pair(principal)?;

        // Compare and replace in one step; the overwrite is the revocation.
        let outcome = self
            .token_store
            .compare_and_swap(
                principal.identity,
                presented,
                pair.refresh_token.as_str(),
                ttl,
            )
            .await?;

        match outcome {
            SwapOutcome::Swapped => {
                info!(identity = %principal.identity, "refresh token rotated");
                Ok(pair)
            }
            SwapOutcome::Absent => Err(AuthError::TokenNotFound),
            SwapOutcome::Mismatch => Err(AuthError::TokenMismatch),
        }
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    async fn issue_tokens(&self, identity: Identity, role: Role) -> Result<TokenPair, AuthError> {
        let (pair, ttl) = self.mint_pair(Principal { identity, role })?;
        self.token_store
            .put(identity, pair.refresh_token.as_str(), ttl)
            .await?;
        info!(%identity, %role, "token pair issued");
        Ok(pair)
    }

    async fn issue_refresh_only(
        &self,
        identity: Identity,
        role: Role,
    ) -> Result<RefreshToken, AuthError> {
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(Principal { identity, role })?;
        self.token_store
            .put(identity, refresh_token.as_str(), Self::ttl_until(refresh_exp))
            .await?;
        info!(%identity, %role, "refresh token issued");
        Ok(refresh_token)
    }

    async fn rotate(&self, presented: &str) -> Result<TokenPair, AuthError> {
        self.rotate_inner(presented).await.inspect_err(|e| {
            if e.is_rejection() {
                warn!(reason = %e, "refresh token rejected");
            } else {
                error!(error = %e, "refresh token rotation failed");
            }
        })
    }

    async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        let principal = match self.token_codec.verify_refresh_token(presented) {
            Ok(verified) => verified.principal,
            Err(e) if e.is_rejection() => {
                warn!(reason = %e, "logout with invalid refresh token");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self
            .token_store
            .exists(principal.identity, presented)
            .await?
        {
            self.token_store.remove(principal.identity).await?;
            info!(identity = %principal.identity, "logged out");
        } else {
            debug!(identity = %principal.identity, "logout with superseded refresh token");
        }
        Ok(())
    }

    async fn revoke(&self, identity: Identity) -> Result<(), AuthError> {
        self.token_store.remove(identity).await?;
        info!(%identity, "session revoked");
        Ok(())
    }

    fn verify_access(&self, token: &str) -> Result<Principal, AuthError> {
        Ok(self.token_codec.verify_access_token(token)?.principal)
    }
}
