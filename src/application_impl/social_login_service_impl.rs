use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealSocialLoginService {
    user_repo: Arc<dyn UserRepo>,
    token_service: Arc<dyn TokenService>,
}

impl RealSocialLoginService {
    pub fn new(user_repo: Arc<dyn UserRepo>, token_service: Arc<dyn TokenService>) -> Self {
        Self {
            user_repo,
            token_service,
        }
    }
}

#[async_trait::async_trait]
impl SocialLoginService for RealSocialLoginService {
    async fn complete(
        &self,
        provider: SocialProvider,
        attributes: &serde_json::Value,
    ) -> Result<SocialLoginResult, SocialLoginError> {
        let profile = SocialProfile::parse(provider, attributes)?;
        let user = self.user_repo.upsert_social(&profile).await?;
        let refresh_token = self
            .token_service
            .issue_refresh_only(user.identity, user.role)
            .await?;
        info!(identity = %user.identity, %provider, "social login completed");

        Ok(SocialLoginResult {
            identity: user.identity,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RealTokenService;
    use crate::application_impl::jwt_codec::test_codec;
    use crate::infra_fake::{FakeTokenStore, FakeUserRepo};
    use serde_json::json;

    fn setup() -> (RealSocialLoginService, Arc<RealTokenService>, Arc<FakeTokenStore>) {
        let store = Arc::new(FakeTokenStore::new());
        let tokens = Arc::new(RealTokenService::new(Arc::new(test_codec()), store.clone()));
        let service = RealSocialLoginService::new(Arc::new(FakeUserRepo::new()), tokens.clone());
        (service, tokens, store)
    }

    #[tokio::test]
    async fn repeat_login_reuses_identity_and_replaces_session() {
        let (service, _, store) = setup();
        let attributes = json!({ "sub": "1093", "email": "x@gmail.com", "name": "Lee" });

        let first = service
            .complete(SocialProvider::Google, &attributes)
            .await
            .unwrap();
        let second = service
            .complete(SocialProvider::Google, &attributes)
            .await
            .unwrap();

        assert_eq!(first.identity, second.identity);
        assert_eq!(
            store.get(second.identity).await.unwrap().as_deref(),
            Some(second.refresh_token.as_str())
        );
    }

    #[tokio::test]
    async fn issued_refresh_token_can_be_exchanged() {
        let (service, tokens, _) = setup();
        let attributes = json!({ "response": { "id": "n-77", "nickname": "park" } });

        let login = service
            .complete(SocialProvider::Naver, &attributes)
            .await
            .unwrap();
        let pair = tokens.rotate(login.refresh_token.as_str()).await.unwrap();
        let principal = tokens.verify_access(&pair.access_token.0).unwrap();
        assert_eq!(principal.identity, login.identity);
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn malformed_payload_issues_nothing() {
        let (service, _, _) = setup();
        let result = service
            .complete(SocialProvider::Naver, &json!({ "id": "flat" }))
            .await;
        assert!(matches!(result, Err(SocialLoginError::Profile(_))));
    }
}
