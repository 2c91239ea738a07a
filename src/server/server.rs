use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_fake::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub token_service: Arc<dyn TokenService>,
    pub view_service: Arc<dyn ViewService>,
    pub social_login_service: Arc<dyn SocialLoginService>,
    pub refresh_ttl_secs: u64,
    flusher_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let signing_key = settings.jwt.resolve_signing_key()?;
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.jwt.issuer.clone(),
            audience: settings.jwt.audience.clone(),
            access_ttl: settings.jwt.access_ttl(),
            refresh_ttl: settings.jwt.refresh_ttl(),
            signing_key,
        })?);

        let (token_store, score_store): (Arc<dyn TokenStore>, Arc<dyn ViewScoreStore>) =
            match settings.redis.backend.as_str() {
                "fake" => (
                    Arc::new(FakeTokenStore::new()),
                    Arc::new(FakeViewScoreStore::new()),
                ),
                "real" => {
                    let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    let prefix = settings.redis.key_prefix.as_str();
                    let op_timeout = settings.redis.op_timeout();
                    (
                        Arc::new(RedisTokenStore::new(
                            redis_manager.clone(),
                            prefix,
                            op_timeout,
                        )),
                        Arc::new(RedisViewScoreStore::new(redis_manager, prefix, op_timeout)),
                    )
                }
                other => return Err(anyhow::anyhow!("Unknown redis backend: {}", other)),
            };

        let (item_repo, user_repo, pool): (Arc<dyn ItemRepo>, Arc<dyn UserRepo>, _) =
            match settings.mysql.backend.as_str() {
                "fake" => (
                    Arc::new(FakeItemRepo::new()),
                    Arc::new(FakeUserRepo::new()),
                    None,
                ),
                "real" => {
                    let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                    (
                        Arc::new(MySqlItemRepo::new(pool.clone())),
                        Arc::new(MySqlUserRepo::new(pool.clone())),
                        Some(pool),
                    )
                }
                other => return Err(anyhow::anyhow!("Unknown mysql backend: {}", other)),
            };

        let token_service: Arc<dyn TokenService> =
            Arc::new(RealTokenService::new(token_codec, token_store));
        let view_service: Arc<dyn ViewService> =
            Arc::new(RealViewService::new(item_repo.clone(), score_store.clone()));
        let social_login_service: Arc<dyn SocialLoginService> = Arc::new(
            RealSocialLoginService::new(user_repo, token_service.clone()),
        );

        // region runtime infra
        let cancel = CancellationToken::new();

        let flusher = CounterFlusher::new(
            score_store,
            item_repo,
            settings.views.flush_interval(),
            cancel.clone(),
        );
        let flusher_handle = tokio::spawn(async move {
            let _ = flusher.run().await;
        });

        // endregion

        info!(
            redis = %settings.redis.backend,
            mysql = %settings.mysql.backend,
            "server started"
        );

        Ok(Self {
            token_service,
            view_service,
            social_login_service,
            refresh_ttl_secs: settings.jwt.refresh_ttl_secs,
            flusher_handle: Mutex::new(Some(flusher_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self
            .flusher_handle
            .lock()
            .ok()
            .and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("flusher handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
