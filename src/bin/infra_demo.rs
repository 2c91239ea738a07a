/// Manual check of the Redis and MySQL adapters against live servers.
///
/// Needs a Redis reachable at `redis.dsn` and a MySQL database at `mysql.dsn`
/// loaded with `sql/schema.sql`. Keys are written under a per-run prefix and
/// removed again at the end.
///
/// $ cargo run --bin infra_demo -- --settings=settings/release.toml
use chrono::Utc;
use nearbuy::domain_model::*;
use nearbuy::domain_port::*;
use nearbuy::infra_mysql::*;
use nearbuy::infra_redis::*;
use nearbuy::settings::*;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::new("infra_demo=debug,nearbuy=debug");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;
    let prefix = format!(
        "{}:demo:{}",
        settings.redis.key_prefix,
        uuid::Uuid::new_v4().simple()
    );

    // region prepare connection

    let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
    let mut redis_manager = redis_client.get_connection_manager().await?;

    let pong: String = redis::cmd("PING").query_async(&mut redis_manager).await?;
    println!("PING -> {}", pong);

    let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;

    let value: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    println!("MySQL -> {}", value);

    // endregion

    // region token store

    let op_timeout = settings.redis.op_timeout();
    let token_store: Arc<dyn TokenStore> = Arc::new(RedisTokenStore::new(
        redis_manager.clone(),
        prefix.as_str(),
        op_timeout,
    ));
    let identity = Identity(1);
    let ttl = Duration::from_secs(60);

    token_store.put(identity, "first", ttl).await?;
    println!("get -> {:?}", token_store.get(identity).await?);
    println!(
        "swap(wrong) -> {:?}",
        token_store
            .compare_and_swap(identity, "nope", "second", ttl)
            .await?
    );
    println!(
        "swap(right) -> {:?}",
        token_store
            .compare_and_swap(identity, "first", "second", ttl)
            .await?
    );
    println!(
        "exists(second) -> {}",
        token_store.exists(identity, "second").await?
    );
    token_store.remove(identity).await?;
    println!(
        "swap(after remove) -> {:?}",
        token_store
            .compare_and_swap(identity, "second", "third", ttl)
            .await?
    );

    // endregion

    // region view scores and durable counts

    let score_store: Arc<dyn ViewScoreStore> = Arc::new(RedisViewScoreStore::new(
        redis_manager.clone(),
        &prefix,
        op_timeout,
    ));
    let item_repo: Arc<dyn ItemRepo> = Arc::new(MySqlItemRepo::new(pool.clone()));

    let recent = item_repo.list_recent(0, 3).await?;
    println!("recent posts -> {:?}", recent);

    for row in &recent {
        for _ in 0..=row.id.0 % 3 {
            score_store.increment(row.id).await?;
        }
    }
    let ranked = score_store.top_range(0, 9).await?;
    println!("top -> {:?}", ranked);

    let ids: Vec<ItemId> = ranked.iter().map(|(id, _)| *id).collect();
    println!("bulk -> {:?}", item_repo.find_all_by_ids(&ids).await?);

    for (id, score) in score_store.snapshot().await? {
        let outcome = item_repo.update_view_count(id, score).await?;
        info!(%id, score, ?outcome, "flushed");
    }
    println!(
        "missing post -> {:?}",
        item_repo.update_view_count(ItemId(i64::MAX), 1).await?
    );

    for id in ids {
        score_store.remove(id).await?;
    }

    // endregion

    // region social users

    let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
    let profile = SocialProfile::parse(
        SocialProvider::Google,
        &serde_json::json!({
            "sub": format!("demo-{}", Utc::now().timestamp()),
            "email": "demo@example.com",
            "name": "Demo",
        }),
    )?;
    let first = user_repo.upsert_social(&profile).await?;
    let again = user_repo.upsert_social(&profile).await?;
    println!("upsert -> {:?} / {:?}", first, again);

    // endregion

    pool.close().await;
    Ok(())
}
