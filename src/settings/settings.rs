use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub jwt: Jwt,
    pub log: Log,
    pub mysql: Mysql,
    pub redis: Redis,
    pub views: Views,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    /// TLS is enabled when both paths are set.
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// Environment variable holding the HS256 key. Wins over `signing_key`.
    pub signing_key_env: String,
    /// Development fallback only; leave unset in release settings.
    pub signing_key: Option<String>,
}

impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("signing_key_env", &self.signing_key_env)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Jwt {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    pub fn resolve_signing_key(&self) -> Result<Vec<u8>> {
        let key = std::env::var(&self.signing_key_env)
            .ok()
            .or_else(|| self.signing_key.clone())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "no jwt signing key: set {} or jwt.signing_key",
                    self.signing_key_env
                )
            })?;
        Ok(key.into_bytes())
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Mysql {
    pub backend: String, // "fake" or "real"
    pub dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub backend: String, // "fake" or "real"
    pub dsn: String,
    pub key_prefix: String,
    pub op_timeout_ms: u64,
}

impl Redis {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct Views {
    pub flush_interval_secs: u64,
}

impl Views {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// File settings, overridable per key with `NEARBUY__SECTION__KEY`.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("NEARBUY").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
