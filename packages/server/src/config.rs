use std::path::PathBuf;

use common::storage::s3::S3Config;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend.
    pub path: PathBuf,
    /// Bucket settings of the S3 backend.
    pub s3: Option<S3Config>,
}

/// Limits and policies enforced by the vault.
#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    /// Largest accepted payload per file, in bytes. Zero means no ceiling.
    pub max_upload_bytes: u64,
    /// Quota given to owners on first sight. Zero or negative means unlimited.
    pub default_quota_bytes: i64,
    /// Lifetime of new share tokens in seconds. Zero means they never expire.
    pub share_ttl_secs: u64,
    /// Page size of file listings.
    pub page_size: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            default_quota_bytes: 10 * 1024 * 1024,
            share_ttl_secs: 0,
            page_size: 200,
        }
    }
}

impl VaultConfig {
    /// The per-file payload ceiling, if one is configured.
    pub fn upload_limit(&self) -> Option<u64> {
        (self.max_upload_bytes > 0).then_some(self.max_upload_bytes)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub vault: VaultConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let vault = VaultConfig::default();
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./data/blobs")?
            .set_default("vault.max_upload_bytes", vault.max_upload_bytes)?
            .set_default("vault.default_quota_bytes", vault.default_quota_bytes)?
            .set_default("vault.share_ttl_secs", vault.share_ttl_secs)?
            .set_default("vault.page_size", vault.page_size)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., VAULT__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("VAULT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
