use std::path::PathBuf;

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
    /// Lifetime of a sign-in session and its bearer token.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

/// Object storage for uploaded recipe images.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the filesystem object store.
    pub data_dir: PathBuf,
    /// Bucket name, the first path segment of public object URLs.
    pub bucket: String,
    /// Externally reachable origin used to build public URLs, without trailing slash.
    pub public_base_url: String,
    /// Maximum accepted image size in bytes.
    pub max_image_size: u64,
}

impl StorageConfig {
    /// Public URL under which an object key is served.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.session_ttl_hours", default_session_ttl_hours())?
            .set_default("storage.data_dir", "./data/storage")?
            .set_default("storage.bucket", "recipe-images")?
            .set_default("storage.public_base_url", "http://127.0.0.1:3000")?
            .set_default("storage.max_image_size", 10 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., REZEPTE__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("REZEPTE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
