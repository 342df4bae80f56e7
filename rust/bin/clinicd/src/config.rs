//! Server configuration, one TOML file per context.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use hr::HrConfig;
use marketing::AiConfig;

/// Directory holding `<context>.toml` files.
pub const CONFIG_DIR: &str = "/etc/clinic";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub hr: HrConfig,
    /// Text generation for marketing copy. Optional.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Bootstrap administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin")]
    pub username: String,
    /// argon2id PHC string.
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_expire_secs() -> u64 {
    86_400
}

impl ServerConfig {
    /// A bare context name maps to `/etc/clinic/<name>.toml`; anything that
    /// looks like a path is used as given.
    pub fn resolve_path(arg: &str) -> PathBuf {
        if arg.contains('/') || arg.contains('.') {
            PathBuf::from(arg)
        } else {
            Path::new(CONFIG_DIR).join(format!("{arg}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// SQLite database inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join("clinic.db")
    }
}
