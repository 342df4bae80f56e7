//! Client-side context management.
//!
//! Reads/writes `~/.clinic/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single context: one clinicd deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub name: String,

    /// Path to the server-side config file.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_path: String,
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.clinic/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if the file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// Add or replace a context by name.
    pub fn upsert_context(&mut self, ctx: Context) {
        match self.contexts.iter_mut().find(|c| c.name == ctx.name) {
            Some(existing) => *existing = ctx,
            None => self.contexts.push(ctx),
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".clinic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_and_remove() {
        let mut config = ClientConfig::default();
        config.upsert_context(Context { name: "prod".into(), config_path: "/a".into() });
        config.upsert_context(Context { name: "prod".into(), config_path: "/b".into() });
        config.current_context = "prod".into();
        assert_eq!(config.contexts.len(), 1);
        assert_eq!(config.current().map(|c| c.config_path.as_str()), Some("/b"));

        assert!(config.remove_context("prod"));
        assert!(config.current_context.is_empty());
        assert!(!config.remove_context("prod"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = ClientConfig::default();
        config.current_context = "dev".into();
        config.contexts.push(Context { name: "dev".into(), config_path: "/etc/clinic/dev.toml".into() });
        config.save(&path).unwrap();

        let back = ClientConfig::load(&path).unwrap();
        assert_eq!(back.current_context, "dev");
        assert_eq!(back.contexts[0].config_path, "/etc/clinic/dev.toml");
        assert!(ClientConfig::load(&dir.path().join("missing.toml")).unwrap().contexts.is_empty());
    }
}
