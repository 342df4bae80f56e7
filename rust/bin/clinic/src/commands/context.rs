//! Context management commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rand::Rng;

use crate::config::{ClientConfig, Context};

/// Server-side settings written for a new context.
pub struct NewContext<'a> {
    pub name: &'a str,
    pub config_dir: &'a str,
    pub data_dir: &'a str,
    pub admin_username: &'a str,
    pub password: &'a str,
}

/// Random 256-bit secret, hex encoded.
fn jwt_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Render the server TOML for a new context.
pub fn server_config(data_dir: &str, admin_username: &str, password_hash: &str, secret: &str) -> String {
    format!(
        r#"[admin]
username = "{admin_username}"
password_hash = "{password_hash}"

[storage]
data_dir = "{data_dir}"

[jwt]
secret = "{secret}"
expire_secs = 86400

[hr]
shift_start = "08:00:00"
late_grace_minutes = 15
standard_days = 26
late_penalty = 50000

# [ai]
# endpoint = "https://api.openai.com/v1/chat/completions"
# api_key = ""
# model = "gpt-4o-mini"
"#
    )
}

/// Generate the server config, create the data directory and register the
/// context in the client config.
pub fn create(new: &NewContext<'_>, client_config_path: &Path) -> Result<PathBuf> {
    let password_hash = staff::hash_password(new.password)?;
    let content = server_config(new.data_dir, new.admin_username, &password_hash, &jwt_secret());

    let config_path = PathBuf::from(new.config_dir).join(format!("{}.toml", new.name));
    std::fs::create_dir_all(new.config_dir)?;
    std::fs::write(&config_path, content)?;
    std::fs::create_dir_all(new.data_dir)?;

    let mut client_config = ClientConfig::load(client_config_path)?;
    client_config.upsert_context(Context {
        name: new.name.to_string(),
        config_path: config_path.to_string_lossy().to_string(),
    });
    if client_config.current_context.is_empty() {
        client_config.current_context = new.name.to_string();
    }
    client_config.save(client_config_path)?;

    println!("Context \"{}\" created.", new.name);
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", new.data_dir);
    println!("Start the server with: clinicd -c {}", new.name);
    Ok(config_path)
}

pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: clinic context create <name>");
        return Ok(());
    }

    println!("{:2} {:20} {}", "", "NAME", "CONFIG");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let path = if ctx.config_path.is_empty() { "-" } else { &ctx.config_path };
        println!("{:2} {:20} {}", marker, ctx.name, path);
    }
    Ok(())
}

pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!("Context \"{}\" not found. Run `clinic context list` to see available contexts.", name);
    }
    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Forget a context. The server config file stays.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }
    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_writes_server_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let client = dir.path().join("client.toml");
        let config_dir = format!("{root}/etc");
        let data_dir = format!("{root}/data");

        let path = create(
            &NewContext {
                name: "spa",
                config_dir: &config_dir,
                data_dir: &data_dir,
                admin_username: "admin",
                password: "longenough",
            },
            &client,
        )
        .unwrap();

        let server: toml::Value = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let hash = server["admin"]["password_hash"].as_str().unwrap();
        assert!(staff::verify_password("longenough", hash));
        assert_eq!(server["jwt"]["secret"].as_str().unwrap().len(), 64);
        assert!(std::path::Path::new(&data_dir).is_dir());

        let config = ClientConfig::load(&client).unwrap();
        assert_eq!(config.current_context, "spa");
        assert!(use_context("other", &client).is_err());
        delete("spa", &client).unwrap();
        assert!(ClientConfig::load(&client).unwrap().contexts.is_empty());
    }

    #[test]
    fn secrets_differ() {
        assert_ne!(jwt_secret(), jwt_secret());
    }
}
