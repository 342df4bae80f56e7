//! First-start checks and the bootstrap admin account.

use staff::service::StaffService;
use tracing::info;

use crate::config::ServerConfig;

/// Refuse to start on an incomplete configuration.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.admin.password_hash.is_empty() {
        anyhow::bail!(
            "No admin password hash found in configuration.\n\
             Run `clinic context create <name>` to set up the server first."
        );
    }
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.hr.standard_days <= 0 {
        anyhow::bail!("hr.standard_days must be positive.");
    }
    Ok(())
}

/// Create the configured admin account on first start.
pub fn ensure_admin(staff: &StaffService, config: &ServerConfig) -> anyhow::Result<()> {
    match staff.ensure_admin(&config.admin.username, &config.admin.password_hash)? {
        Some(admin) => info!("Created admin account {}", admin.username),
        None => info!("Admin account {} already exists", config.admin.username),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hash: &str, secret: &str, data_dir: &str) -> ServerConfig {
        ServerConfig::parse(&format!(
            "[admin]\npassword_hash = \"{hash}\"\n[storage]\ndata_dir = \"{data_dir}\"\n[jwt]\nsecret = \"{secret}\"\n"
        ))
        .unwrap()
    }

    #[test]
    fn verify_config_rejects_blanks() {
        assert!(verify_config(&config("", "s", "/tmp")).is_err());
        assert!(verify_config(&config("h", "", "/tmp")).is_err());
        assert!(verify_config(&config("h", "s", "")).is_err());
        assert!(verify_config(&config("h", "s", "/tmp")).is_ok());
    }
}
