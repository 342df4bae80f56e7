//! `clinic`: admin CLI for clinicd deployments.
//!
//! Creates server contexts (config file, admin password, JWT secret) and
//! switches between them.

mod commands;
mod config;

use clap::{Parser, Subcommand};

use commands::context::NewContext;

#[derive(Parser, Debug)]
#[command(name = "clinic", about = "Clinic CRM admin CLI")]
struct Cli {
    /// Path to client config file (default: ~/.clinic/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Print an argon2id hash for a password.
    HashPassword {
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the current context.
    Current,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a new context.
    Create {
        name: String,
        /// Server config directory.
        #[arg(long, default_value = "/etc/clinic")]
        config_dir: String,
        /// Data directory (default: /var/lib/clinic/<name>).
        #[arg(long)]
        data_dir: Option<String>,
        /// Admin login name.
        #[arg(long, default_value = "admin")]
        admin: String,
        /// Admin password (non-interactive). Prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// List all contexts.
    List,
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

fn read_password(given: Option<String>, confirm: bool) -> anyhow::Result<String> {
    let password = match given {
        Some(p) => p,
        None => {
            let pw = rpassword::prompt_password("Enter password: ")?;
            if confirm && pw != rpassword::prompt_password("Confirm password: ")? {
                anyhow::bail!("Passwords do not match.");
            }
            pw
        }
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty.");
    }
    Ok(password)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create { name, config_dir, data_dir, admin, password } => {
                let data_dir = data_dir.unwrap_or_else(|| format!("/var/lib/clinic/{name}"));
                let password = read_password(password, true)?;
                commands::context::create(
                    &NewContext {
                        name: &name,
                        config_dir: &config_dir,
                        data_dir: &data_dir,
                        admin_username: &admin,
                        password: &password,
                    },
                    &config_path,
                )?;
            }
            ContextAction::List => commands::context::list(&config_path)?,
            ContextAction::Delete { name } => commands::context::delete(&name, &config_path)?,
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => commands::context::use_context(&name, &config_path)?,
        },

        Commands::HashPassword { password } => {
            let password = read_password(password, false)?;
            let hash = staff::hash_password(&password)?;
            println!("{hash}");
        }

        Commands::Current => {
            let config = config::ClientConfig::load(&config_path)?;
            match config.current() {
                Some(ctx) => println!("{} ({})", ctx.name, ctx.config_path),
                None => println!("No current context."),
            }
        }
    }

    Ok(())
}
