// ============================
// crates/cli/src/main.rs
// ============================
//! Operator CLI: provision agents, run login checks, inspect the store.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use credgate_engine::auth::password::{hash_password_with, validate_password_strength};
use credgate_engine::{
    AuthEngine, Authenticator, CredentialStore, RandomTokenIssuer, Settings, SledCredentialStore,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroize;

#[derive(Parser)]
#[command(name = "credgate", about = "Credential store administration and login checks")]
struct Cli {
    /// Settings file (TOML); CREDGATE_-prefixed env vars override it
    #[arg(long, default_value = "credgate.toml")]
    config: String,

    /// Override the store path from settings
    #[arg(long)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision an Agent principal; the password is read from stdin
    Provision {
        /// Agent name (expected unique)
        name: String,
    },
    /// Authenticate an agent and print the issued session token
    Login {
        /// Agent name
        name: String,
    },
    /// List stored principals
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let resource = cli
        .store
        .unwrap_or_else(|| settings.store_path.display().to_string());
    debug!(resource, "using credential store");

    match cli.command {
        Command::Provision { name } => provision(&settings, &resource, &name),
        Command::Login { name } => login(&settings, &resource, &name),
        Command::List => list(&resource),
    }
}

fn read_password(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password")?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

fn provision(settings: &Settings, resource: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("agent name must not be empty");
    }

    let mut password = read_password("password: ")?;
    if !validate_password_strength(&password, &settings.password_requirements) {
        password.zeroize();
        bail!("password does not meet the complexity requirements");
    }
    let hash = hash_password_with(&settings.argon2, &password)?;
    password.zeroize();

    let store = SledCredentialStore::new();
    let db = store.connect(resource)?;
    store.ensure_schema(&db)?;
    let id = store.create_agent(&db, name, &hash)?;
    store.close(db)?;

    println!("provisioned agent {name} ({id})");
    Ok(())
}

fn login(settings: &Settings, resource: &str, name: &str) -> Result<()> {
    let mut password = read_password("password: ")?;

    let mut engine = AuthEngine::with_settings(
        SledCredentialStore::new(),
        RandomTokenIssuer::new(settings.token_bytes),
        settings.argon2.clone(),
    );
    let outcome = engine.login(name, &password, resource);
    password.zeroize();
    engine.disconnect();

    let token = outcome?;
    println!("{}", token.as_str());
    Ok(())
}

fn list(resource: &str) -> Result<()> {
    let store = SledCredentialStore::new();
    let db = store.connect(resource)?;
    store.ensure_schema(&db)?;

    for principal in store.list_principals(&db)? {
        println!(
            "{}  {:<6}  {}",
            principal.id,
            principal.principal_type().unwrap_or("-"),
            principal.name().unwrap_or("-"),
        );
    }
    store.close(db)?;
    Ok(())
}
