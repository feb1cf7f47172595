//! Sanctum Admin Command Line Tool
//!
//! Operator-facing pre-flight commands for the admin key migration. The
//! migration itself needs the external signing agent and runs from the
//! console UI; this binary covers the read-only checks that are useful
//! from a shell.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

use sanctum_admin::common::{init_logger, AdminError, Result};
use sanctum_admin::config::{self, parse_api_base};
use sanctum_admin::crypto::AdminPubkey;
use sanctum_admin::store::{EncryptedRecordStore, HttpRecordStore};
use sanctum_admin::transport::SecureTransport;
use sanctum_admin::{APP_NAME, VERSION};

/// Sanctum Admin: key migration client for the Sanctum hosted service
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Load configuration from a file
    #[clap(long)]
    config_file: Option<PathBuf>,

    /// Override the API base URL
    #[clap(long, env = "SANCTUM_API_BASE")]
    api_base: Option<String>,

    /// Log level
    #[clap(long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the migration snapshot and report what a migration would touch
    ///
    /// Read-only: the prepare RPC never mutates state and nothing is
    /// decrypted.
    Check,

    /// Normalize a candidate admin public key
    ValidateKey {
        /// The key, as 64-character hex or an npub string
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level);

    info!("Starting {} v{}", APP_NAME, VERSION);

    config::initialize(args.config_file.as_deref())?;

    let mut cfg = config::get_config();
    if let Some(api_base) = &args.api_base {
        cfg.api_base = parse_api_base(api_base)?;
        config::update_config(cfg.clone())?;
    }

    config::log_config(&cfg);

    match args.command {
        Command::Check => check(&cfg).await,
        Command::ValidateKey { key } => validate_key(&key),
    }
}

async fn check(cfg: &sanctum_admin::config::AdminConfig) -> Result<()> {
    let transport = Arc::new(SecureTransport::new(cfg)?);
    let store = HttpRecordStore::new(transport);

    info!("Fetching migration snapshot from {}", cfg.api_base);

    let snapshot = store.prepare().await?;

    println!("Current admin key:     {}", snapshot.admin_pubkey);
    println!("Users to migrate:      {}", snapshot.user_count);
    println!("Field values to migrate: {}", snapshot.field_value_count);

    let encrypted_fields: usize = snapshot
        .users
        .iter()
        .map(|u| {
            usize::from(u.encrypted_email.as_deref().is_some_and(|v| !v.is_empty()))
                + usize::from(u.encrypted_name.as_deref().is_some_and(|v| !v.is_empty()))
        })
        .sum();
    println!("Encrypted user fields: {}", encrypted_fields);

    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    let normalized = AdminPubkey::parse(key)
        .map_err(|e| AdminError::Config(format!("Invalid public key: {}", e)))?;

    println!("{}", normalized);

    Ok(())
}
