// src/main.rs
//! kda-keys entry point.
//! Stdout carries command output only; logs and errors go to stderr.
use anyhow::{Context, Result};
use clap::Parser;
use kda_keystore::cli::{Cli, Commands};
use kda_keystore::core::config::KeystoreConfig;
use kda_keystore::core::errors::WalletError;
use kda_keystore::core::key_manager::{GeneratedKey, HdKeysOutcome, KeyEntry, KeyManager};
use kda_keystore::core::range;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EXIT_FATAL: u8 = 1;
const EXIT_RECOVERABLE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("failed to initialise logging: {}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            match err.downcast_ref::<WalletError>() {
                Some(wallet_err) if wallet_err.is_recoverable() => ExitCode::from(EXIT_RECOVERABLE),
                Some(_) => ExitCode::from(EXIT_FATAL),
                None => ExitCode::from(EXIT_RECOVERABLE),
            }
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<KeystoreConfig> {
    let base = match &cli.config {
        Some(path) => KeystoreConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => KeystoreConfig::default(),
    };
    let overrides = KeystoreConfig::env_overrides().merge(cli.overrides());
    let config = base.with_overrides(&overrides);
    config.validate()?;
    debug!(wallet_root = %config.wallet_root.display(), "configuration loaded");
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let manager = KeyManager::new(load_config(&cli)?);

    match cli.command {
        Commands::GeneratePlain { alias, amount, password, legacy } => {
            let keys = manager.generate_plain(&alias, amount, password.password.as_deref(), legacy)?;
            keys.iter().for_each(print_generated);
        }
        Commands::GenerateHd { wallet, index, mnemonic, password, legacy } => {
            let selector = range::parse(&index)?;
            let password = password.password.as_deref();
            let created = match mnemonic.as_deref() {
                Some(phrase) => manager.import_hd(&wallet, phrase, password, selector, legacy)?,
                None => manager.generate_hd(&wallet, password, selector, legacy)?,
            };
            if let Some(phrase) = &created.mnemonic {
                println!("mnemonic: {}", phrase.as_str());
            }
            return Ok(report_hd(&created.keys));
        }
        Commands::GenerateFromHd { wallet, index, password } => {
            let selector = range::parse(&index)?;
            let outcome =
                manager.generate_from_existing_hd(&wallet, password.password.as_deref(), selector)?;
            return Ok(report_hd(&outcome));
        }
        Commands::ListKeys { wallet } => {
            manager.list_keys(&wallet)?.iter().for_each(print_entry);
        }
        Commands::ListPlainKeys => {
            manager.list_plain_keys().iter().for_each(print_entry);
        }
        Commands::ListWallets => {
            for wallet in manager.list_wallets()? {
                let mut flags = Vec::new();
                if wallet.is_legacy {
                    flags.push("legacy");
                }
                if wallet.is_encrypted {
                    flags.push("encrypted");
                }
                if flags.is_empty() {
                    println!("{}", wallet.name);
                } else {
                    println!("{} ({})", wallet.name, flags.join(", "));
                }
            }
        }
        Commands::EnsureWalletRoot => {
            manager.ensure_wallet_root()?;
            println!("{}", manager.config().wallet_root.display());
        }
        Commands::RenameWallet { from, to } => {
            let dir = manager.rename_wallet(&from, &to)?;
            println!("{}", dir.display());
        }
        Commands::DeleteWallet { wallet } => {
            manager.delete_wallet(&wallet)?;
            println!("deleted {}", wallet);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_generated(key: &GeneratedKey) {
    match key.index {
        Some(index) => {
            println!("{}\t{}\t{}\t{}", index, key.public_key, key.account, key.path.display())
        }
        None => println!("{}\t{}\t{}", key.public_key, key.account, key.path.display()),
    }
}

fn print_entry(entry: &KeyEntry) {
    println!(
        "{}\t{}",
        entry.file.file_name(),
        entry.public_key.as_deref().unwrap_or("<unreadable>")
    );
}

/// Per-index failures go to stderr and turn the exit status recoverable.
fn report_hd(outcome: &HdKeysOutcome) -> ExitCode {
    outcome.keys.iter().for_each(print_generated);
    for failure in &outcome.failures {
        eprintln!("index {}: {}", failure.index, failure.error);
    }
    if outcome.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_RECOVERABLE)
    }
}
