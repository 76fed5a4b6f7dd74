use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::ConfigOverrides;

/// Kadena key and wallet manager (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "kda-keys", about = "Local key and wallet management", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "KDA_KEYSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the wallets
    #[arg(long, global = true)]
    pub wallet_root: Option<PathBuf>,

    /// Directory holding plain keys
    #[arg(long, global = true)]
    pub plain_key_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            wallet_root: self.wallet_root.clone(),
            plain_key_root: self.plain_key_root.clone(),
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Clone, Args)]
pub struct PasswordArgs {
    /// Password protecting the secret
    #[arg(long, env = "KDA_WALLET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl std::fmt::Debug for PasswordArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordArgs")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate standalone keypairs
    GeneratePlain {
        #[arg(long)]
        alias: String,
        #[arg(long, default_value_t = 1)]
        amount: usize,
        #[command(flatten)]
        password: PasswordArgs,
        #[arg(long)]
        legacy: bool,
    },
    /// Create an HD wallet and derive its first keys
    GenerateHd {
        #[arg(long)]
        wallet: String,
        /// Index or range, e.g. "0", "0-4" or "0,4"
        #[arg(long, default_value = "0")]
        index: String,
        /// Import this mnemonic instead of generating one
        #[arg(long, env = "KDA_WALLET_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
        #[command(flatten)]
        password: PasswordArgs,
        #[arg(long)]
        legacy: bool,
    },
    /// Derive more keys into an existing HD wallet
    GenerateFromHd {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        index: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// List the keys of a wallet
    ListKeys {
        #[arg(long)]
        wallet: String,
    },
    /// List plain keys
    ListPlainKeys,
    /// List wallets, legacy wallets first
    ListWallets,
    /// Fail unless the wallet root exists
    EnsureWalletRoot,
    RenameWallet {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    DeleteWallet {
        #[arg(long)]
        wallet: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_from_hd() {
        let cli = Cli::try_parse_from([
            "kda-keys",
            "--wallet-root",
            "/tmp/w",
            "generate-from-hd",
            "--wallet",
            "main",
            "--index",
            "1-3",
        ])
        .unwrap();
        assert_eq!(cli.overrides().wallet_root, Some(PathBuf::from("/tmp/w")));
        match cli.command {
            Commands::GenerateFromHd { wallet, index, .. } => {
                assert_eq!(wallet, "main");
                assert_eq!(index, "1-3");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
