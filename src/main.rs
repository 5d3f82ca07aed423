//! hdvault command line.
//!
//! Usage:
//!   hdvault create                 # new wallet with account 0
//!   hdvault new-account            # derive the next account and save
//!   hdvault list                   # accounts in the keystore
//!   hdvault show <index>           # one account's public details
//!   hdvault balances --rpc-url URL # balances from a JSON-RPC node
//!
//! The password comes from `--password` or `HDVAULT_PASSWORD`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hdvault::utils::logging;
use hdvault::{Account, JsonRpcProvider, Wallet, WalletConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Encrypted HD wallet for Ethereum accounts.
#[derive(Parser, Debug)]
#[command(name = "hdvault", version, about = "Encrypted HD wallet for Ethereum accounts")]
struct Cli {
    /// Keystore file (defaults to HDVAULT_KEYSTORE or my-wallet.json).
    #[arg(long, short, global = true)]
    file: Option<PathBuf>,

    /// Keystore password.
    #[arg(long, env = "HDVAULT_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable all logging.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new wallet, derive account 0 and write the keystore.
    Create {
        /// Overwrite an existing keystore.
        #[arg(long)]
        force: bool,

        /// Print the recovery phrase.
        #[arg(long)]
        show_mnemonic: bool,
    },

    /// Derive the next account and save the keystore.
    NewAccount,

    /// List accounts in the keystore.
    List,

    /// Show one account.
    Show {
        /// Account index.
        index: usize,
    },

    /// Query balances for every account.
    Balances {
        /// JSON-RPC endpoint (defaults to HDVAULT_RPC_URL).
        #[arg(long)]
        rpc_url: Option<String>,
    },
}

#[derive(Serialize)]
struct AccountView {
    index: usize,
    address: String,
    public_key: String,
    fingerprint: String,
    path: Option<String>,
}

impl AccountView {
    fn new(index: usize, account: &Account) -> Self {
        Self {
            index,
            address: account.address().to_string(),
            public_key: account.public_key(),
            fingerprint: account.fingerprint(),
            path: account.path().map(str::to_string),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::set_silenced(cli.quiet);
    logging::set_debug(cli.verbose);

    let mut config = WalletConfig::from_env().context("invalid HDVAULT_* configuration")?;
    if let Some(file) = &cli.file {
        config = config.with_keystore_path(file);
    }

    let password = cli
        .password
        .clone()
        .context("a password is required (--password or HDVAULT_PASSWORD)")?;

    match cli.command {
        Command::Create { force, show_mnemonic } => {
            if config.keystore_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config.keystore_path.display()
                );
            }
            let path = config.keystore_path.clone();
            let mut wallet = Wallet::create_with_config(password, None, config)?;
            // The keystore only records the mnemonic through its accounts
            let view = AccountView::new(0, wallet.create_new_account()?);

            if cli.json {
                let mut out = serde_json::json!({ "keystore": path, "account": view });
                if show_mnemonic {
                    out["mnemonic"] = serde_json::json!(wallet.mnemonic_phrase().as_str());
                }
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Created wallet at {}", path.display());
                println!("Account 0: {}", view.address);
                if show_mnemonic {
                    println!("Recovery phrase: {}", wallet.mnemonic_phrase().as_str());
                }
            }
        }

        Command::NewAccount => {
            let mut wallet = load(password, config)?;
            let index = wallet.accounts().len();
            let account = wallet.create_new_account()?;
            let view = AccountView::new(index, account);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Account {}: {}", view.index, view.address);
                if let Some(path) = &view.path {
                    println!("Path:      {}", path);
                }
            }
        }

        Command::List => {
            let wallet = load(password, config)?;
            let views: Vec<_> = wallet
                .accounts()
                .iter()
                .enumerate()
                .map(|(i, a)| AccountView::new(i, a))
                .collect();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else if views.is_empty() {
                println!("No accounts");
            } else {
                for view in &views {
                    println!("{:>3}  {}  {}", view.index, view.address, view.path.as_deref().unwrap_or("-"));
                }
            }
        }

        Command::Show { index } => {
            let wallet = load(password, config)?;
            let view = AccountView::new(index, wallet.account_at(index)?);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Index:       {}", view.index);
                println!("Address:     {}", view.address);
                println!("Public key:  {}", view.public_key);
                println!("Fingerprint: {}", view.fingerprint);
                println!("Path:        {}", view.path.as_deref().unwrap_or("-"));
            }
        }

        Command::Balances { rpc_url } => {
            if let Some(url) = rpc_url {
                config = config.with_rpc_url(url);
            }
            let provider = JsonRpcProvider::from_config(&config)?;
            let mut wallet = load(password, config)?;
            wallet.connect_provider(Arc::new(provider));
            let balances = wallet.get_balances()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&balances)?);
            } else {
                for entry in &balances {
                    println!("{:>3}  {}  {} ETH", entry.index, entry.address, entry.balance);
                }
            }
        }
    }

    Ok(())
}

fn load(password: String, config: WalletConfig) -> Result<Wallet> {
    let path = config.keystore_path.clone();
    Wallet::load_with_config(password, None, config)
        .with_context(|| format!("failed to open keystore {}", path.display()))
}
