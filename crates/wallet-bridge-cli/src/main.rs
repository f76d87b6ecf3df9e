/*
[INPUT]:  CLI arguments, YAML configuration file
[OUTPUT]: Sign-in URLs, session changes and wallet signatures on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallet_bridge_cli::{CliConfig, commands};

#[derive(Parser, Debug)]
#[command(name = "wallet-bridge", version, about = "Sign in with a web wallet and sign transactions")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wallet login URL
    SignInUrl {
        #[arg(long)]
        success_url: Option<String>,
        #[arg(long)]
        failure_url: Option<String>,
    },
    /// Store the session from the URL the wallet redirected back to
    CompleteSignIn {
        #[arg(long)]
        url: String,
    },
    /// Show whether a session is stored
    Status,
    /// Forget the stored session
    SignOut,
    /// Ask the wallet to sign a transaction file
    Sign {
        #[arg(long = "tx", value_name = "PATH")]
        tx_path: PathBuf,
        #[arg(long)]
        sender: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = %args.config_path.display(),
        dry_run = args.dry_run,
        "starting wallet-bridge"
    );

    let config = CliConfig::from_file(&args.config_path).context("load config")?;
    config.validate().context("validate config")?;
    info!(wallet = %config.wallet.base_url, contract_id = %config.app.contract_id, "configuration loaded");

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let command = args
        .command
        .ok_or_else(|| anyhow!("a command is required unless --dry-run is set"))?;

    match command {
        Command::SignInUrl {
            success_url,
            failure_url,
        } => {
            let url = commands::sign_in_url(
                &config,
                success_url.as_deref(),
                failure_url.as_deref(),
            )?;
            println!("{url}");
        }
        Command::CompleteSignIn { url } => {
            let auth = commands::complete_sign_in(&config, &url)?;
            println!("signed in as {}", auth.account_id);
        }
        Command::Status => {
            println!("{}", commands::status(&config)?);
        }
        Command::SignOut => {
            commands::sign_out(&config)?;
            println!("signed out");
        }
        Command::Sign { tx_path, sender } => {
            let signature = commands::sign(&config, &tx_path, &sender).await?;
            println!("{signature}");
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
