//! primelaunch
//!
//! Command line client for the PrimeLaunch factory: print the factory
//! address, deploy tokens, list the registry, freemint, read encrypted
//! balances, and run the whole flow against an in-process devnet.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use primelaunch_core::view::format::{format_amount, short_address};
use primelaunch_core::{
    Action, Address, EvmLaunchpad, EvmSigner, LaunchpadApp, LaunchpadConfig, LaunchpadError,
    LaunchpadReader, LaunchpadWriter, WalletConnection, WalletSigner, DEFAULT_MINT_AMOUNT,
};
use primelaunch_devnet::{Devnet, DevnetEncryption, DevnetSigner};

#[derive(Parser)]
#[command(
    name = "primelaunch",
    about = "Deploy and manage confidential ERC7984 tokens through PrimeLaunch"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the PrimeLaunchFactory address.
    Address,
    /// Deploy a confidential token through the factory.
    Create(CreateArgs),
    /// List every token deployed by the factory.
    List,
    /// Freemint tokens to the configured account.
    Mint(MintArgs),
    /// Show the encrypted balance handle of an account.
    Balance(BalanceArgs),
    /// Run create, mint and decrypt against an in-process devnet.
    Demo,
}

#[derive(Args)]
struct CreateArgs {
    /// Token name.
    #[arg(long)]
    name: String,
    /// Token symbol.
    #[arg(long)]
    symbol: String,
}

#[derive(Args)]
struct MintArgs {
    /// Token contract address.
    #[arg(long, value_parser = parse_address)]
    token: Address,
    /// Whole number of tokens to mint.
    #[arg(long, default_value = DEFAULT_MINT_AMOUNT)]
    amount: String,
}

#[derive(Args)]
struct BalanceArgs {
    /// Token contract address.
    #[arg(long, value_parser = parse_address)]
    token: Address,
    /// Account to query; defaults to the configured key's address.
    #[arg(long, value_parser = parse_address)]
    owner: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "primelaunch=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Address => {
            let config = load_config()?;
            println!("PrimeLaunchFactory deployed at {:?}", config.factory_address);
        }
        Commands::Create(args) => create(args).await?,
        Commands::List => list().await?,
        Commands::Mint(args) => mint(args).await?,
        Commands::Balance(args) => balance(args).await?,
        Commands::Demo => demo().await?,
    }

    Ok(())
}

fn parse_address(raw: &str) -> std::result::Result<Address, String> {
    raw.parse()
        .map_err(|_| format!("'{}' is not a valid address", raw))
}

fn load_config() -> Result<LaunchpadConfig> {
    LaunchpadConfig::from_env().context("failed to load PrimeLaunch configuration")
}

async fn connect_signer(config: &LaunchpadConfig) -> Result<Arc<EvmSigner>> {
    let key = config
        .private_key
        .as_ref()
        .context("PRIMELAUNCH_PRIVATE_KEY must be set")?;
    let signer = EvmSigner::connect(&config.rpc_url, key)
        .await
        .context("failed to connect signer")?;
    Ok(Arc::new(signer))
}

/// Attach the user-facing line to a launchpad error.
fn explain(action: Action) -> impl Fn(LaunchpadError) -> anyhow::Error {
    move |e| anyhow!("{} ({})", e.user_message(action), e)
}

async fn create(args: CreateArgs) -> Result<()> {
    let config = load_config()?;
    let signer = connect_signer(&config).await?;
    let wallet = WalletConnection::connected(signer);
    let writer = LaunchpadWriter::new(config.factory_address, config.confirmations);

    let pending = writer
        .submit_create_token(&wallet, &args.name, &args.symbol)
        .await
        .map_err(explain(Action::Deploy))?;
    println!("Creating token... tx: {:?}", pending.tx_hash());
    pending.confirm().await.map_err(explain(Action::Deploy))?;
    println!("Token created successfully.");
    Ok(())
}

async fn list() -> Result<()> {
    let config = load_config()?;
    let reader = EvmLaunchpad::new(&config.rpc_url)?;
    let tokens = reader
        .all_tokens(config.factory_address)
        .await
        .context("failed to read the token registry")?;

    if tokens.is_empty() {
        println!("No tokens deployed yet");
        return Ok(());
    }
    for (i, token) in tokens.iter().enumerate() {
        println!(
            "#{} {} ({}) -> {:?} | creator: {:?}",
            i, token.name, token.symbol, token.token_address, token.creator
        );
    }
    Ok(())
}

async fn mint(args: MintArgs) -> Result<()> {
    let config = load_config()?;
    let signer = connect_signer(&config).await?;
    let account = signer.address();
    let wallet = WalletConnection::connected(signer);
    let writer = LaunchpadWriter::new(config.factory_address, config.confirmations);

    let pending = writer
        .submit_freemint(&wallet, args.token, &args.amount)
        .await
        .map_err(explain(Action::Mint))?;
    println!("Minting... tx: {:?}", pending.tx_hash());
    pending.confirm().await.map_err(explain(Action::Mint))?;
    println!("Minted {} to {}.", args.amount.trim(), short_address(&account));
    Ok(())
}

async fn balance(args: BalanceArgs) -> Result<()> {
    let config = load_config()?;
    let owner = match args.owner {
        Some(owner) => owner,
        None => connect_signer(&config).await?.address(),
    };
    let reader = EvmLaunchpad::new(&config.rpc_url)?;
    let handle = reader
        .confidential_balance_of(args.token, owner)
        .await
        .context("failed to read the encrypted balance")?;

    if handle.is_zero() {
        println!("{} has no balance handle on {:?}", short_address(&owner), args.token);
    } else {
        println!("Encrypted balance of {}: {}", short_address(&owner), handle);
    }
    Ok(())
}

async fn demo() -> Result<()> {
    let devnet = Arc::new(Devnet::new());
    let creator = Arc::new(DevnetSigner::new(devnet.clone(), 0)?);
    let user = Arc::new(DevnetSigner::new(devnet.clone(), 1)?);
    let encryption = DevnetEncryption::service(devnet.clone());
    encryption
        .wait_ready()
        .await
        .map_err(|e| anyhow!("encryption service unavailable: {}", e))?;

    let mut config = LaunchpadConfig::new(devnet.factory());
    config.chain_id = devnet.chain_id();
    info!("Running demo on devnet chain {}", config.chain_id);

    let mut creator_app = LaunchpadApp::new(
        config.clone(),
        devnet.clone(),
        creator.connect(),
        encryption.clone(),
    );
    let receipt = creator_app
        .create_token("Prime USDT", "pUSDT")
        .await
        .map_err(explain(Action::Deploy))?;
    println!("Token deployed in block {:?}", receipt.block_number);

    let token = creator_app
        .registry()
        .ready()
        .and_then(|tokens| tokens.last().map(|t| t.token_address))
        .context("registry is empty after deployment")?;
    creator_app.refresh_balance(token).await?;
    let supply = creator_app
        .decrypt(token)
        .await
        .map_err(explain(Action::Decrypt))?;
    println!("{}", creator_app.render());
    println!("Creator balance: {}", supply);

    let mut user_app = LaunchpadApp::new(config, devnet.clone(), user.connect(), encryption);
    user_app
        .mint(token, "5000")
        .await
        .map_err(explain(Action::Mint))?;
    let minted = user_app
        .decrypt(token)
        .await
        .map_err(explain(Action::Decrypt))?;
    if let Some(notice) = user_app.notices().active() {
        println!("{}", notice);
    }
    println!(
        "Balance of {}: {}",
        short_address(&user.address()),
        minted
    );

    let record = devnet
        .token_at(devnet.factory(), 0)
        .await
        .context("failed to read token #0")?;
    println!(
        "Initial supply of {}: {}",
        record.symbol,
        format_amount(&record.initial_supply)
    );
    Ok(())
}
