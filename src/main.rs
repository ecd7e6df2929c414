//! LP Staking CLI
//!
//! Run with: cargo run -- <command>

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::{Address, U256};
use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lp_staking::executor::TerminalCredential;
use lp_staking::{Config, StakeRoute, StakingService};

#[derive(Parser)]
#[command(name = "lp-staking", version, about = "Stake LP tokens into pool reward contracts")]
struct Cli {
    /// TOML config file; the environment is used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the active configuration
    Config,
    /// List whitelisted pools among the configured candidates
    Pools,
    /// Staking state of a pair, optionally for one account
    Info {
        pair: Address,
        #[arg(long)]
        user: Option<Address>,
    },
    /// Reward emission estimate for a pair
    Apr { pair: Address },
    /// Stake LP tokens of a pair (amount in whole tokens, e.g. 1.5)
    Stake {
        pair: Address,
        amount: String,
        /// Sign a permit instead of approving first
        #[arg(long, conflicts_with = "approval")]
        permit: bool,
        /// Approve, then stake
        #[arg(long)]
        approval: bool,
    },
    /// Withdraw staked LP tokens
    Unstake { pair: Address, amount: String },
    /// Collect earned rewards
    Claim { pair: Address },
    /// Withdraw everything and collect rewards
    Exit { pair: Address },
    /// Approve a spender for a token amount
    Approve {
        token: Address,
        spender: Address,
        amount: String,
    },
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 🌾 LP STAKING - Pool Rewards Client").cyan().bold());
    println!(
        "{}",
        style("    Registry Reads | Permit Staking | Custodial Relay").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn parse_amount(amount: &str) -> Result<U256> {
    parse_ether(amount.trim()).map_err(|e| eyre!("Invalid amount '{}': {}", amount, e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tx(label: &str, tx_hash: &str) {
    println!("{} {}: {}", style("✓").green().bold(), label, style(tx_hash).yellow());
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lp_staking=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if !cli.json {
        print_banner();
    }

    if matches!(cli.command, Command::Config) {
        config.print_summary();
        return Ok(());
    }

    let service = StakingService::from_config(&config, Arc::new(TerminalCredential::new()))?;
    info!("Signing backend: {}", service.context());

    match cli.command {
        // Printed before the service is built
        Command::Config => {}

        Command::Pools => {
            let pools = service.list_whitelisted_pools().await;
            if cli.json {
                print_json(&pools)?;
            } else if pools.is_empty() {
                println!("No whitelisted pools among {} candidates", config.candidate_pairs.len());
            } else {
                for pool in &pools {
                    println!(
                        "  {:?}  weight {:>4}  {}",
                        pool.pair_address,
                        pool.weight,
                        if pool.is_active { style("active").green() } else { style("inactive").dim() }
                    );
                }
            }
        }

        Command::Info { pair, user } => {
            let user = user.or(service.account());
            match service.get_info(pair, user).await {
                Some(position) if cli.json => print_json(&position)?,
                Some(position) => {
                    let now = Utc::now().timestamp().max(0) as u64;
                    println!("Staking contract: {:?}", position.staking_contract_address);
                    println!("Total staked:     {}", format_ether(position.total_staked_amount));
                    println!("Your stake:       {}", format_ether(position.staked_amount));
                    if let Ok(bps) = position.user_share_bps() {
                        let bps = bps.saturating_to::<u64>();
                        println!("Your share:       {}.{:02}%", bps / 100, bps % 100);
                    }
                    println!("Earned:           {}", format_ether(position.earned_amount));
                    println!("Pool weight:      {}/{}", position.pool_weight, position.total_weight);
                    match position.reward_per_day() {
                        Ok(per_day) => println!("Rewards per day:  {}", format_ether(per_day)),
                        Err(e) => println!("Rewards per day:  n/a ({})", e),
                    }
                    println!(
                        "Reward period:    {}",
                        if position.is_period_active(now) { "running" } else { "finished" }
                    );
                }
                None => println!("Pair {:?} is not whitelisted or has no staking contract", pair),
            }
        }

        Command::Apr { pair } => {
            let apr = service.get_apr(pair).await;
            if cli.json {
                print_json(&apr)?;
            } else {
                println!("Annual pool emission: {}", format_ether(apr.annual_pool_emission));
                println!("Swap fee APR:         {:.2}% (not computed)", apr.swap_fee_apr);
                println!("Staking APR:          {:.2}% (not computed)", apr.staking_apr);
            }
        }

        Command::Stake { pair, amount, permit, approval } => {
            let route = match (permit, approval) {
                (true, _) => StakeRoute::Permit,
                (_, true) => StakeRoute::Approval,
                _ => StakeRoute::Auto,
            };
            let receipt = service.stake_pair(pair, parse_amount(&amount)?, route).await?;
            if cli.json {
                print_json(&receipt)?;
            } else {
                if let Some(approval_tx) = &receipt.approval_tx {
                    print_tx("Approved", approval_tx);
                }
                print_tx("Staked", &receipt.stake_tx);
            }
        }

        Command::Unstake { pair, amount } => {
            let staking = service.staking_contract_of(pair).await?;
            let tx_hash = service.unstake(staking, parse_amount(&amount)?).await?;
            print_tx("Unstaked", &tx_hash);
        }

        Command::Claim { pair } => {
            let staking = service.staking_contract_of(pair).await?;
            print_tx("Claimed", &service.claim(staking).await?);
        }

        Command::Exit { pair } => {
            let staking = service.staking_contract_of(pair).await?;
            print_tx("Exited", &service.exit(staking).await?);
        }

        Command::Approve { token, spender, amount } => {
            let tx_hash = service.approve(token, spender, parse_amount(&amount)?).await?;
            print_tx("Approved", &tx_hash);
        }
    }

    Ok(())
}
