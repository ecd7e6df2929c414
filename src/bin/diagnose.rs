//! Diagnostic tool - check configuration and contract reachability
//!
//! Run with: cargo run --bin diagnose

use alloy_primitives::utils::format_ether;
use lp_staking::chain::contracts::{ILiquidityPoolManager, IRewardVesting};
use lp_staking::chain::{read, ChainClient, RpcClient};
use lp_staking::config::short;
use lp_staking::{Config, SigningBackend};
use std::env;

fn mark(ok: bool) -> &'static str {
    if ok { "✅" } else { "❌" }
}

#[tokio::main]
async fn main() {
    println!("🔍 LP STAKING DIAGNOSTIC CHECK\n");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("❌ Could not load configuration: {}", e);
            return;
        }
    };

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("SIGNING_BACKEND", "external", "Which wallet signs?"),
        ("CHAIN_ID", "43114", "Chain the transactions target"),
        ("RELAY_GAS_LIMIT", "3000000", "Gas ceiling for relay transactions"),
        ("PERMIT_VALIDITY_SECS", "1200", "Permit deadline window"),
        ("STAKING_ABI_PATH", "(standard)", "Staking contract ABI JSON"),
        ("TOKEN_ABI_PATH", "(standard)", "LP token ABI JSON"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    println!("  RPC_URL: {}", short(&config.rpc_url));
    println!("  CANDIDATE_PAIRS: {}", config.candidate_pairs.len());

    println!("\n═══════════════════════════════════════════════════");
    println!("                 SIGNING READINESS                  ");
    println!("═══════════════════════════════════════════════════\n");

    match config.signing_backend {
        SigningBackend::External => {
            println!("  🔑 EXTERNAL WALLET");
            println!("  WALLET_PRIVATE_KEY:  {}", mark(config.wallet_private_key.is_some()));
            println!("     → Permit staking: available");
        }
        SigningBackend::Custodial => {
            println!("  🏦 CUSTODIAL RELAY");
            println!("  RELAY_URL:           {}", mark(!config.relay_url.is_empty()));
            println!("  RELAY_BEARER_TOKEN:  {}", mark(config.relay_bearer_token.is_some()));
            println!("  CUSTODIAL_WALLET_ID: {}", mark(config.custodial_wallet_id.is_some()));
            println!("     → Permit staking: not available, approve + stake is used");
        }
    }

    match config.write_abis() {
        Ok(_) => println!("  Write ABI fragments: ✅"),
        Err(e) => println!("  Write ABI fragments: ❌ {}", e),
    }

    match config.validate() {
        Ok(()) => println!("\n  ✅ Configuration valid"),
        Err(e) => println!("\n  ⚠️  {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                    CONTRACTS                       ");
    println!("═══════════════════════════════════════════════════\n");

    let client = RpcClient::new(config.rpc_url.clone());

    match client.chain_id().await {
        Ok(chain_id) if chain_id == config.chain_id => println!("  Chain ID:        ✅ {}", chain_id),
        Ok(chain_id) => println!("  Chain ID:        ⚠️  RPC reports {}, config says {}", chain_id, config.chain_id),
        Err(e) => {
            println!("  RPC:             ❌ {}", e);
            println!("\n❌ Diagnostic aborted: RPC unreachable\n");
            return;
        }
    }

    if let Ok(manager) = config.pool_manager() {
        match read(&client, manager, ILiquidityPoolManager::getPoolCountCall {}).await {
            Ok(count) => println!("  Pool manager:    ✅ {} pools", count),
            Err(e) => println!("  Pool manager:    ❌ {}", e),
        }

        for pair in config.candidate_pair_addresses() {
            let whitelisted = read(&client, manager, ILiquidityPoolManager::isPoolWhitelistedCall { pair }).await;
            match whitelisted {
                Ok(listed) => println!("    {:?}  {}", pair, mark(listed)),
                Err(e) => println!("    {:?}  ❌ {}", pair, e),
            }
        }
    }

    if let Ok(vesting) = config.reward_vesting() {
        let (enabled, amount) = futures::join!(
            read(&client, vesting, IRewardVesting::vestingEnabledCall {}),
            read(&client, vesting, IRewardVesting::vestingAmountCall {}),
        );
        match (enabled, amount) {
            (Ok(enabled), Ok(amount)) => println!(
                "  Reward vesting:  {} enabled={}, {} per period",
                mark(enabled),
                enabled,
                format_ether(amount)
            ),
            (Err(e), _) | (_, Err(e)) => println!("  Reward vesting:  ❌ {}", e),
        }
    }

    match client.gas_price().await {
        Ok(price) => println!("  Gas price:       {} wei", price),
        Err(e) => println!("  Gas price:       ❌ {}", e),
    }

    println!("\n✅ Diagnostic complete!\n");
}
