//! Configuration for the staking client
//!
//! Loaded from the environment (and `.env`) or a TOML file. Secrets are
//! read here and nowhere else; `print_summary` only reports whether they
//! are set.

use alloy_primitives::Address;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::chain::WriteAbis;
use crate::executor::DEFAULT_RELAY_GAS_LIMIT;
use crate::types::{SigningContext, PERMIT_VALIDITY_SECS};

// ============================================
// SIGNING BACKEND
// ============================================

/// Which wallet signs state-changing transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningBackend {
    /// Local private key; supports permit signatures
    External,

    /// Relay-held key unlocked by a per-transaction PIN
    Custodial,
}

impl Default for SigningBackend {
    fn default() -> Self {
        SigningBackend::External
    }
}

impl std::fmt::Display for SigningBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningBackend::External => write!(f, "EXTERNAL"),
            SigningBackend::Custodial => write!(f, "CUSTODIAL"),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========== Network Settings ==========
    pub rpc_url: String,

    pub chain_id: u64,

    // ========== Contracts ==========
    /// Liquidity pool manager (whitelist registry)
    pub pool_manager_address: String,

    pub reward_vesting_address: String,

    /// Pairs checked by `pools`; the registry has no enumeration
    pub candidate_pairs: Vec<String>,

    // ========== Signing ==========
    pub signing_backend: SigningBackend,

    pub relay_url: String,

    /// Relay session token (KEEP SECRET!)
    pub relay_bearer_token: Option<String>,

    /// Signed-in custodial wallet; unset means nobody is signed in
    pub custodial_wallet_id: Option<String>,

    /// Gas ceiling sent with every relay transaction
    pub relay_gas_limit: u64,

    /// External wallet key (KEEP SECRET!)
    pub wallet_private_key: Option<String>,

    /// Permit deadline, seconds after signing
    pub permit_validity_secs: u64,

    // ========== ABI Fragments ==========
    /// Staking contract ABI JSON; the standard layout is used when unset
    pub staking_abi_path: Option<String>,

    /// LP token ABI JSON, set together with `staking_abi_path`
    pub token_abi_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            // Network
            rpc_url: env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| defaults.chain_id.to_string())
                .parse()
                .unwrap_or(defaults.chain_id),

            // Contracts
            pool_manager_address: env::var("POOL_MANAGER_ADDRESS").unwrap_or_default(),
            reward_vesting_address: env::var("REWARD_VESTING_ADDRESS").unwrap_or_default(),
            candidate_pairs: env::var("CANDIDATE_PAIRS")
                .map(|s| {
                    s.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            // Signing
            signing_backend: match env::var("SIGNING_BACKEND")
                .unwrap_or_else(|_| "external".to_string())
                .to_lowercase()
                .as_str()
            {
                "custodial" | "relay" => SigningBackend::Custodial,
                _ => SigningBackend::External,
            },
            relay_url: env::var("RELAY_URL").unwrap_or(defaults.relay_url),
            relay_bearer_token: env::var("RELAY_BEARER_TOKEN").ok(),
            custodial_wallet_id: env::var("CUSTODIAL_WALLET_ID").ok().filter(|id| !id.is_empty()),
            relay_gas_limit: env::var("RELAY_GAS_LIMIT")
                .unwrap_or_else(|_| DEFAULT_RELAY_GAS_LIMIT.to_string())
                .parse()
                .unwrap_or(DEFAULT_RELAY_GAS_LIMIT),
            wallet_private_key: env::var("WALLET_PRIVATE_KEY").ok(),
            permit_validity_secs: env::var("PERMIT_VALIDITY_SECS")
                .unwrap_or_else(|_| PERMIT_VALIDITY_SECS.to_string())
                .parse()
                .unwrap_or(PERMIT_VALIDITY_SECS),

            // ABI fragments
            staking_abi_path: env::var("STAKING_ABI_PATH").ok().filter(|p| !p.is_empty()),
            token_abi_path: env::var("TOKEN_ABI_PATH").ok().filter(|p| !p.is_empty()),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn pool_manager(&self) -> Result<Address> {
        parse_address("POOL_MANAGER_ADDRESS", &self.pool_manager_address)
    }

    pub fn reward_vesting(&self) -> Result<Address> {
        parse_address("REWARD_VESTING_ADDRESS", &self.reward_vesting_address)
    }

    /// Candidate pairs that parse as addresses; the rest are dropped
    pub fn candidate_pair_addresses(&self) -> Vec<Address> {
        self.candidate_pairs
            .iter()
            .filter_map(|s| Address::from_str(s).ok())
            .collect()
    }

    /// The signing context the service is built with
    pub fn signing_context(&self) -> SigningContext {
        match self.signing_backend {
            SigningBackend::Custodial => SigningContext::Custodial {
                wallet_id: self.custodial_wallet_id.clone(),
                chain_id: self.chain_id,
            },
            SigningBackend::External => SigningContext::External,
        }
    }

    /// Write-call fragments: from the ABI files when configured, else the standard layout
    pub fn write_abis(&self) -> Result<WriteAbis> {
        match (&self.staking_abi_path, &self.token_abi_path) {
            (None, None) => WriteAbis::standard(),
            (Some(staking), Some(token)) => {
                let staking_abi = fs::read_to_string(staking)
                    .map_err(|e| eyre!("Cannot read STAKING_ABI_PATH '{}': {}", staking, e))?;
                let token_abi = fs::read_to_string(token)
                    .map_err(|e| eyre!("Cannot read TOKEN_ABI_PATH '{}': {}", token, e))?;
                WriteAbis::from_json(&staking_abi, &token_abi)
            }
            _ => Err(eyre!("STAKING_ABI_PATH and TOKEN_ABI_PATH must be set together")),
        }
    }

    /// Validate configuration before building the service
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() || self.rpc_url.contains("YOUR_API_KEY") {
            return Err(eyre!("Invalid RPC_URL - please set a valid RPC endpoint"));
        }

        self.pool_manager()?;
        self.reward_vesting()?;

        if self.candidate_pair_addresses().len() != self.candidate_pairs.len() {
            return Err(eyre!("CANDIDATE_PAIRS contains an invalid address"));
        }

        match self.signing_backend {
            SigningBackend::Custodial => {
                if self.relay_url.is_empty() {
                    return Err(eyre!("Custodial signing requires RELAY_URL"));
                }
                if self.relay_bearer_token.is_none() {
                    return Err(eyre!("Custodial signing requires RELAY_BEARER_TOKEN"));
                }
                if self.relay_gas_limit == 0 {
                    return Err(eyre!("RELAY_GAS_LIMIT must be positive"));
                }
            }
            SigningBackend::External => {
                if self.wallet_private_key.is_none() {
                    return Err(eyre!("External signing requires WALLET_PRIVATE_KEY"));
                }
            }
        }

        if self.permit_validity_secs == 0 {
            return Err(eyre!("PERMIT_VALIDITY_SECS must be positive"));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              LP STAKING - CONFIGURATION                    ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Signing Backend:   {:^40} ║", self.signing_backend);
        println!("║ Chain ID:          {:^40} ║", self.chain_id);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CONTRACTS                                                  ║");
        println!("║ • Pool Manager:    {:^40} ║", short(&self.pool_manager_address));
        println!("║ • Reward Vesting:  {:^40} ║", short(&self.reward_vesting_address));
        println!("║ • Candidate Pairs: {:^40} ║", self.candidate_pairs.len());
        println!("║ • Write ABI:       {:^40} ║",
            if self.staking_abi_path.is_some() { "From ABI files" } else { "Standard" }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SIGNING                                                    ║");
        match self.signing_backend {
            SigningBackend::Custodial => {
                println!("║ • Relay:           {:^40} ║", short(&self.relay_url));
                println!("║ • Session Token:   {:^40} ║",
                    if self.relay_bearer_token.is_some() { "✓ Configured" } else { "✗ Not Set" }
                );
                println!("║ • Wallet:          {:^40} ║",
                    self.custodial_wallet_id.as_deref().unwrap_or("✗ Not signed in")
                );
                println!("║ • Gas Ceiling:     {:^40} ║", self.relay_gas_limit);
            }
            SigningBackend::External => {
                println!("║ • Private Key:     {:^40} ║",
                    if self.wallet_private_key.is_some() { "✓ Configured" } else { "✗ Not Set" }
                );
                println!("║ • Permit Validity: {:>36} sec ║", self.permit_validity_secs);
            }
        }
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            chain_id: 43114,
            pool_manager_address: String::new(),
            reward_vesting_address: String::new(),
            candidate_pairs: vec![],
            signing_backend: SigningBackend::External,
            relay_url: String::new(),
            relay_bearer_token: None,
            custodial_wallet_id: None,
            relay_gas_limit: DEFAULT_RELAY_GAS_LIMIT,
            wallet_private_key: None,
            permit_validity_secs: PERMIT_VALIDITY_SECS,
            staking_abi_path: None,
            token_abi_path: None,
        }
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).map_err(|_| eyre!("{} is not a valid address: '{}'", name, value))
}

/// Fit a long value into a 40-column display cell
pub fn short(value: &str) -> String {
    if value.is_empty() {
        return "✗ Not Set".to_string();
    }
    if value.chars().count() <= 40 {
        return value.to_string();
    }
    let head: String = value.chars().take(20).collect();
    let tail: String = value.chars().rev().take(17).collect::<Vec<_>>().into_iter().rev().collect();
    format!("{}...{}", head, tail)
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const MANAGER: &str = "0x00000000000000000000000000000000000000f1";
    const VESTING: &str = "0x00000000000000000000000000000000000000f2";

    fn external() -> Config {
        Config {
            pool_manager_address: MANAGER.to_string(),
            reward_vesting_address: VESTING.to_string(),
            candidate_pairs: vec!["0x00000000000000000000000000000000000000aa".to_string()],
            wallet_private_key: Some("0x01".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.signing_backend, SigningBackend::External);
        assert_eq!(config.relay_gas_limit, 3_000_000);
        assert_eq!(config.permit_validity_secs, 1200);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signing_context() {
        let mut config = external();
        assert_eq!(config.signing_context(), SigningContext::External);

        config.signing_backend = SigningBackend::Custodial;
        config.custodial_wallet_id = Some("w-9".to_string());
        assert_eq!(
            config.signing_context(),
            SigningContext::Custodial {
                wallet_id: Some("w-9".to_string()),
                chain_id: 43114,
            }
        );
    }

    #[test]
    fn test_validate_per_backend() {
        assert!(external().validate().is_ok());

        let mut no_key = external();
        no_key.wallet_private_key = None;
        assert!(no_key.validate().is_err());

        let mut custodial = external();
        custodial.signing_backend = SigningBackend::Custodial;
        assert!(custodial.validate().is_err());
        custodial.relay_url = "https://relay.example/tx".to_string();
        custodial.relay_bearer_token = Some("token".to_string());
        assert!(custodial.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let mut config = external();
        config.pool_manager_address = "0xnope".to_string();
        assert!(config.validate().is_err());

        let mut config = external();
        config.candidate_pairs.push("garbage".to_string());
        assert!(config.validate().is_err());
        assert_eq!(config.candidate_pair_addresses().len(), 1);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = external();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("signing_backend = \"external\""));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.pool_manager().unwrap(), config.pool_manager().unwrap());
        assert_eq!(parsed.candidate_pairs, config.candidate_pairs);
    }

    #[test]
    fn test_write_abis_from_files() {
        assert!(external().write_abis().is_ok());

        let dir = std::env::temp_dir().join(format!("lp-staking-abi-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let staking = dir.join("staking.json");
        let token = dir.join("token.json");
        fs::write(
            &staking,
            r#"[
                {"type":"function","name":"stake","inputs":[{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
                {"type":"function","name":"stakeWithPermit","inputs":[{"name":"amount","type":"uint256"},{"name":"deadline","type":"uint256"},{"name":"v","type":"uint8"},{"name":"r","type":"bytes32"},{"name":"s","type":"bytes32"}],"outputs":[],"stateMutability":"nonpayable"},
                {"type":"function","name":"withdraw","inputs":[{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
                {"type":"function","name":"getReward","inputs":[],"outputs":[],"stateMutability":"nonpayable"},
                {"type":"function","name":"exit","inputs":[],"outputs":[],"stateMutability":"nonpayable"}
            ]"#,
        )
        .unwrap();
        fs::write(
            &token,
            r#"[{"type":"function","name":"approve","inputs":[{"name":"spender","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"}]"#,
        )
        .unwrap();

        let mut config = external();
        config.staking_abi_path = Some(staking.display().to_string());
        config.token_abi_path = Some(token.display().to_string());
        let abis = config.write_abis().unwrap();
        assert_eq!(abis.stake.selector(), WriteAbis::standard().unwrap().stake.selector());

        config.token_abi_path = None;
        assert!(config.write_abis().is_err());

        config.token_abi_path = Some(dir.join("missing.json").display().to_string());
        assert!(config.write_abis().is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_short_cells() {
        assert_eq!(short(""), "✗ Not Set");
        assert_eq!(short("abc"), "abc");
        assert_eq!(short(&"x".repeat(60)).chars().count(), 40);

        let unicode = format!("https://rpc.example/{}", "ü".repeat(50));
        assert_eq!(short(&unicode).chars().count(), 40);
    }
}
