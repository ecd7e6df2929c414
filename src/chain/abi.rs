//! Runtime ABI fragments for state-changing calls.
//!
//! Reads go through the typed `sol!` interfaces in [`super::contracts`];
//! writes are encoded against these fragments so a deployment can swap in
//! its own ABI JSON without a rebuild.

use alloy_json_abi::{Function, JsonAbi};
use eyre::{eyre, Result};

const APPROVE: &str = "function approve(address spender, uint256 amount) returns (bool)";
const STAKE: &str = "function stake(uint256 amount)";
const STAKE_WITH_PERMIT: &str =
    "function stakeWithPermit(uint256 amount, uint256 deadline, uint8 v, bytes32 r, bytes32 s)";
const WITHDRAW: &str = "function withdraw(uint256 amount)";
const GET_REWARD: &str = "function getReward()";
const EXIT: &str = "function exit()";

/// Function fragments used by the write operations
#[derive(Debug, Clone)]
pub struct WriteAbis {
    pub approve: Function,
    pub stake: Function,
    pub stake_with_permit: Function,
    pub withdraw: Function,
    pub get_reward: Function,
    pub exit: Function,
}

impl WriteAbis {
    /// Fragments for the standard StakingRewards / ERC-20 layout
    pub fn standard() -> Result<Self> {
        Ok(Self {
            approve: parse(APPROVE)?,
            stake: parse(STAKE)?,
            stake_with_permit: parse(STAKE_WITH_PERMIT)?,
            withdraw: parse(WITHDRAW)?,
            get_reward: parse(GET_REWARD)?,
            exit: parse(EXIT)?,
        })
    }

    /// Pick fragments out of ABI JSON for the staking contract and the LP token
    pub fn from_json(staking_abi: &str, token_abi: &str) -> Result<Self> {
        let staking: JsonAbi = serde_json::from_str(staking_abi)?;
        let token: JsonAbi = serde_json::from_str(token_abi)?;

        Ok(Self {
            approve: lookup(&token, "approve")?,
            stake: lookup(&staking, "stake")?,
            stake_with_permit: lookup(&staking, "stakeWithPermit")?,
            withdraw: lookup(&staking, "withdraw")?,
            get_reward: lookup(&staking, "getReward")?,
            exit: lookup(&staking, "exit")?,
        })
    }
}

fn parse(signature: &str) -> Result<Function> {
    Function::parse(signature).map_err(|e| eyre!("bad ABI fragment `{}`: {}", signature, e))
}

fn lookup(abi: &JsonAbi, name: &str) -> Result<Function> {
    abi.function(name)
        .and_then(|overloads| overloads.first())
        .cloned()
        .ok_or_else(|| eyre!("ABI has no `{}` function", name))
}
