//! Data model shared by the readers, the dispatcher and the service.

use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;

use crate::error::{DispatchError, MathError};

// ============================================
// CONSTANTS
// ============================================

/// Denominator of the registry's pool weights
pub const TOTAL_WEIGHT: u64 = 100;

/// Permit validity window from issuance
pub const PERMIT_VALIDITY_SECS: u64 = 1200;

const SECONDS_PER_DAY: u64 = 86_400;

// ============================================
// READ MODELS
// ============================================

/// Staking state of one whitelisted pool, optionally for one user.
///
/// Built fresh per query. Amounts are 18-decimal fixed point unless noted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingPosition {
    pub staked_amount: U256,
    pub earned_amount: U256,
    pub total_staked_amount: U256,
    pub reward_rate: U256,
    /// Epoch seconds
    pub period_finish: U256,
    pub pool_weight: U256,
    pub total_weight: U256,
    pub staking_contract_address: Address,
    pub liquidity_value: U256,
}

impl StakingPosition {
    /// Rewards emitted per day at the current rate
    pub fn reward_per_day(&self) -> Result<U256, MathError> {
        self.reward_rate
            .checked_mul(U256::from(SECONDS_PER_DAY))
            .ok_or(MathError::Overflow("reward_per_day"))
    }

    /// Whether the current reward epoch is still running at `now` (epoch seconds)
    pub fn is_period_active(&self, now: u64) -> bool {
        self.period_finish > U256::from(now)
    }

    /// Share of the total staked supply held by the user, in basis points
    pub fn user_share_bps(&self) -> Result<U256, MathError> {
        if self.total_staked_amount.is_zero() {
            return Ok(U256::ZERO);
        }
        self.staked_amount
            .checked_mul(U256::from(10_000u64))
            .ok_or(MathError::Overflow("user_share_bps"))?
            .checked_div(self.total_staked_amount)
            .ok_or(MathError::DivisionByZero("user_share_bps"))
    }
}

/// A registry entry. `is_active` holds exactly when `weight > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedPool {
    pub pair_address: Address,
    pub weight: U256,
    pub is_active: bool,
}

impl WhitelistedPool {
    pub fn new(pair_address: Address, weight: U256) -> Self {
        Self {
            pair_address,
            weight,
            is_active: !weight.is_zero(),
        }
    }
}

/// Yield estimate for a pool, in percent.
///
/// Swap-fee yield and the liquidity-weighted staking share are not computed
/// yet: they are reported as `0.0` with `liquidity_weighted == false`, which
/// callers must read as "unknown", not "confirmed zero".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AprBreakdown {
    pub swap_fee_apr: f64,
    pub staking_apr: f64,
    pub combined_apr: f64,
    /// This pool's even share of the annualized vesting emission (reward token wei)
    pub annual_pool_emission: U256,
    pub liquidity_weighted: bool,
}

impl AprBreakdown {
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, U256::ZERO)
    }

    pub fn new(swap_fee_apr: f64, staking_apr: f64, annual_pool_emission: U256) -> Self {
        Self {
            swap_fee_apr,
            staking_apr,
            combined_apr: swap_fee_apr + staking_apr,
            annual_pool_emission,
            liquidity_weighted: false,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.combined_apr == 0.0 && self.annual_pool_emission.is_zero()
    }
}

// ============================================
// WRITE MODELS
// ============================================

/// One state-changing contract call, before encoding
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub target: Address,
    pub function: Function,
    pub args: Vec<DynSolValue>,
    pub value: U256,
}

impl ContractCall {
    pub fn new(target: Address, function: &Function, args: Vec<DynSolValue>) -> Self {
        Self {
            target,
            function: function.clone(),
            args,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// ABI-encode selector + arguments against the call's fragment
    pub fn encode(&self) -> Result<TxPayload, DispatchError> {
        let data = self
            .function
            .abi_encode_input(&self.args)
            .map_err(|e| DispatchError::Encoding {
                function: self.function.signature(),
                reason: e.to_string(),
            })?;

        Ok(TxPayload {
            to: self.target,
            data: data.into(),
            value: self.value,
        })
    }
}

/// Unsigned transaction envelope handed to a signing backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPayload {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// Which signing backend is active. Supplied by the caller, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningContext {
    /// Relay-signed wallet; `wallet_id` is `None` when nobody is signed in
    Custodial {
        wallet_id: Option<String>,
        chain_id: u64,
    },
    /// Self-custodied wallet that signs and submits itself
    External,
}

impl std::fmt::Display for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningContext::Custodial { .. } => write!(f, "CUSTODIAL"),
            SigningContext::External => write!(f, "EXTERNAL"),
        }
    }
}

/// Gasless approval message. `nonce` is read fresh for every signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermitMessage {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

impl PermitMessage {
    /// Message valid for [`PERMIT_VALIDITY_SECS`] after `issued_at`
    pub fn new(owner: Address, spender: Address, value: U256, nonce: U256, issued_at: u64) -> Self {
        Self::expiring(owner, spender, value, nonce, issued_at, PERMIT_VALIDITY_SECS)
    }

    pub fn expiring(
        owner: Address,
        spender: Address,
        value: U256,
        nonce: U256,
        issued_at: u64,
        validity_secs: u64,
    ) -> Self {
        Self {
            owner,
            spender,
            value,
            nonce,
            deadline: U256::from(issued_at.saturating_add(validity_secs)),
        }
    }
}

// ============================================
// TESTS
// ============================================
