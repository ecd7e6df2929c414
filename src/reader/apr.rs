//! APR Calculator - reward emission share from the vesting schedule
//!
//! Only the emission term is computed. Swap-fee yield and the
//! liquidity-weighted staking share need volume and liquidity data this crate
//! does not have; they stay at zero and `liquidity_weighted` stays `false`.

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::RegistryReader;
use super::settle::settle;
use crate::chain::contracts::IRewardVesting;
use crate::chain::{read, ChainClient};
use crate::error::MathError;
use crate::types::AprBreakdown;

pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Inputs of the APR estimate, defaulted when their query failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingInputs {
    pub pool_weight: U256,
    pub pool_count: U256,
    pub whitelisted: bool,
    pub vesting_amount: U256,
    pub halving_period: U256,
    pub vesting_enabled: bool,
}

impl VestingInputs {
    /// Whether this pool earns any emission at all
    pub fn is_emitting(&self) -> bool {
        self.whitelisted && self.vesting_enabled && !self.pool_weight.is_zero()
    }
}

/// `vesting_amount * SECONDS_PER_YEAR / halving_period`, zero for a zero period
pub fn annual_emission(vesting_amount: U256, halving_period: U256) -> Result<U256, MathError> {
    if halving_period.is_zero() {
        return Ok(U256::ZERO);
    }
    vesting_amount
        .checked_mul(U256::from(SECONDS_PER_YEAR))
        .ok_or(MathError::Overflow("annual_emission"))?
        .checked_div(halving_period)
        .ok_or(MathError::DivisionByZero("annual_emission"))
}

/// Even split of the annual emission across all pools, zero when there are none
pub fn pool_share(annual: U256, pool_count: U256) -> U256 {
    annual.checked_div(pool_count).unwrap_or(U256::ZERO)
}

#[derive(Clone)]
pub struct AprCalculator {
    client: Arc<dyn ChainClient>,
    registry: RegistryReader,
    vesting: Address,
}

impl AprCalculator {
    pub fn new(client: Arc<dyn ChainClient>, registry: RegistryReader, vesting: Address) -> Self {
        Self { client, registry, vesting }
    }

    pub async fn inputs(&self, pair: Address) -> VestingInputs {
        let client = &*self.client;
        let vesting = self.vesting;

        let (pool_weight, pool_count, whitelisted, vesting_amount, halving_period, vesting_enabled) = futures::join!(
            settle("getPoolWeight", self.registry.pool_weight(pair), U256::ZERO),
            settle("getPoolCount", self.registry.pool_count(), U256::ZERO),
            settle("isPoolWhitelisted", self.registry.is_whitelisted(pair), false),
            settle("vestingAmount", read(client, vesting, IRewardVesting::vestingAmountCall {}), U256::ZERO),
            settle("halvingPeriod", read(client, vesting, IRewardVesting::halvingPeriodCall {}), U256::ZERO),
            settle("vestingEnabled", read(client, vesting, IRewardVesting::vestingEnabledCall {}), false),
        );

        VestingInputs {
            pool_weight,
            pool_count,
            whitelisted,
            vesting_amount,
            halving_period,
            vesting_enabled,
        }
    }

    /// APR estimate for `pair`; all-zero when the pool earns no emission
    pub async fn compute_apr(&self, pair: Address) -> AprBreakdown {
        let inputs = self.inputs(pair).await;

        if !inputs.is_emitting() {
            debug!("Pair {:?} earns no emission: {:?}", pair, inputs);
            return AprBreakdown::zero();
        }

        let annual = match annual_emission(inputs.vesting_amount, inputs.halving_period) {
            Ok(annual) => annual,
            Err(e) => {
                warn!("APR for {:?} not computable: {}", pair, e);
                return AprBreakdown::zero();
            }
        };

        let share = pool_share(annual, inputs.pool_count);
        debug!(
            "Pair {:?}: annual emission {} split over {} pools -> {}",
            pair, annual, inputs.pool_count, share
        );

        AprBreakdown::new(0.0, 0.0, share)
    }
}

// ============================================
// TESTS
// ============================================
