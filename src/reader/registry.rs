//! Pool Registry Reader - whitelist, weights and staking contract lookup

use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::settle::settle;
use crate::chain::contracts::ILiquidityPoolManager;
use crate::chain::{read, ChainClient};
use crate::types::WhitelistedPool;

/// Registry state of one pair, each field defaulted if its query failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRegistration {
    pub whitelisted: bool,
    pub weight: U256,
    /// Zero for pairs not denominated in the native asset
    pub liquidity_value: U256,
    /// `Address::ZERO` when unresolved
    pub staking_contract: Address,
}

impl PoolRegistration {
    /// Whitelisted and backed by a staking contract
    pub fn is_stakeable(&self) -> bool {
        self.whitelisted && !self.staking_contract.is_zero()
    }
}

#[derive(Clone)]
pub struct RegistryReader {
    client: Arc<dyn ChainClient>,
    manager: Address,
}

impl RegistryReader {
    pub fn new(client: Arc<dyn ChainClient>, manager: Address) -> Self {
        Self { client, manager }
    }

    pub async fn is_whitelisted(&self, pair: Address) -> eyre::Result<bool> {
        read(&*self.client, self.manager, ILiquidityPoolManager::isPoolWhitelistedCall { pair }).await
    }

    pub async fn pool_weight(&self, pair: Address) -> eyre::Result<U256> {
        read(&*self.client, self.manager, ILiquidityPoolManager::getPoolWeightCall { pair }).await
    }

    pub async fn pool_count(&self) -> eyre::Result<U256> {
        read(&*self.client, self.manager, ILiquidityPoolManager::getPoolCountCall {}).await
    }

    pub async fn staking_contract(&self, pair: Address) -> eyre::Result<Address> {
        read(&*self.client, self.manager, ILiquidityPoolManager::stakingContractsCall { pair }).await
    }

    pub async fn native_liquidity(&self, pair: Address) -> eyre::Result<U256> {
        read(&*self.client, self.manager, ILiquidityPoolManager::getNativeLiquidityValueCall { pair }).await
    }

    /// Fetch whitelist flag, weight, native liquidity and staking contract together
    pub async fn registration(&self, pair: Address) -> PoolRegistration {
        let (whitelisted, weight, liquidity_value, staking_contract) = futures::join!(
            settle("isPoolWhitelisted", self.is_whitelisted(pair), false),
            settle("getPoolWeight", self.pool_weight(pair), U256::ZERO),
            settle("getNativeLiquidityValue", self.native_liquidity(pair), U256::ZERO),
            settle("stakingContracts", self.staking_contract(pair), Address::ZERO),
        );

        PoolRegistration {
            whitelisted,
            weight,
            liquidity_value,
            staking_contract,
        }
    }

    /// Whitelisted pools among `candidates`, in candidate order.
    ///
    /// A candidate whose lookup fails is left out; the rest still resolve.
    pub async fn list_whitelisted_pools(&self, candidates: &[Address]) -> Vec<WhitelistedPool> {
        let start = Instant::now();

        let lookups = candidates.iter().map(|&pair| async move {
            let (whitelisted, weight) =
                futures::join!(self.is_whitelisted(pair), self.pool_weight(pair));
            match (whitelisted, weight) {
                (Ok(true), Ok(weight)) => Some(WhitelistedPool::new(pair, weight)),
                (Ok(false), _) => None,
                (Err(e), _) | (_, Err(e)) => {
                    debug!("Skipping pair {:?}: registry lookup failed: {}", pair, e);
                    None
                }
            }
        });

        let pools: Vec<WhitelistedPool> = join_all(lookups).await.into_iter().flatten().collect();

        info!(
            "Registry: {} of {} candidate pairs whitelisted ({:?})",
            pools.len(),
            candidates.len(),
            start.elapsed()
        );

        pools
    }
}

// ============================================
// TESTS
// ============================================
