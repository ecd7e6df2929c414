//! Staking Contract Reader - per-pool supply, rate, period and user balances

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

use super::registry::RegistryReader;
use super::settle::{settle, settle_if};
use crate::chain::contracts::IStakingRewards;
use crate::chain::{read, ChainClient};
use crate::types::{StakingPosition, TOTAL_WEIGHT};

/// Values read from one staking contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakingSnapshot {
    pub total_supply: U256,
    pub reward_rate: U256,
    pub period_finish: U256,
    pub user_staked: U256,
    pub user_earned: U256,
}

#[derive(Clone)]
pub struct StakingReader {
    client: Arc<dyn ChainClient>,
    registry: RegistryReader,
}

impl StakingReader {
    pub fn new(client: Arc<dyn ChainClient>, registry: RegistryReader) -> Self {
        Self { client, registry }
    }

    /// Read the staking contract; user balances are only queried when `user` is given
    pub async fn snapshot(&self, staking: Address, user: Option<Address>) -> StakingSnapshot {
        let client = &*self.client;

        let (total_supply, reward_rate, period_finish, user_staked, user_earned) = futures::join!(
            settle("totalSupply", read(client, staking, IStakingRewards::totalSupplyCall {}), U256::ZERO),
            settle("rewardRate", read(client, staking, IStakingRewards::rewardRateCall {}), U256::ZERO),
            settle("periodFinish", read(client, staking, IStakingRewards::periodFinishCall {}), U256::ZERO),
            settle_if(
                "balanceOf",
                user,
                |account| read(client, staking, IStakingRewards::balanceOfCall { account }),
                U256::ZERO,
            ),
            settle_if(
                "earned",
                user,
                |account| read(client, staking, IStakingRewards::earnedCall { account }),
                U256::ZERO,
            ),
        );

        StakingSnapshot {
            total_supply,
            reward_rate,
            period_finish,
            user_staked,
            user_earned,
        }
    }

    /// Staking state of `pair`, or `None` unless the pair is whitelisted and
    /// has a staking contract. Never fails: sub-query errors become defaults.
    pub async fn resolve_staking_info(
        &self,
        pair: Address,
        user: Option<Address>,
    ) -> Option<StakingPosition> {
        let registration = self.registry.registration(pair).await;

        if !registration.whitelisted {
            debug!("Pair {:?} is not whitelisted", pair);
            return None;
        }
        if registration.staking_contract.is_zero() {
            debug!("Pair {:?} has no staking contract", pair);
            return None;
        }

        let snapshot = self.snapshot(registration.staking_contract, user).await;

        Some(StakingPosition {
            staked_amount: snapshot.user_staked,
            earned_amount: snapshot.user_earned,
            total_staked_amount: snapshot.total_supply,
            reward_rate: snapshot.reward_rate,
            period_finish: snapshot.period_finish,
            pool_weight: registration.weight,
            total_weight: U256::from(TOTAL_WEIGHT),
            staking_contract_address: registration.staking_contract,
            liquidity_value: registration.liquidity_value,
        })
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contracts::ILiquidityPoolManager;
    use crate::chain::mock::MockChain;
    use alloy_primitives::address;
    use alloy_sol_types::{SolCall, SolValue};

    const MANAGER: Address = address!("00000000000000000000000000000000000000f1");
    const PAIR: Address = address!("00000000000000000000000000000000000000aa");
    const STAKING: Address = address!("0000000000000000000000000000000000000abc");
    const USER: Address = address!("0000000000000000000000000000000000000001");
    const PERIOD_FINISH: u64 = 1_750_000_000;

    fn scripted(whitelisted: bool, staking: Address) -> MockChain {
        let chain = MockChain::new();
        chain.respond(MANAGER, ILiquidityPoolManager::isPoolWhitelistedCall::SELECTOR, whitelisted.abi_encode());
        chain.respond(MANAGER, ILiquidityPoolManager::getPoolWeightCall::SELECTOR, U256::from(5u64).abi_encode());
        chain.respond(MANAGER, ILiquidityPoolManager::getNativeLiquidityValueCall::SELECTOR, U256::from(777u64).abi_encode());
        chain.respond(MANAGER, ILiquidityPoolManager::stakingContractsCall::SELECTOR, staking.abi_encode());

        chain.respond(STAKING, IStakingRewards::totalSupplyCall::SELECTOR, U256::from(1000u64).abi_encode());
        chain.respond(STAKING, IStakingRewards::rewardRateCall::SELECTOR, U256::from(2u64).abi_encode());
        chain.respond(STAKING, IStakingRewards::periodFinishCall::SELECTOR, U256::from(PERIOD_FINISH).abi_encode());
        chain.respond(STAKING, IStakingRewards::balanceOfCall::SELECTOR, U256::from(50u64).abi_encode());
        chain.respond(STAKING, IStakingRewards::earnedCall::SELECTOR, U256::from(3u64).abi_encode());
        chain
    }

    fn reader(chain: Arc<MockChain>) -> StakingReader {
        let registry = RegistryReader::new(chain.clone(), MANAGER);
        StakingReader::new(chain, registry)
    }

    #[tokio::test]
    async fn test_resolve_full_position() {
        let chain = Arc::new(scripted(true, STAKING));
        let position = reader(chain).resolve_staking_info(PAIR, Some(USER)).await.unwrap();

        assert_eq!(
            position,
            StakingPosition {
                staked_amount: U256::from(50u64),
                earned_amount: U256::from(3u64),
                total_staked_amount: U256::from(1000u64),
                reward_rate: U256::from(2u64),
                period_finish: U256::from(PERIOD_FINISH),
                pool_weight: U256::from(5u64),
                total_weight: U256::from(100u64),
                staking_contract_address: STAKING,
                liquidity_value: U256::from(777u64),
            }
        );
    }

    #[tokio::test]
    async fn test_not_whitelisted_is_absent() {
        let chain = Arc::new(scripted(false, STAKING));
        assert!(reader(chain.clone()).resolve_staking_info(PAIR, Some(USER)).await.is_none());
        assert!(!chain.was_called(STAKING, IStakingRewards::totalSupplyCall::SELECTOR));
    }

    #[tokio::test]
    async fn test_whitelist_query_failure_is_absent() {
        let chain = scripted(true, STAKING);
        chain.fail(MANAGER, ILiquidityPoolManager::isPoolWhitelistedCall::SELECTOR);
        assert!(reader(Arc::new(chain)).resolve_staking_info(PAIR, None).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_staking_contract_is_absent() {
        let chain = Arc::new(scripted(true, Address::ZERO));
        assert!(reader(chain).resolve_staking_info(PAIR, Some(USER)).await.is_none());
    }

    #[tokio::test]
    async fn test_without_user_skips_balance_queries() {
        let chain = Arc::new(scripted(true, STAKING));
        let position = reader(chain.clone()).resolve_staking_info(PAIR, None).await.unwrap();

        assert_eq!(position.staked_amount, U256::ZERO);
        assert_eq!(position.earned_amount, U256::ZERO);
        assert_eq!(position.total_staked_amount, U256::from(1000u64));
        assert!(!chain.was_called(STAKING, IStakingRewards::balanceOfCall::SELECTOR));
        assert!(!chain.was_called(STAKING, IStakingRewards::earnedCall::SELECTOR));
    }

    #[tokio::test]
    async fn test_single_failed_field_defaults_alone() {
        let chain = scripted(true, STAKING);
        chain.fail(MANAGER, ILiquidityPoolManager::getPoolWeightCall::SELECTOR);
        chain.fail(STAKING, IStakingRewards::earnedCall::SELECTOR);

        let position = reader(Arc::new(chain)).resolve_staking_info(PAIR, Some(USER)).await.unwrap();
        assert_eq!(position.pool_weight, U256::ZERO);
        assert_eq!(position.earned_amount, U256::ZERO);
        assert_eq!(position.staked_amount, U256::from(50u64));
        assert_eq!(position.liquidity_value, U256::from(777u64));
    }
}
