//! Staking service - the public read and write operations
//!
//! Built once from a [`SigningContext`] and the signing capabilities it
//! needs. Reads never fail (absent or defaulted results); writes return a
//! transaction hash or a [`DispatchError`].

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use eyre::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::{ChainClient, RpcClient, WriteAbis};
use crate::config::Config;
use crate::error::DispatchError;
use crate::executor::{
    CredentialProvider, LocalWallet, PermitSigner, RelayClient, RelaySession, SigningBackends,
    TransactionDispatcher,
};
use crate::reader::{AprCalculator, RegistryReader, StakingReader};
use crate::types::{AprBreakdown, ContractCall, SigningContext, StakingPosition, WhitelistedPool};

/// Contract addresses the service reads from
#[derive(Debug, Clone)]
pub struct ServiceAddresses {
    pub pool_manager: Address,
    pub reward_vesting: Address,
    /// Pairs `list_whitelisted_pools` checks, in this order
    pub candidate_pairs: Vec<Address>,
}

/// How `stake` gets the allowance to the staking contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StakeRoute {
    /// Permit when the backend can sign typed data, approval otherwise
    #[default]
    Auto,
    Permit,
    Approval,
}

/// Transactions sent for one stake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeReceipt {
    /// Present on the approval route only
    pub approval_tx: Option<String>,
    pub stake_tx: String,
}

pub struct StakingService {
    context: SigningContext,
    registry: RegistryReader,
    staking: StakingReader,
    apr: AprCalculator,
    dispatcher: TransactionDispatcher,
    permit: Option<PermitSigner>,
    account: Option<Address>,
    abis: WriteAbis,
    candidates: Vec<Address>,
}

impl StakingService {
    pub fn new(
        client: Arc<dyn ChainClient>,
        addresses: ServiceAddresses,
        context: SigningContext,
        backends: SigningBackends,
        abis: WriteAbis,
    ) -> Result<Self> {
        let registry = RegistryReader::new(client.clone(), addresses.pool_manager);
        let staking = StakingReader::new(client.clone(), registry.clone());
        let apr = AprCalculator::new(client.clone(), registry.clone(), addresses.reward_vesting);

        let wallet = backends.wallet.clone();
        let permit_validity = backends.permit_validity_secs;
        let dispatcher = TransactionDispatcher::for_context(&context, backends)?;

        // Typed-data signing exists only on the external backend
        let permit = match (&context, &wallet) {
            (SigningContext::External, Some(wallet)) => {
                let signer = PermitSigner::new(client, wallet.clone(), &abis.stake_with_permit);
                Some(match permit_validity {
                    Some(secs) => signer.with_validity(secs),
                    None => signer,
                })
            }
            _ => None,
        };

        Ok(Self {
            account: wallet.as_ref().map(|w| w.address()),
            context,
            registry,
            staking,
            apr,
            dispatcher,
            permit,
            abis,
            candidates: addresses.candidate_pairs,
        })
    }

    /// Wire the service from configuration, over HTTP RPC
    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        config.validate()?;

        let client: Arc<dyn ChainClient> = Arc::new(RpcClient::new(config.rpc_url.clone()));
        let context = config.signing_context();

        let mut backends = SigningBackends {
            permit_validity_secs: Some(config.permit_validity_secs),
            ..Default::default()
        };
        match &context {
            SigningContext::Custodial { .. } => {
                let session = RelaySession {
                    url: config.relay_url.clone(),
                    bearer_token: config.relay_bearer_token.clone().unwrap_or_default(),
                };
                backends.relay = Some(Arc::new(RelayClient::new(session)));
                backends.credentials = Some(credentials);
                backends.relay_gas_limit = Some(config.relay_gas_limit);
            }
            SigningContext::External => {
                let key = config.wallet_private_key.as_deref().unwrap_or_default();
                let wallet = LocalWallet::from_key(key, config.chain_id, client.clone())?;
                backends.wallet = Some(Arc::new(wallet));
            }
        }

        let addresses = ServiceAddresses {
            pool_manager: config.pool_manager()?,
            reward_vesting: config.reward_vesting()?,
            candidate_pairs: config.candidate_pair_addresses(),
        };

        Self::new(client, addresses, context, backends, config.write_abis()?)
    }

    pub fn context(&self) -> &SigningContext {
        &self.context
    }

    /// Address of the external wallet, if one is active
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn supports_permit(&self) -> bool {
        self.permit.is_some()
    }

    // ============================================
    // READS
    // ============================================

    /// Staking state of `pair`; `None` unless it is whitelisted with a staking contract
    pub async fn get_info(&self, pair: Address, user: Option<Address>) -> Option<StakingPosition> {
        self.staking.resolve_staking_info(pair, user).await
    }

    pub async fn get_apr(&self, pair: Address) -> AprBreakdown {
        self.apr.compute_apr(pair).await
    }

    pub async fn list_whitelisted_pools(&self) -> Vec<WhitelistedPool> {
        self.registry.list_whitelisted_pools(&self.candidates).await
    }

    // ============================================
    // WRITES
    // ============================================

    pub async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<String, DispatchError> {
        let args = vec![DynSolValue::Address(spender), DynSolValue::Uint(amount, 256)];
        self.dispatcher.dispatch(ContractCall::new(token, &self.abis.approve, args)).await
    }

    pub async fn stake(&self, staking: Address, amount: U256) -> Result<String, DispatchError> {
        let args = vec![DynSolValue::Uint(amount, 256)];
        self.dispatcher.dispatch(ContractCall::new(staking, &self.abis.stake, args)).await
    }

    pub async fn unstake(&self, staking: Address, amount: U256) -> Result<String, DispatchError> {
        let args = vec![DynSolValue::Uint(amount, 256)];
        self.dispatcher.dispatch(ContractCall::new(staking, &self.abis.withdraw, args)).await
    }

    /// Collect earned rewards
    pub async fn claim(&self, staking: Address) -> Result<String, DispatchError> {
        self.dispatcher
            .dispatch(ContractCall::new(staking, &self.abis.get_reward, vec![]))
            .await
    }

    /// Withdraw the whole stake and collect rewards
    pub async fn exit(&self, staking: Address) -> Result<String, DispatchError> {
        self.dispatcher
            .dispatch(ContractCall::new(staking, &self.abis.exit, vec![]))
            .await
    }

    /// Approve `staking` for `amount` of `token`, then stake. The stake is
    /// not attempted when the approval fails.
    pub async fn stake_with_approval(
        &self,
        token: Address,
        staking: Address,
        amount: U256,
    ) -> Result<StakeReceipt, DispatchError> {
        let approval_tx = self.approve(token, staking, amount).await.map_err(|e| {
            warn!("Approval failed, stake not sent: {}", e);
            e
        })?;
        let stake_tx = self.stake(staking, amount).await?;

        Ok(StakeReceipt {
            approval_tx: Some(approval_tx),
            stake_tx,
        })
    }

    /// Single-transaction stake authorized by a permit signature
    pub async fn stake_with_permit(
        &self,
        staking: Address,
        token: Address,
        amount: U256,
    ) -> Result<String, DispatchError> {
        let permit = self.permit.as_ref().ok_or(DispatchError::PermitUnsupported)?;
        permit.stake_with_permit(token, staking, amount).await
    }

    /// Staking contract of a whitelisted pair; both lookups must succeed
    pub async fn staking_contract_of(&self, pair: Address) -> Result<Address, DispatchError> {
        let (whitelisted, staking) =
            futures::join!(self.registry.is_whitelisted(pair), self.registry.staking_contract(pair));

        let (whitelisted, staking) = (whitelisted?, staking?);
        if !whitelisted || staking.is_zero() {
            return Err(DispatchError::PoolUnavailable(pair));
        }
        Ok(staking)
    }

    /// Stake LP tokens of `pair` into its staking contract
    pub async fn stake_pair(
        &self,
        pair: Address,
        amount: U256,
        route: StakeRoute,
    ) -> Result<StakeReceipt, DispatchError> {
        let staking = self.staking_contract_of(pair).await?;

        let use_permit = match route {
            StakeRoute::Auto => self.supports_permit(),
            StakeRoute::Permit => true,
            StakeRoute::Approval => false,
        };

        info!(
            "Staking {} of {:?} into {:?} via {}",
            amount,
            pair,
            staking,
            if use_permit { "permit" } else { "approval" }
        );

        if use_permit {
            let stake_tx = self.stake_with_permit(staking, pair, amount).await?;
            Ok(StakeReceipt {
                approval_tx: None,
                stake_tx,
            })
        } else {
            self.stake_with_approval(pair, staking, amount).await
        }
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contracts::{IERC20Permit, ILiquidityPoolManager, IStakingRewards};
    use crate::chain::mock::MockChain;
    use crate::executor::{RecordingRelay, RecordingWallet, StaticCredential};
    use alloy_primitives::address;
    use alloy_sol_types::{SolCall, SolValue};

    const MANAGER: Address = address!("00000000000000000000000000000000000000f1");
    const VESTING: Address = address!("00000000000000000000000000000000000000f2");
    const PAIR: Address = address!("00000000000000000000000000000000000000aa");
    const STAKING: Address = address!("0000000000000000000000000000000000000abc");
    const OWNER: Address = address!("0000000000000000000000000000000000000001");

    fn scripted_chain() -> Arc<MockChain> {
        let chain = MockChain::new();
        chain.respond(MANAGER, ILiquidityPoolManager::isPoolWhitelistedCall::SELECTOR, true.abi_encode());
        chain.respond(MANAGER, ILiquidityPoolManager::stakingContractsCall::SELECTOR, STAKING.abi_encode());
        chain.respond(PAIR, IERC20Permit::nameCall::SELECTOR, "Pangolin Liquidity".to_string().abi_encode());
        chain.respond(PAIR, IERC20Permit::noncesCall::SELECTOR, U256::ZERO.abi_encode());
        Arc::new(chain)
    }

    fn addresses() -> ServiceAddresses {
        ServiceAddresses {
            pool_manager: MANAGER,
            reward_vesting: VESTING,
            candidate_pairs: vec![PAIR],
        }
    }

    fn external(chain: Arc<MockChain>, wallet: Arc<RecordingWallet>) -> StakingService {
        let backends = SigningBackends {
            wallet: Some(wallet),
            ..Default::default()
        };
        StakingService::new(chain, addresses(), SigningContext::External, backends, WriteAbis::standard().unwrap())
            .unwrap()
    }

    fn custodial(chain: Arc<MockChain>, relay: Arc<RecordingRelay>, secret: Option<&str>) -> StakingService {
        let context = SigningContext::Custodial {
            wallet_id: Some("w-1".to_string()),
            chain_id: 43114,
        };
        let backends = SigningBackends {
            relay: Some(relay),
            credentials: Some(Arc::new(StaticCredential::new(secret.map(str::to_string)))),
            ..Default::default()
        };
        StakingService::new(chain, addresses(), context, backends, WriteAbis::standard().unwrap()).unwrap()
    }

    fn selector_of(payload: &crate::types::TxPayload) -> [u8; 4] {
        payload.data[..4].try_into().unwrap()
    }

    #[tokio::test]
    async fn test_failed_approve_blocks_stake() {
        let mut wallet = RecordingWallet::new(OWNER);
        wallet.fail_selector = Some(IERC20Permit::approveCall::SELECTOR);
        let wallet = Arc::new(wallet);
        let service = external(scripted_chain(), wallet.clone());

        let result = service.stake_with_approval(PAIR, STAKING, U256::from(10u64)).await;

        assert!(result.is_err());
        let sent = wallet.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(selector_of(&sent[0]), IERC20Permit::approveCall::SELECTOR);
    }

    #[tokio::test]
    async fn test_approval_route_orders_approve_then_stake() {
        let wallet = Arc::new(RecordingWallet::new(OWNER));
        let service = external(scripted_chain(), wallet.clone());

        let receipt = service.stake_pair(PAIR, U256::from(10u64), StakeRoute::Approval).await.unwrap();
        assert!(receipt.approval_tx.is_some());

        let sent = wallet.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, PAIR);
        assert_eq!(selector_of(&sent[0]), IERC20Permit::approveCall::SELECTOR);
        assert_eq!(sent[1].to, STAKING);
        assert_eq!(selector_of(&sent[1]), IStakingRewards::stakeCall::SELECTOR);

        let approve = IERC20Permit::approveCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(approve.spender, STAKING);
        assert_eq!(approve.amount, U256::from(10u64));
    }

    #[tokio::test]
    async fn test_auto_route_uses_permit_for_external() {
        let wallet = Arc::new(RecordingWallet::new(OWNER));
        let service = external(scripted_chain(), wallet.clone());
        assert!(service.supports_permit());
        assert_eq!(service.account(), Some(OWNER));

        let receipt = service.stake_pair(PAIR, U256::from(10u64), StakeRoute::Auto).await.unwrap();
        assert_eq!(receipt.approval_tx, None);

        let sent = wallet.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(selector_of(&sent[0]), IStakingRewards::stakeWithPermitCall::SELECTOR);
        assert_eq!(wallet.permits.lock().unwrap()[0].spender, STAKING);
    }

    #[tokio::test]
    async fn test_auto_route_uses_approval_for_custodial() {
        let relay = Arc::new(RecordingRelay::default());
        let service = custodial(scripted_chain(), relay.clone(), Some("1234"));
        assert!(!service.supports_permit());

        service.stake_pair(PAIR, U256::from(10u64), StakeRoute::Auto).await.unwrap();

        let requests = relay.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].to_address, format!("{:?}", PAIR));
        assert_eq!(requests[1].to_address, format!("{:?}", STAKING));
    }

    #[tokio::test]
    async fn test_custodial_permit_is_unsupported_and_silent() {
        let chain = scripted_chain();
        let relay = Arc::new(RecordingRelay::default());
        let service = custodial(chain.clone(), relay.clone(), Some("1234"));

        let err = service.stake_with_permit(STAKING, PAIR, U256::from(1u64)).await.unwrap_err();

        assert!(matches!(err, DispatchError::PermitUnsupported));
        assert_eq!(chain.call_count(), 0);
        assert!(relay.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custodial_cancel_sends_nothing() {
        let relay = Arc::new(RecordingRelay::default());
        let service = custodial(scripted_chain(), relay.clone(), None);

        let err = service.claim(STAKING).await.unwrap_err();
        assert!(matches!(err, DispatchError::CredentialCancelled));
        assert!(relay.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_thin_writes_target_staking_contract() {
        let wallet = Arc::new(RecordingWallet::new(OWNER));
        let service = external(scripted_chain(), wallet.clone());

        service.unstake(STAKING, U256::from(4u64)).await.unwrap();
        service.claim(STAKING).await.unwrap();
        service.exit(STAKING).await.unwrap();

        let sent = wallet.sent.lock().unwrap();
        let selectors: Vec<[u8; 4]> = sent.iter().map(selector_of).collect();
        assert_eq!(
            selectors,
            vec![
                IStakingRewards::withdrawCall::SELECTOR,
                IStakingRewards::getRewardCall::SELECTOR,
                IStakingRewards::exitCall::SELECTOR,
            ]
        );
        assert!(sent.iter().all(|p| p.to == STAKING));
    }

    #[tokio::test]
    async fn test_unlisted_pair_is_not_stakeable() {
        let chain = scripted_chain();
        chain.respond(MANAGER, ILiquidityPoolManager::isPoolWhitelistedCall::SELECTOR, false.abi_encode());
        let wallet = Arc::new(RecordingWallet::new(OWNER));
        let service = external(chain, wallet.clone());

        let err = service.stake_pair(PAIR, U256::from(1u64), StakeRoute::Auto).await.unwrap_err();
        assert!(matches!(err, DispatchError::PoolUnavailable(pair) if pair == PAIR));
        assert!(wallet.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_delegate() {
        let chain = scripted_chain();
        chain.respond(MANAGER, ILiquidityPoolManager::getPoolWeightCall::SELECTOR, U256::from(5u64).abi_encode());
        let service = external(chain, Arc::new(RecordingWallet::new(OWNER)));

        let pools = service.list_whitelisted_pools().await;
        assert_eq!(pools, vec![WhitelistedPool::new(PAIR, U256::from(5u64))]);

        // Vesting queries are unscripted, so the pool earns nothing
        assert!(service.get_apr(PAIR).await.is_zero());

        let info = service.get_info(PAIR, None).await.unwrap();
        assert_eq!(info.staking_contract_address, STAKING);
        assert_eq!(info.pool_weight, U256::from(5u64));
    }
}
