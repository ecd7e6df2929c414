//! Permit staking - one transaction instead of approve + stake
//!
//! The wallet signs an EIP-2612 permit for the staking contract and the
//! signature rides along in `stakeWithPermit`. No approval is ever sent on
//! this path, and the token nonce is read again for every permit.

use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::Function;
use alloy_primitives::{Address, Signature, B256, U256};
use alloy_sol_types::Eip712Domain;
use chrono::Utc;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

use super::wallet::ExternalWallet;
use crate::chain::contracts::{IERC20Permit, Permit};
use crate::chain::{read, ChainClient};
use crate::error::DispatchError;
use crate::types::{ContractCall, PermitMessage, PERMIT_VALIDITY_SECS};

/// EIP-712 domain version of the LP token
pub const PERMIT_DOMAIN_VERSION: &str = "1";

/// Signature in the `(v, r, s)` form `stakeWithPermit` takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl From<&Signature> for PermitSignature {
    fn from(signature: &Signature) -> Self {
        Self {
            v: 27 + signature.v() as u8,
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        }
    }
}

impl From<&PermitMessage> for Permit {
    fn from(message: &PermitMessage) -> Self {
        Permit {
            owner: message.owner,
            spender: message.spender,
            value: message.value,
            nonce: message.nonce,
            deadline: message.deadline,
        }
    }
}

/// Domain of `token`'s permit signatures
pub fn permit_domain(token_name: String, chain_id: u64, token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Owned(token_name)),
        Some(Cow::Borrowed(PERMIT_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

pub struct PermitSigner {
    client: Arc<dyn ChainClient>,
    wallet: Arc<dyn ExternalWallet>,
    stake_with_permit: Function,
    validity_secs: u64,
}

impl PermitSigner {
    pub fn new(client: Arc<dyn ChainClient>, wallet: Arc<dyn ExternalWallet>, stake_with_permit: &Function) -> Self {
        Self {
            client,
            wallet,
            stake_with_permit: stake_with_permit.clone(),
            validity_secs: PERMIT_VALIDITY_SECS,
        }
    }

    pub fn with_validity(mut self, validity_secs: u64) -> Self {
        self.validity_secs = validity_secs;
        self
    }

    /// Permit message for `amount` to `staking`, issued at `issued_at`
    pub async fn prepare(
        &self,
        token: Address,
        staking: Address,
        amount: U256,
        issued_at: u64,
    ) -> Result<(Eip712Domain, PermitMessage), DispatchError> {
        let owner = self.wallet.address();
        let client = &*self.client;

        let (nonce, name, chain_id) = futures::join!(
            read(client, token, IERC20Permit::noncesCall { owner }),
            read(client, token, IERC20Permit::nameCall {}),
            client.chain_id(),
        );

        let message = PermitMessage::expiring(owner, staking, amount, nonce?, issued_at, self.validity_secs);
        let domain = permit_domain(name?, chain_id?, token);
        Ok((domain, message))
    }

    /// Sign a fresh permit and send `stakeWithPermit`; returns the tx hash
    pub async fn stake_with_permit(
        &self,
        token: Address,
        staking: Address,
        amount: U256,
    ) -> Result<String, DispatchError> {
        let issued_at = Utc::now().timestamp().max(0) as u64;
        let (domain, message) = self.prepare(token, staking, amount, issued_at).await?;

        debug!(
            "Permit for {:?}: nonce={}, deadline={}",
            staking, message.nonce, message.deadline
        );

        let signature = self.wallet.sign_permit(&domain, &Permit::from(&message)).await?;
        let PermitSignature { v, r, s } = PermitSignature::from(&signature);

        let call = ContractCall::new(
            staking,
            &self.stake_with_permit,
            vec![
                DynSolValue::Uint(amount, 256),
                DynSolValue::Uint(message.deadline, 256),
                DynSolValue::Uint(U256::from(v), 8),
                DynSolValue::FixedBytes(r, 32),
                DynSolValue::FixedBytes(s, 32),
            ],
        );

        let tx_hash = self.wallet.send_transaction(call.encode()?).await?;
        info!("🚀 Staked {} with permit: {}", amount, tx_hash);
        Ok(tx_hash)
    }
}

// ============================================
// TESTS
// ============================================
