//! Transaction dispatch
//!
//! Every state-changing call goes through [`TransactionDispatcher`]: the
//! call is ABI-encoded once, then handed to whichever signing backend the
//! [`SigningContext`] selects.
//!
//! ⚠️  WARNING: This module moves real funds!

mod credentials;
mod permit;
mod relay;
mod wallet;

pub use credentials::{CredentialPrompt, CredentialProvider, StaticCredential, TerminalCredential};
pub use permit::{permit_domain, PermitSignature, PermitSigner, PERMIT_DOMAIN_VERSION};
pub use relay::{
    parse_relay_response, CustodialSigner, Relay, RelayClient, RelayErrorBody, RelayRequest, RelayResponse,
    RelaySession, DEFAULT_RELAY_GAS_LIMIT,
};
pub use wallet::{ExternalSigner, ExternalWallet, LocalWallet};

#[cfg(test)]
pub(crate) use relay::tests::RecordingRelay;
#[cfg(test)]
pub(crate) use wallet::tests::RecordingWallet;

use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::Function;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::DispatchError;
use crate::types::{ContractCall, SigningContext, TxPayload};

/// A signing backend: takes an encoded payload, returns the transaction hash
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails when the backend cannot send at all, before anything is encoded
    fn ready(&self) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn submit(&self, payload: &TxPayload) -> Result<String, DispatchError>;
}

/// Capabilities a dispatcher can be assembled from
#[derive(Default)]
pub struct SigningBackends {
    pub relay: Option<Arc<dyn Relay>>,
    pub credentials: Option<Arc<dyn CredentialProvider>>,
    pub wallet: Option<Arc<dyn ExternalWallet>>,
    pub relay_gas_limit: Option<u64>,
    pub permit_validity_secs: Option<u64>,
}

#[derive(Clone)]
pub struct TransactionDispatcher {
    signer: Arc<dyn TransactionSigner>,
}

impl TransactionDispatcher {
    pub fn new(signer: Arc<dyn TransactionSigner>) -> Self {
        Self { signer }
    }

    /// Pick the backend for `context` out of `backends`
    pub fn for_context(context: &SigningContext, backends: SigningBackends) -> Result<Self> {
        let signer: Arc<dyn TransactionSigner> = match context {
            SigningContext::Custodial { wallet_id, chain_id } => {
                let relay = backends
                    .relay
                    .ok_or_else(|| eyre!("Custodial signing needs a relay session"))?;
                let credentials = backends
                    .credentials
                    .ok_or_else(|| eyre!("Custodial signing needs a credential prompt"))?;

                let gas_limit = backends.relay_gas_limit.unwrap_or(DEFAULT_RELAY_GAS_LIMIT);
                Arc::new(CustodialSigner::new(wallet_id.clone(), *chain_id, relay, credentials).with_gas_limit(gas_limit))
            }
            SigningContext::External => {
                let wallet = backends
                    .wallet
                    .ok_or_else(|| eyre!("External signing needs a wallet"))?;
                Arc::new(ExternalSigner::new(wallet))
            }
        };

        Ok(Self::new(signer))
    }

    pub fn backend(&self) -> &'static str {
        self.signer.name()
    }

    /// Encode `call` and submit it through the active backend
    pub async fn dispatch(&self, call: ContractCall) -> Result<String, DispatchError> {
        self.signer.ready()?;
        let payload = call.encode()?;

        debug!(
            "Dispatching {} to {:?} via {} ({} bytes)",
            call.function.name,
            call.target,
            self.signer.name(),
            payload.data.len()
        );

        self.signer.submit(&payload).await.map_err(|e| {
            error!("{} failed: {}", call.function.name, e);
            e
        })
    }

    /// Build the call from its parts and dispatch it
    pub async fn dispatch_call(
        &self,
        target: Address,
        function: &Function,
        args: Vec<DynSolValue>,
        value: U256,
    ) -> Result<String, DispatchError> {
        self.dispatch(ContractCall::new(target, function, args).with_value(value))
            .await
    }
}

// ============================================
// TESTS
// ============================================
