//! Provider Accessor - read-only access to the chain RPC endpoint
//!
//! `RpcClient` holds nothing but the endpoint URL: every call builds a fresh
//! HTTP provider, so there is no connection state to share or invalidate.

use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::trace;

use crate::types::TxPayload;

/// The chain operations the readers, the gas estimator and the local wallet need
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// `eth_estimateGas` for a payload sent from `from`
    async fn estimate_gas(&self, from: Address, payload: &TxPayload) -> Result<u64>;

    /// `eth_gasPrice` in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Pending nonce of `account`
    async fn transaction_count(&self, account: Address) -> Result<u64>;

    /// Broadcast an already signed transaction
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    async fn chain_id(&self) -> Result<u64>;
}

/// Call a typed view function and decode its return value
pub async fn read<C: SolCall + Send>(client: &dyn ChainClient, to: Address, call: C) -> Result<C::Return> {
    let output = client.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output).map_err(|e| eyre!("failed to decode {}: {}", C::SIGNATURE, e))
}

// ============================================
// HTTP JSON-RPC CLIENT
// ============================================

#[derive(Debug, Clone)]
pub struct RpcClient {
    rpc_url: String,
}

impl RpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn provider(&self) -> Result<impl Provider> {
        Ok(ProviderBuilder::new().connect_http(self.rpc_url.parse()?))
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let provider = self.provider()?;

        let tx = TransactionRequest::default()
            .to(to)
            .input(data.into());

        let result = provider.call(tx).await
            .map_err(|e| eyre!("eth_call to {:?} failed: {}", to, e))?;

        trace!("eth_call {:?} -> {} bytes", to, result.len());
        Ok(result)
    }

    async fn estimate_gas(&self, from: Address, payload: &TxPayload) -> Result<u64> {
        let provider = self.provider()?;

        let tx = TransactionRequest::default()
            .from(from)
            .to(payload.to)
            .value(payload.value)
            .input(payload.data.clone().into());

        provider.estimate_gas(tx).await
            .map_err(|e| eyre!("eth_estimateGas for {:?} failed: {}", payload.to, e))
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider()?.get_gas_price().await?)
    }

    async fn transaction_count(&self, account: Address) -> Result<u64> {
        Ok(self.provider()?.get_transaction_count(account).pending().await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let pending = self.provider()?.send_raw_transaction(raw).await
            .map_err(|e| eyre!("eth_sendRawTransaction failed: {}", e))?;
        Ok(*pending.tx_hash())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider()?.get_chain_id().await?)
    }
}

// ============================================
// TEST SUPPORT
// ============================================
