//! Gas Estimator - limit and price for directly signed submissions
//!
//! The limit comes from `eth_estimateGas` plus a safety buffer; a failed
//! estimate usually means the call would revert, so it is surfaced. The price
//! comes from `eth_gasPrice`, clamped to sane bounds, and falls back to a fixed
//! value when the RPC cannot answer.

use alloy_primitives::Address;
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use super::provider::ChainClient;
use crate::types::TxPayload;

// ============================================
// CONSTANTS
// ============================================

/// Extra gas on top of the node's estimate, in basis points
const GAS_LIMIT_BUFFER_BPS: u64 = 2_000;

/// Minimum sane gas price (0.01 gwei)
const MIN_GAS_PRICE_WEI: u128 = 10_000_000;

/// Maximum sane gas price (1000 gwei)
const MAX_GAS_PRICE_WEI: u128 = 1_000_000_000_000;

/// Used when the RPC gas price call fails (5 gwei)
const FALLBACK_GAS_PRICE_WEI: u128 = 5_000_000_000;

// ============================================
// GAS QUOTE
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub gas_limit: u64,
    /// Wei per gas
    pub gas_price: u128,
    pub source: GasSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSource {
    RpcProvider,
    Fallback,
}

impl std::fmt::Display for GasSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasSource::RpcProvider => write!(f, "RPC"),
            GasSource::Fallback => write!(f, "Fallback"),
        }
    }
}

impl GasQuote {
    /// Upper bound on the fee paid, in wei
    pub fn max_cost_wei(&self) -> u128 {
        self.gas_price.saturating_mul(self.gas_limit as u128)
    }

    pub fn gas_price_gwei(&self) -> f64 {
        self.gas_price as f64 / 1e9
    }
}

// ============================================
// GAS ESTIMATOR
// ============================================

pub struct GasEstimator {
    client: Arc<dyn ChainClient>,
}

impl GasEstimator {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Quote gas for sending `payload` from `from`
    pub async fn estimate(&self, from: Address, payload: &TxPayload) -> Result<GasQuote> {
        let estimated = self.client.estimate_gas(from, payload).await
            .map_err(|e| eyre!("gas estimation failed (call would likely revert): {}", e))?;
        let gas_limit = with_buffer(estimated);

        let (gas_price, source) = match self.client.gas_price().await {
            Ok(price) => (price.clamp(MIN_GAS_PRICE_WEI, MAX_GAS_PRICE_WEI), GasSource::RpcProvider),
            Err(e) => {
                warn!("RPC gas price fetch failed: {}", e);
                (FALLBACK_GAS_PRICE_WEI, GasSource::Fallback)
            }
        };

        let quote = GasQuote { gas_limit, gas_price, source };
        debug!(
            "⛽ Gas for {:?}: limit {} (estimate {}), {:.2} gwei from {}",
            payload.to, gas_limit, estimated, quote.gas_price_gwei(), source
        );

        Ok(quote)
    }
}

fn with_buffer(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_LIMIT_BUFFER_BPS) / 10_000)
}

// ============================================
// TESTS
// ============================================
