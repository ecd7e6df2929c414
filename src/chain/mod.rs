//! Chain access: RPC provider, gas estimation and contract interfaces

pub mod abi;
pub mod contracts;
mod gas;
mod provider;

pub use abi::WriteAbis;
pub use gas::{GasEstimator, GasQuote, GasSource};
pub use provider::{read, ChainClient, RpcClient};

#[cfg(test)]
pub(crate) use provider::mock;
