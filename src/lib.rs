//! LP staking client
//!
//! Reads staking state of whitelisted liquidity pools and sends stake,
//! unstake, claim and approve transactions through either a custodial
//! relay or a self-custodied wallet.

pub mod chain;
pub mod config;
pub mod error;
pub mod executor;
pub mod reader;
pub mod service;
pub mod types;

pub use config::{Config, SigningBackend};
pub use error::{DispatchError, MathError};
pub use service::{ServiceAddresses, StakeReceipt, StakeRoute, StakingService};
pub use types::{AprBreakdown, SigningContext, StakingPosition, WhitelistedPool};
