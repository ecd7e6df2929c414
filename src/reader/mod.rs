//! Read aggregation: registry, staking contracts and APR
//!
//! Every operation here fans its sub-queries out concurrently and joins them
//! with [`settle`], so a failed query degrades one field to its default and
//! never fails the whole read.

mod apr;
mod registry;
mod settle;
mod staking;

pub use apr::{annual_emission, pool_share, AprCalculator, VestingInputs, SECONDS_PER_YEAR};
pub use registry::{PoolRegistration, RegistryReader};
pub use settle::{settle, settle_if};
pub use staking::{StakingReader, StakingSnapshot};
