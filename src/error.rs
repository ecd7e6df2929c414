//! Error taxonomy for the write path and checked on-chain arithmetic.
//!
//! Read operations never surface these: they absorb failures into defaults
//! or an absent result. Everything that changes state returns a
//! [`DispatchError`] to its immediate caller.

use thiserror::Error;

/// Failures of a state-changing call (approve, stake, unstake, claim, permit)
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no active custodial wallet - sign in before sending transactions")]
    NoActiveWallet,

    #[error("credential prompt cancelled - transaction not sent")]
    CredentialCancelled,

    /// Relay error message, propagated verbatim
    #[error("{0}")]
    Relay(String),

    #[error("relay transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode {function}: {reason}")]
    Encoding { function: String, reason: String },

    #[error("pair {0:?} is not whitelisted or has no staking contract")]
    PoolUnavailable(alloy_primitives::Address),

    #[error("permit signing requires a self-custodied wallet")]
    PermitUnsupported,

    #[error("typed-data signature declined: {0}")]
    SignatureDeclined(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] eyre::Report),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl DispatchError {
    /// True for failures that happened before anything was signed or sent
    pub fn is_authentication(&self) -> bool {
        matches!(self, DispatchError::NoActiveWallet | DispatchError::CredentialCancelled)
    }
}

/// Checked 256-bit arithmetic failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_message_is_verbatim() {
        let err = DispatchError::Relay("insufficient funds for gas".to_string());
        assert_eq!(err.to_string(), "insufficient funds for gas");
    }

    #[test]
    fn test_authentication_classification() {
        assert!(DispatchError::NoActiveWallet.is_authentication());
        assert!(DispatchError::CredentialCancelled.is_authentication());
        assert!(!DispatchError::PermitUnsupported.is_authentication());
    }
}
