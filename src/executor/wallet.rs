//! Self-custodied wallet - signs typed data and sends its own transactions
//!
//! ⚠️  SECURITY WARNING:
//! - Never log or expose private keys
//! - Load keys from the environment, never hardcode them

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_primitives::{Address, Signature, TxKind};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use super::TransactionSigner;
use crate::chain::contracts::Permit;
use crate::chain::{ChainClient, GasEstimator};
use crate::error::DispatchError;
use crate::types::TxPayload;

/// A wallet the user controls directly
#[async_trait]
pub trait ExternalWallet: Send + Sync {
    fn address(&self) -> Address;

    /// EIP-712 signature over a permit; an error means the user declined
    async fn sign_permit(&self, domain: &Eip712Domain, permit: &Permit) -> Result<Signature, DispatchError>;

    /// Sign and broadcast, returning the transaction hash
    async fn send_transaction(&self, payload: TxPayload) -> Result<String, DispatchError>;
}

// ============================================
// LOCAL KEY WALLET
// ============================================

/// Private-key wallet that signs legacy transactions and broadcasts them raw
pub struct LocalWallet {
    signer: PrivateKeySigner,
    chain_id: u64,
    client: Arc<dyn ChainClient>,
    gas: GasEstimator,
}

impl LocalWallet {
    pub fn from_key(private_key: &str, chain_id: u64, client: Arc<dyn ChainClient>) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim().trim_start_matches("0x"))
            .map_err(|e| eyre!("Invalid wallet private key: {}", e))?;

        info!("✓ Wallet loaded: {:?}", signer.address());

        Ok(Self {
            signer,
            chain_id,
            gas: GasEstimator::new(client.clone()),
            client,
        })
    }

    /// Build and sign a legacy transaction at `nonce`, returning its RLP bytes
    async fn sign_legacy(&self, payload: TxPayload, nonce: u64, gas_limit: u64, gas_price: u128) -> Result<Vec<u8>> {
        let tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(payload.to),
            value: payload.value,
            input: payload.data,
        };

        let signature = self
            .signer
            .sign_hash(&tx.signature_hash())
            .await
            .map_err(|e| eyre!("Failed to sign transaction: {}", e))?;

        let signed = TxEnvelope::Legacy(tx.into_signed(signature));

        let mut encoded = Vec::new();
        alloy_rlp::Encodable::encode(&signed, &mut encoded);
        Ok(encoded)
    }
}

#[async_trait]
impl ExternalWallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_permit(&self, domain: &Eip712Domain, permit: &Permit) -> Result<Signature, DispatchError> {
        let hash = permit.eip712_signing_hash(domain);
        self.signer
            .sign_hash(&hash)
            .await
            .map_err(|e| DispatchError::SignatureDeclined(e.to_string()))
    }

    async fn send_transaction(&self, payload: TxPayload) -> Result<String, DispatchError> {
        let from = self.address();
        let to = payload.to;

        // Nonce is read per transaction; nothing is cached between sends
        let nonce = self.client.transaction_count(from).await?;
        let quote = self.gas.estimate(from, &payload).await?;

        let raw = self
            .sign_legacy(payload, nonce, quote.gas_limit, quote.gas_price)
            .await
            .map_err(|e| DispatchError::Wallet(e.to_string()))?;

        debug!(
            "Signed legacy transaction: to={:?}, nonce={}, gas_limit={}, gas_price={} ({})",
            to, nonce, quote.gas_limit, quote.gas_price, quote.source
        );

        let hash = self.client.send_raw_transaction(&raw).await?;
        Ok(hash.to_string())
    }
}

// ============================================
// EXTERNAL SIGNER
// ============================================

/// Hands payloads to the user's own wallet
pub struct ExternalSigner {
    wallet: Arc<dyn ExternalWallet>,
}

impl ExternalSigner {
    pub fn new(wallet: Arc<dyn ExternalWallet>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl TransactionSigner for ExternalSigner {
    fn name(&self) -> &'static str {
        "external wallet"
    }

    async fn submit(&self, payload: &TxPayload) -> Result<String, DispatchError> {
        let tx_hash = self.wallet.send_transaction(payload.clone()).await?;
        info!("🚀 Wallet {:?} sent transaction: {}", self.wallet.address(), tx_hash);
        Ok(tx_hash)
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use alloy_primitives::{address, keccak256, Bytes, U256};
    use alloy_rlp::Decodable;
    use std::sync::Mutex;

    // Well-known development key (DO NOT USE IN PRODUCTION)
    pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// Records what it is asked to sign and send
    pub struct RecordingWallet {
        pub owner: Address,
        pub permits: Mutex<Vec<Permit>>,
        pub sent: Mutex<Vec<TxPayload>>,
        pub decline: bool,
        /// Sends whose calldata starts with this selector fail
        pub fail_selector: Option<[u8; 4]>,
        /// Bumped on every send so permit nonces can be observed advancing
        pub chain: Option<(Arc<MockChain>, Address)>,
    }

    impl RecordingWallet {
        pub fn new(owner: Address) -> Self {
            Self {
                owner,
                permits: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                decline: false,
                fail_selector: None,
                chain: None,
            }
        }
    }

    #[async_trait]
    impl ExternalWallet for RecordingWallet {
        fn address(&self) -> Address {
            self.owner
        }

        async fn sign_permit(&self, _domain: &Eip712Domain, permit: &Permit) -> Result<Signature, DispatchError> {
            if self.decline {
                return Err(DispatchError::SignatureDeclined("user rejected".to_string()));
            }
            self.permits.lock().unwrap().push(permit.clone());
            Ok(Signature::new(U256::from(1u64), U256::from(2u64), true))
        }

        async fn send_transaction(&self, payload: TxPayload) -> Result<String, DispatchError> {
            let mut sent = self.sent.lock().unwrap();
            let rejected = matches!(self.fail_selector, Some(selector) if payload.data.starts_with(&selector));
            sent.push(payload);
            if rejected {
                return Err(DispatchError::Wallet("execution reverted".to_string()));
            }
            if let Some((chain, token)) = &self.chain {
                use crate::chain::contracts::IERC20Permit;
                use alloy_sol_types::{SolCall, SolValue};
                chain.respond(
                    *token,
                    IERC20Permit::noncesCall::SELECTOR,
                    U256::from(sent.len() as u64).abi_encode(),
                );
            }
            Ok(format!("0x{:064x}", sent.len()))
        }
    }

    fn payload() -> TxPayload {
        TxPayload {
            to: address!("0000000000000000000000000000000000000abc"),
            data: Bytes::from(vec![0xa6, 0x94, 0xfc, 0x3a]),
            value: U256::ZERO,
        }
    }

    #[tokio::test]
    async fn test_local_wallet_sends_signed_raw_tx() {
        let chain = Arc::new(MockChain::new());
        *chain.nonce.lock().unwrap() = 7;
        let wallet = LocalWallet::from_key(TEST_KEY, 1, chain.clone()).unwrap();

        let hash = wallet.send_transaction(payload()).await.unwrap();

        let raw = chain.raw_sent.lock().unwrap()[0].clone();
        assert_eq!(hash, keccak256(&raw).to_string());

        let envelope = TxEnvelope::decode(&mut raw.as_slice()).unwrap();
        let TxEnvelope::Legacy(signed) = envelope else {
            panic!("expected a legacy transaction");
        };
        assert_eq!(signed.tx().nonce, 7);
        assert_eq!(signed.tx().chain_id, Some(1));
        assert_eq!(signed.tx().to, TxKind::Call(payload().to));
        let recovered = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .unwrap();
        assert_eq!(recovered, wallet.address());
    }

    #[tokio::test]
    async fn test_local_wallet_reads_nonce_per_send() {
        let chain = Arc::new(MockChain::new());
        let wallet = LocalWallet::from_key(TEST_KEY, 1, chain.clone()).unwrap();

        wallet.send_transaction(payload()).await.unwrap();
        wallet.send_transaction(payload()).await.unwrap();

        let sent = chain.raw_sent.lock().unwrap();
        let nonces: Vec<u64> = sent
            .iter()
            .map(|raw| match TxEnvelope::decode(&mut raw.as_slice()).unwrap() {
                TxEnvelope::Legacy(signed) => signed.tx().nonce,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(nonces, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_local_wallet_stops_on_estimate_failure() {
        let chain = Arc::new(MockChain {
            gas_limit: None,
            ..MockChain::new()
        });
        let wallet = LocalWallet::from_key(TEST_KEY, 1, chain.clone()).unwrap();

        assert!(wallet.send_transaction(payload()).await.is_err());
        assert!(chain.raw_sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_wallet_permit_signature_recovers() {
        let chain = Arc::new(MockChain::new());
        let wallet = LocalWallet::from_key(TEST_KEY, 1, chain).unwrap();
        let domain = Eip712Domain::new(
            Some("LP Token".into()),
            Some("1".into()),
            Some(U256::from(1u64)),
            Some(address!("00000000000000000000000000000000000000aa")),
            None,
        );
        let permit = Permit {
            owner: wallet.address(),
            spender: address!("0000000000000000000000000000000000000abc"),
            value: U256::from(10u64),
            nonce: U256::ZERO,
            deadline: U256::from(2_000_000_000u64),
        };

        let signature = wallet.sign_permit(&domain, &permit).await.unwrap();
        let recovered = signature
            .recover_address_from_prehash(&permit.eip712_signing_hash(&domain))
            .unwrap();
        assert_eq!(recovered, wallet.address());
    }

    #[test]
    fn test_rejects_bad_key() {
        assert!(LocalWallet::from_key("0xnot-a-key", 1, Arc::new(MockChain::new())).is_err());
    }

    #[tokio::test]
    async fn test_external_signer_forwards_payload() {
        let wallet = Arc::new(RecordingWallet::new(address!("0000000000000000000000000000000000000001")));
        let signer = ExternalSigner::new(wallet.clone());

        let hash = signer.submit(&payload()).await.unwrap();
        assert!(hash.starts_with("0x"));
        assert_eq!(wallet.sent.lock().unwrap().as_slice(), &[payload()]);
    }
}
