//! Custodial Relay - remote signing service for custodial wallets
//!
//! The relay holds the wallet key. Each submission carries the wallet id,
//! the user's secret for that one transaction and the encoded call; the
//! relay signs, broadcasts and answers with the transaction hash or an
//! error message that is passed through verbatim.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::credentials::{CredentialPrompt, CredentialProvider};
use super::TransactionSigner;
use crate::error::DispatchError;
use crate::types::TxPayload;

/// Fixed gas ceiling for relay-submitted transactions
pub const DEFAULT_RELAY_GAS_LIMIT: u64 = 3_000_000;

// ============================================
// WIRE TYPES
// ============================================

/// Relay endpoint and its bearer token
#[derive(Debug, Clone)]
pub struct RelaySession {
    pub url: String,
    pub bearer_token: String,
}

/// Body of one relay submission
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub wallet_id: String,
    pub to_address: String,
    /// Wei, decimal string
    pub value: String,
    /// `0x`-prefixed calldata
    pub data: String,
    pub secret: String,
    pub chain_id: u64,
    pub gas_limit: u64,
}

impl RelayRequest {
    pub fn new(wallet_id: &str, secret: String, payload: &TxPayload, chain_id: u64, gas_limit: u64) -> Self {
        Self {
            wallet_id: wallet_id.to_string(),
            to_address: format!("{:?}", payload.to),
            value: payload.value.to_string(),
            data: format!("0x{}", hex::encode(&payload.data)),
            secret,
            chain_id,
            gas_limit,
        }
    }
}

/// Loggable view of a request, without the secret
struct RelayRequestSummary<'a>(&'a RelayRequest);

impl std::fmt::Debug for RelayRequestSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wallet={} to={} value={} data_len={} chain={} gas={}",
            self.0.wallet_id,
            self.0.to_address,
            self.0.value,
            self.0.data.len(),
            self.0.chain_id,
            self.0.gas_limit
        )
    }
}

/// Relay answer; success carries a hash, failure an error message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    #[serde(alias = "txHash", alias = "hash")]
    pub transaction_hash: Option<String>,
    pub error: Option<RelayErrorBody>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelayErrorBody {
    Detailed { message: String },
    Text(String),
}

impl RelayErrorBody {
    pub fn message(&self) -> &str {
        match self {
            RelayErrorBody::Detailed { message } => message,
            RelayErrorBody::Text(text) => text,
        }
    }
}

/// Map a relay HTTP answer to the transaction hash or the relay's own failure
pub fn parse_relay_response(status: StatusCode, body: &str) -> Result<String, DispatchError> {
    let parsed: RelayResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if status.is_success() => {
            return Err(DispatchError::Relay(format!("unreadable relay response: {}", body)));
        }
        Err(_) if body.trim().is_empty() => return Err(DispatchError::Relay(status.to_string())),
        Err(_) => return Err(DispatchError::Relay(body.to_string())),
    };

    if let Some(error) = parsed.error {
        return Err(DispatchError::Relay(error.message().to_string()));
    }
    if let Some(message) = parsed.message {
        if !status.is_success() || parsed.transaction_hash.is_none() {
            return Err(DispatchError::Relay(message));
        }
    }

    match parsed.transaction_hash {
        Some(hash) if status.is_success() => Ok(hash),
        _ if !status.is_success() => Err(DispatchError::Relay(format!("{}: {}", status, body.trim()))),
        _ => Err(DispatchError::Relay("relay returned no transaction hash".to_string())),
    }
}

// ============================================
// RELAY CLIENT
// ============================================

/// Something that forwards a signed-by-relay submission
#[async_trait]
pub trait Relay: Send + Sync {
    async fn submit(&self, request: &RelayRequest) -> Result<String, DispatchError>;
}

pub struct RelayClient {
    http_client: Client,
    session: RelaySession,
}

impl RelayClient {
    pub fn new(session: RelaySession) -> Self {
        Self {
            http_client: Client::new(),
            session,
        }
    }
}

#[async_trait]
impl Relay for RelayClient {
    async fn submit(&self, request: &RelayRequest) -> Result<String, DispatchError> {
        debug!("Relay submission to {}: {:?}", self.session.url, RelayRequestSummary(request));

        let response = self
            .http_client
            .post(&self.session.url)
            .bearer_auth(&self.session.bearer_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Relay response status: {}", status);

        parse_relay_response(status, &body)
    }
}

// ============================================
// CUSTODIAL SIGNER
// ============================================

/// Signs through the relay on behalf of the signed-in custodial wallet
pub struct CustodialSigner {
    wallet_id: Option<String>,
    chain_id: u64,
    gas_limit: u64,
    relay: Arc<dyn Relay>,
    credentials: Arc<dyn CredentialProvider>,
}

impl CustodialSigner {
    pub fn new(
        wallet_id: Option<String>,
        chain_id: u64,
        relay: Arc<dyn Relay>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            wallet_id,
            chain_id,
            gas_limit: DEFAULT_RELAY_GAS_LIMIT,
            relay,
            credentials,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

#[async_trait]
impl TransactionSigner for CustodialSigner {
    fn name(&self) -> &'static str {
        "custodial relay"
    }

    fn ready(&self) -> Result<(), DispatchError> {
        self.wallet_id.as_ref().map(|_| ()).ok_or(DispatchError::NoActiveWallet)
    }

    async fn submit(&self, payload: &TxPayload) -> Result<String, DispatchError> {
        let wallet_id = self
            .wallet_id
            .as_deref()
            .ok_or(DispatchError::NoActiveWallet)?;

        let prompt = CredentialPrompt {
            wallet_id: wallet_id.to_string(),
            action: format!("send a transaction to {:?}", payload.to),
        };
        // The prompt blocks on user input; keep it off the async workers
        let credentials = self.credentials.clone();
        let answer = tokio::task::spawn_blocking(move || credentials.request_secret(&prompt)).await;
        let secret = match answer {
            Ok(Some(secret)) => secret,
            Ok(None) => {
                warn!("Credential prompt cancelled, nothing sent");
                return Err(DispatchError::CredentialCancelled);
            }
            Err(e) => {
                warn!("Credential prompt aborted, nothing sent: {}", e);
                return Err(DispatchError::CredentialCancelled);
            }
        };

        let request = RelayRequest::new(wallet_id, secret, payload, self.chain_id, self.gas_limit);
        let tx_hash = self.relay.submit(&request).await?;

        info!("🚀 Relay accepted transaction: {}", tx_hash);
        Ok(tx_hash)
    }
}

// ============================================
// TESTS
// ============================================
