//! Relayable transactions.
//!
//! The relay service speaks the MultiversX "plain object" transaction format.
//! A transaction's serde representation IS that plain object, so serializing
//! is `toPlainObject` and deserializing is reconstruction.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A transaction the relay client can route through the sponsor service.
pub trait Relayable: Serialize + DeserializeOwned + Send + Sync {
    /// Account that originates the transaction and pays fees when not relayed.
    fn sender(&self) -> &str;

    fn nonce(&self) -> u64;

    /// Return the same transaction carrying `nonce`.
    fn with_nonce(self, nonce: u64) -> Self;
}

/// MultiversX transaction in plain-object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    /// Amount in the smallest denomination, as a decimal string.
    pub value: String,
    pub receiver: String,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_username: Option<String>,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Base64-encoded payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer_signature: Option<String>,
}

/// Minimum gas price on MultiversX networks.
pub const MIN_GAS_PRICE: u64 = 1_000_000_000;
/// Transaction version that supports relayed (v3) transactions.
pub const RELAYED_TX_VERSION: u32 = 2;

impl Transaction {
    /// Unsigned transfer of `value` from `sender` to `receiver`. Nonce is
    /// left at zero; the balance gate assigns it from chain state.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        value: u128,
        gas_limit: u64,
        chain_id: impl Into<String>,
    ) -> Self {
        Self {
            nonce: 0,
            value: value.to_string(),
            receiver: receiver.into(),
            sender: sender.into(),
            sender_username: None,
            receiver_username: None,
            gas_price: MIN_GAS_PRICE,
            gas_limit,
            data: None,
            chain_id: chain_id.into(),
            version: RELAYED_TX_VERSION,
            options: None,
            guardian: None,
            signature: None,
            guardian_signature: None,
            relayer: None,
            relayer_signature: None,
        }
    }

    pub fn with_data(mut self, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        self.data = (!data.is_empty()).then(|| B64.encode(data));
        self
    }

    /// Decoded payload. Empty when absent.
    pub fn data_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match &self.data {
            Some(encoded) => B64.decode(encoded),
            None => Ok(Vec::new()),
        }
    }

    /// True once the relay service has attached itself as relayer and co-signed.
    pub fn is_relayed(&self) -> bool {
        self.relayer.is_some() && self.relayer_signature.is_some()
    }
}

impl Relayable for Transaction {
    fn sender(&self) -> &str {
        &self.sender
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }
}
