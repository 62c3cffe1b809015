//! Relay exchange: POSTs unsigned transactions to the relay service and
//! rebuilds the relayer-cosigned transactions it returns.
//!
//! Exactly one HTTP attempt per call. A client-side timer drops the in-flight
//! request once the configured timeout elapses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{Chain, ProjectId, ResolvedConfig};
use crate::error::{ErrorType, RelayError};
use crate::transaction::Relayable;

pub const TRANSACTION_PATH: &str = "relay/transaction";
pub const BATCH_PATH: &str = "relay/batch";

/// Single transaction or ordered batch. Serialized as a `tx` or `batch` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload<T> {
    Tx(T),
    Batch(Vec<T>),
}

impl<T> Payload<T> {
    pub fn path(&self) -> &'static str {
        match self {
            Payload::Tx(_) => TRANSACTION_PATH,
            Payload::Batch(_) => BATCH_PATH,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Tx(_) => 1,
            Payload::Batch(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request body: `{chain, project, tx | batch}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayEnvelope<T> {
    pub chain: Chain,
    pub project: ProjectId,
    #[serde(flatten)]
    pub payload: Payload<T>,
}

/// Response body. Only `tx` / `batch` is read; echoed request fields
/// (`chain`, `project`/`projectId` as number or string) and unknown keys are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayResponse<T> {
    #[serde(flatten)]
    pub payload: Payload<T>,
}

/// HTTP side of the relay protocol.
pub struct RelayExchange {
    http: reqwest::Client,
    api: String,
    chain: Chain,
    project: ProjectId,
    timeout: Duration,
}

impl RelayExchange {
    pub fn new(config: &ResolvedConfig) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            http,
            api: config.api.clone(),
            chain: config.chain,
            project: config.project.clone(),
            timeout: config.timeout,
        })
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    /// Relay one transaction via `POST {api}/relay/transaction`.
    pub async fn relay_transaction<T: Relayable>(&self, tx: &T) -> Result<T, crate::Error> {
        match self.exchange(Payload::Tx(tx)).await? {
            Payload::Tx(relayed) => Ok(relayed),
            Payload::Batch(_) => Err(RelayError::malformed("expected `tx`, got `batch`").into()),
        }
    }

    /// Relay an ordered batch via `POST {api}/relay/batch`. The i-th returned
    /// transaction corresponds to the i-th submitted one.
    pub async fn relay_batch<T: Relayable>(&self, txs: &[T]) -> Result<Vec<T>, crate::Error> {
        let relayed = match self.exchange(Payload::Batch(txs.iter().collect())).await? {
            Payload::Batch(relayed) => relayed,
            Payload::Tx(_) => {
                return Err(RelayError::malformed("expected `batch`, got `tx`").into())
            }
        };
        if relayed.len() != txs.len() {
            return Err(RelayError::new(
                ErrorType::Unknown,
                format!(
                    "batch size mismatch: sent {}, received {}",
                    txs.len(),
                    relayed.len()
                ),
            )
            .into());
        }
        Ok(relayed)
    }

    async fn exchange<T: Relayable>(&self, payload: Payload<&T>) -> Result<Payload<T>, crate::Error> {
        let path = payload.path();
        let request = RelayEnvelope {
            chain: self.chain,
            project: self.project.clone(),
            payload,
        };
        let response: RelayResponse<T> = self.post(path, &request).await?;
        Ok(response.payload)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, crate::Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if self.api.trim().is_empty() {
            return Err(crate::Error::Config("endpoint is not set".into()));
        }
        let url = join_url(&self.api, path);
        debug!(url = %url, project = %self.project, "Relay request");

        let attempt = async {
            let response = self
                .http
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(RelayError::from_transport)?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(RelayError::from_transport)?;
            Ok::<_, RelayError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| RelayError::timeout(self.timeout))??;

        debug!(url = %url, status = status.as_u16(), bytes = bytes.len(), "Relay response");

        if !status.is_success() {
            return Err(RelayError::from_status(status.as_u16(), &bytes).into());
        }
        serde_json::from_slice(&bytes).map_err(|e| RelayError::malformed(e).into())
    }
}

/// Join base URL and path, dropping leading slashes from the path.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use serde_json::json;

    #[test]
    fn test_join_url_strips_slashes() {
        assert_eq!(
            join_url("https://relay.vleap.ai", "/relay/transaction"),
            "https://relay.vleap.ai/relay/transaction"
        );
        assert_eq!(
            join_url("https://relay.vleap.ai/", "///relay/batch"),
            "https://relay.vleap.ai/relay/batch"
        );
    }

    #[test]
    fn test_single_envelope_shape() {
        let tx = Transaction::new("erd1alice", "erd1bob", 0, 50_000, "1");
        let envelope = RelayEnvelope {
            chain: Chain::Multiversx,
            project: ProjectId::Number(9),
            payload: Payload::Tx(&tx),
        };
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["chain"], "multiversx");
        assert_eq!(body["project"], 9);
        assert_eq!(body["tx"]["sender"], "erd1alice");
        assert!(body.get("batch").is_none());
    }

    #[test]
    fn test_batch_envelope_keeps_order() {
        let a = Transaction::new("erd1a", "erd1bob", 0, 50_000, "1");
        let b = Transaction::new("erd1b", "erd1bob", 0, 50_000, "1");
        let envelope = RelayEnvelope {
            chain: Chain::Multiversx,
            project: ProjectId::Name("acme".into()),
            payload: Payload::Batch(vec![&a, &b]),
        };
        assert_eq!(envelope.payload.path(), BATCH_PATH);
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["project"], "acme");
        assert_eq!(body["batch"][0]["sender"], "erd1a");
        assert_eq!(body["batch"][1]["sender"], "erd1b");
    }

    #[test]
    fn test_response_tolerates_extra_fields() {
        let body = json!({
            "chain": "multiversx",
            "projectId": 9,
            "requestId": "abc",
            "tx": {
                "nonce": 5,
                "value": "0",
                "receiver": "erd1bob",
                "sender": "erd1alice",
                "gasPrice": 1_000_000_000u64,
                "gasLimit": 50_000,
                "chainID": "1",
                "version": 2,
                "relayer": "erd1sponsor",
                "relayerSignature": "ff"
            }
        });
        let response: RelayResponse<Transaction> = serde_json::from_value(body).unwrap();
        match response.payload {
            Payload::Tx(tx) => assert!(tx.is_relayed()),
            Payload::Batch(_) => panic!("expected single tx"),
        }
    }

    #[test]
    fn test_response_accepts_string_project() {
        let body = json!({
            "chain": "multiversx",
            "project": "acme",
            "batch": []
        });
        let response: RelayResponse<Transaction> = serde_json::from_value(body).unwrap();
        assert_eq!(response.payload, Payload::Batch(vec![]));
    }

    #[tokio::test]
    async fn test_empty_endpoint_is_config_error() {
        let mut config = crate::RelayerConfig::new("9").resolve().unwrap();
        config.api = String::new();
        let exchange = RelayExchange::new(&config).unwrap();
        let tx = Transaction::new("erd1alice", "erd1bob", 0, 50_000, "1");
        let err = exchange.relay_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
