//! Network provider: on-chain account lookups.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ResolvedConfig;

/// Account state at query time. Never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub nonce: u64,
    /// Balance in the smallest denomination.
    #[serde(default, deserialize_with = "balance_from_string")]
    pub balance: u128,
}

impl AccountSnapshot {
    /// An account that does not exist on chain yet.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The API returns balances as decimal strings; plain numbers are accepted too.
fn balance_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid balance {s:?}: {e}"))),
        Raw::Num(n) => Ok(n as u128),
    }
}

/// Source of account snapshots for the balance gate.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn account(&self, address: &str) -> Result<AccountSnapshot, crate::Error>;
}

#[async_trait]
impl<P: NetworkProvider + ?Sized> NetworkProvider for Arc<P> {
    async fn account(&self, address: &str) -> Result<AccountSnapshot, crate::Error> {
        (**self).account(address).await
    }
}

/// Account lookups are bounded independently of the relay timeout.
const ACCOUNT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ACCOUNT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider backed by the MultiversX REST API (`GET /accounts/{address}`).
pub struct ApiNetworkProvider {
    http: reqwest::Client,
    base_url: String,
}

impl ApiNetworkProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(ACCOUNT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self, crate::Error> {
        Self::new(&config.network_api, ACCOUNT_REQUEST_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl NetworkProvider for ApiNetworkProvider {
    async fn account(&self, address: &str) -> Result<AccountSnapshot, crate::Error> {
        let url = format!("{}/accounts/{}", self.base_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| crate::Error::Provider(format!("account query failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(address, "Account not found on chain, treating as empty");
            return Ok(AccountSnapshot::empty());
        }
        if !status.is_success() {
            return Err(crate::Error::Provider(format!(
                "account query HTTP error: {status}"
            )));
        }

        response
            .json::<AccountSnapshot>()
            .await
            .map_err(|e| crate::Error::Provider(format!("account parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_api_json() {
        let snapshot: AccountSnapshot = serde_json::from_str(
            r#"{"address":"erd1alice","nonce":12,"balance":"30000000000000000","shard":1}"#,
        )
        .unwrap();
        assert_eq!(snapshot.nonce, 12);
        assert_eq!(snapshot.balance, 30_000_000_000_000_000);
    }

    #[test]
    fn test_balance_beyond_u64() {
        let snapshot: AccountSnapshot =
            serde_json::from_str(r#"{"nonce":1,"balance":"100000000000000000000"}"#).unwrap();
        assert_eq!(snapshot.balance, 100_000_000_000_000_000_000);
    }

    #[test]
    fn test_invalid_balance_rejected() {
        assert!(serde_json::from_str::<AccountSnapshot>(r#"{"nonce":1,"balance":"lots"}"#).is_err());
    }

    #[test]
    fn test_from_config_uses_network_api() {
        let config = crate::RelayerConfig::new(9u64)
            .with_network_api("https://api.example.com/")
            .resolve()
            .unwrap();
        let provider = ApiNetworkProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_empty_snapshot() {
        let empty = AccountSnapshot::empty();
        assert_eq!(empty.nonce, 0);
        assert_eq!(empty.balance, 0);
    }
}
