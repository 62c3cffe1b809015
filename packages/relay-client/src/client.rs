//! Relay client: balance gate followed, when needed, by the relay exchange.
//!
//! Failure policy is swallow-and-passthrough: `relay` / `relay_batch` log the
//! classified failure, notify the error handler and hand back the
//! nonce-assigned, unsigned input. The `*_or_fail` variants return the
//! classified [`Error::Relay`] instead. Config and provider errors are never
//! swallowed.

use tracing::{debug, info, warn};

use crate::config::{RelayerConfig, ResolvedConfig};
use crate::error::{Error, ErrorType, RelayError};
use crate::exchange::RelayExchange;
use crate::gate::BalanceGate;
use crate::provider::{ApiNetworkProvider, NetworkProvider};
use crate::transaction::Relayable;

type ErrorCallback = Box<dyn Fn(ErrorType, Option<&str>) + Send + Sync>;

/// Per-call callbacks.
#[derive(Default)]
pub struct Handlers {
    on_error: Option<ErrorCallback>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per failed relay attempt with the error type and message.
    pub fn on_error(mut self, f: impl Fn(ErrorType, Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn notify(&self, err: &RelayError) {
        if let Some(cb) = &self.on_error {
            cb(err.kind, err.message());
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Whether the relay exchange actually ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome<T> {
    /// Sender(s) can pay their own fees; returned with fresh nonces only.
    Unsponsored(T),
    /// Relayer-cosigned result from the relay service.
    Relayed(T),
}

impl<T> RelayOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            RelayOutcome::Unsponsored(v) | RelayOutcome::Relayed(v) => v,
        }
    }

    pub fn is_relayed(&self) -> bool {
        matches!(self, RelayOutcome::Relayed(_))
    }
}

/// Entry point. Stateless between calls; safe to share across tasks.
pub struct RelayClient<P = ApiNetworkProvider> {
    config: ResolvedConfig,
    provider: P,
    exchange: RelayExchange,
}

impl RelayClient<ApiNetworkProvider> {
    /// Resolve `config` and query the MultiversX API for account state.
    pub fn new(config: RelayerConfig) -> Result<Self, Error> {
        let resolved = config.resolve()?;
        let provider = ApiNetworkProvider::from_config(&resolved)?;
        Self::from_resolved(resolved, provider)
    }
}

impl<P: NetworkProvider> RelayClient<P> {
    pub fn with_provider(config: RelayerConfig, provider: P) -> Result<Self, Error> {
        Self::from_resolved(config.resolve()?, provider)
    }

    fn from_resolved(config: ResolvedConfig, provider: P) -> Result<Self, Error> {
        let exchange = RelayExchange::new(&config)?;
        info!(
            api = %config.api,
            env = %config.env,
            project = %config.project,
            force = config.force,
            "Relay client initialized"
        );
        Ok(Self {
            config,
            provider,
            exchange,
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn gate(&self) -> BalanceGate<'_, P> {
        BalanceGate::new(&self.provider, self.config.force)
    }

    /// Relay `tx` if its sender cannot pay fees. On relay failure, returns
    /// `tx` with its on-chain nonce, unsigned.
    pub async fn relay<T: Relayable>(&self, tx: T, handlers: &Handlers) -> Result<T, Error> {
        let gated = self.gate().check(tx).await?;
        if !gated.needs_relay {
            debug!("Sender funded, skipping relay");
            return Ok(gated.value);
        }
        let sent = self.send_single(&gated.value, handlers).await;
        match sent {
            Ok(relayed) => Ok(relayed),
            Err(Error::Relay(_)) => Ok(gated.value),
            Err(e) => Err(e),
        }
    }

    /// Like [`relay`](Self::relay) but fails instead of passing the input through.
    pub async fn relay_or_fail<T: Relayable>(&self, tx: T, handlers: &Handlers) -> Result<T, Error> {
        self.try_relay(tx, handlers).await.map(RelayOutcome::into_inner)
    }

    /// Relay `tx`, reporting whether the exchange ran.
    pub async fn try_relay<T: Relayable>(
        &self,
        tx: T,
        handlers: &Handlers,
    ) -> Result<RelayOutcome<T>, Error> {
        let gated = self.gate().check(tx).await?;
        if !gated.needs_relay {
            debug!("Sender funded, skipping relay");
            return Ok(RelayOutcome::Unsponsored(gated.value));
        }
        self.send_single(&gated.value, handlers)
            .await
            .map(RelayOutcome::Relayed)
    }

    /// Relay a batch in one request if any sender cannot pay fees. On relay
    /// failure, returns the nonce-assigned input batch.
    pub async fn relay_batch<T: Relayable>(
        &self,
        txs: Vec<T>,
        handlers: &Handlers,
    ) -> Result<Vec<T>, Error> {
        if txs.is_empty() {
            return Ok(txs);
        }
        let gated = self.gate().check_batch(txs).await?;
        if !gated.needs_relay {
            debug!(txs = gated.value.len(), "All senders funded, skipping relay");
            return Ok(gated.value);
        }
        let sent = self.send_batch(&gated.value, handlers).await;
        match sent {
            Ok(relayed) => Ok(relayed),
            Err(Error::Relay(_)) => Ok(gated.value),
            Err(e) => Err(e),
        }
    }

    /// Like [`relay_batch`](Self::relay_batch) but fails instead of passing the
    /// input through.
    pub async fn relay_batch_or_fail<T: Relayable>(
        &self,
        txs: Vec<T>,
        handlers: &Handlers,
    ) -> Result<Vec<T>, Error> {
        self.try_relay_batch(txs, handlers)
            .await
            .map(RelayOutcome::into_inner)
    }

    pub async fn try_relay_batch<T: Relayable>(
        &self,
        txs: Vec<T>,
        handlers: &Handlers,
    ) -> Result<RelayOutcome<Vec<T>>, Error> {
        if txs.is_empty() {
            return Ok(RelayOutcome::Unsponsored(txs));
        }
        let gated = self.gate().check_batch(txs).await?;
        if !gated.needs_relay {
            debug!(txs = gated.value.len(), "All senders funded, skipping relay");
            return Ok(RelayOutcome::Unsponsored(gated.value));
        }
        self.send_batch(&gated.value, handlers)
            .await
            .map(RelayOutcome::Relayed)
    }

    async fn send_single<T: Relayable>(&self, tx: &T, handlers: &Handlers) -> Result<T, Error> {
        info!(sender = tx.sender(), nonce = tx.nonce(), "Relaying transaction");
        self.exchange
            .relay_transaction(tx)
            .await
            .inspect_err(|e| report(e, handlers, "Relay failed"))
    }

    async fn send_batch<T: Relayable>(&self, txs: &[T], handlers: &Handlers) -> Result<Vec<T>, Error> {
        info!(txs = txs.len(), "Relaying batch");
        self.exchange
            .relay_batch(txs)
            .await
            .inspect_err(|e| report(e, handlers, "Relay batch failed"))
    }
}

fn report(err: &Error, handlers: &Handlers, context: &str) {
    if let Error::Relay(relay_err) = err {
        warn!(
            error_type = %relay_err.kind,
            message = relay_err.message().unwrap_or_default(),
            "{context}"
        );
        handlers.notify(relay_err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_outcome_into_inner() {
        assert_eq!(RelayOutcome::Relayed(3).into_inner(), 3);
        assert_eq!(RelayOutcome::Unsponsored(4).into_inner(), 4);
        assert!(RelayOutcome::Relayed(()).is_relayed());
        assert!(!RelayOutcome::Unsponsored(()).is_relayed());
    }

    #[test]
    fn test_handlers_notify_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handlers = Handlers::new().on_error(move |kind, message| {
            assert_eq!(kind, ErrorType::RateLimited);
            assert_eq!(message, Some("slow down"));
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let err = Error::Relay(RelayError::new(ErrorType::RateLimited, "slow down"));
        report(&err, &handlers, "test");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_config_errors_not_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handlers = Handlers::new().on_error(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        report(&Error::Config("endpoint is not set".into()), &handlers, "test");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_testnet_client_fails_construction() {
        let err = RelayClient::new(RelayerConfig::new("1").with_env(crate::Env::Testnet))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
