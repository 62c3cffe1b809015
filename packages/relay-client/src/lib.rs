//! # Relay Client
//!
//! Decides whether a MultiversX transaction needs a fee sponsor and, if so,
//! swaps it for a relayer-cosigned equivalent via the relay service.
//!
//! ## Flow
//! 1. Balance gate: fetch the sender's account, assign its nonce, compare the
//!    balance against 0.025 EGLD.
//! 2. Relay exchange (only below the threshold or with `force`):
//!    `POST {api}/relay/transaction` or `POST {api}/relay/batch`.
//!
//! ## Quick Start
//! ```no_run
//! # async fn run() -> Result<(), relay_client::Error> {
//! use relay_client::{Handlers, RelayClient, RelayerConfig, Transaction};
//!
//! let client = RelayClient::new(RelayerConfig::new("my-project"))?;
//! let tx = Transaction::new("erd1...", "erd1...", 0, 50_000, "1");
//! let handlers = Handlers::new().on_error(|kind, msg| eprintln!("{kind}: {msg:?}"));
//! let tx = client.relay(tx, &handlers).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod exchange;
pub mod gate;
pub mod provider;
pub mod transaction;

pub use client::{Handlers, RelayClient, RelayOutcome};
pub use config::{Chain, Env, ProjectId, RelayerConfig, ResolvedConfig};
pub use error::{Error, ErrorResponse, ErrorType, RelayError};
pub use provider::{AccountSnapshot, ApiNetworkProvider, NetworkProvider};
pub use transaction::{Relayable, Transaction};
