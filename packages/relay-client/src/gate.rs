//! Balance gate: decides whether a sender can pay its own fees.
//!
//! Every transaction that passes through the gate leaves with the nonce from
//! the sender's current on-chain state, whether or not it will be relayed.

use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::provider::{AccountSnapshot, NetworkProvider};
use crate::transaction::Relayable;

/// Balance (in EGLD) at or above which a sender pays its own fees: 0.025.
/// Stored as thousandths to keep the threshold in integer arithmetic.
pub const MAX_BALANCE_THOUSANDTHS: u128 = 25;
/// EGLD denomination.
pub const DECIMALS: u32 = 18;

/// Threshold in the smallest denomination (`0.025 × 10^18`).
pub const fn balance_threshold() -> u128 {
    MAX_BALANCE_THOUSANDTHS * 10u128.pow(DECIMALS - 3)
}

pub fn has_enough_balance(account: &AccountSnapshot) -> bool {
    account.balance >= balance_threshold()
}

/// Gate result: nonce-assigned payload plus the routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gated<T> {
    pub value: T,
    pub needs_relay: bool,
}

pub struct BalanceGate<'a, P: ?Sized> {
    provider: &'a P,
    force: bool,
}

impl<'a, P: NetworkProvider + ?Sized> BalanceGate<'a, P> {
    pub fn new(provider: &'a P, force: bool) -> Self {
        Self { provider, force }
    }

    pub async fn check<T: Relayable>(&self, tx: T) -> Result<Gated<T>, crate::Error> {
        let account = self.provider.account(tx.sender()).await?;
        let funded = has_enough_balance(&account);
        debug!(
            sender = tx.sender(),
            nonce = account.nonce,
            balance = %account.balance,
            funded,
            "Account snapshot"
        );
        Ok(Gated {
            value: tx.with_nonce(account.nonce),
            needs_relay: self.force || !funded,
        })
    }

    /// One concurrent lookup per distinct sender; relays if any sender is short.
    pub async fn check_batch<T: Relayable>(
        &self,
        txs: Vec<T>,
    ) -> Result<Gated<Vec<T>>, crate::Error> {
        let senders: Vec<String> = {
            let mut seen = HashSet::new();
            txs.iter()
                .map(|tx| tx.sender())
                .filter(|s| seen.insert(*s))
                .map(str::to_string)
                .collect()
        };

        let accounts = try_join_all(senders.iter().map(|s| self.provider.account(s))).await?;
        let snapshots: HashMap<String, AccountSnapshot> =
            senders.into_iter().zip(accounts).collect();

        let all_funded = snapshots.values().all(has_enough_balance);
        debug!(
            txs = txs.len(),
            senders = snapshots.len(),
            all_funded,
            "Batch account snapshots"
        );

        let value = txs
            .into_iter()
            .map(|tx| {
                let nonce = snapshots
                    .get(tx.sender())
                    .map(|a| a.nonce)
                    .unwrap_or_default();
                tx.with_nonce(nonce)
            })
            .collect();

        Ok(Gated {
            value,
            needs_relay: self.force || !all_funded,
        })
    }
}
