//! In-memory deposit ledger
//!
//! Balance bookkeeping standing in for the chain's bank module.

use crate::domain::errors::{BridgeError, BridgeResult};
use crate::domain::value_objects::{ChainAccount, EthAddress};
use crate::ports::outbound::DepositLedger;
use primitive_types::U256;
use std::collections::BTreeMap;

/// Balances per `(account, token)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryDepositLedger {
    balances: BTreeMap<(ChainAccount, EthAddress), U256>,
}

impl InMemoryDepositLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance.
    pub fn balance(&self, account: &ChainAccount, token: &EthAddress) -> U256 {
        self.balances
            .get(&(account.clone(), *token))
            .copied()
            .unwrap_or_default()
    }

    fn add(&mut self, account: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()> {
        let entry = self
            .balances
            .entry((account.clone(), *token))
            .or_insert_with(U256::zero);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| BridgeError::Ledger(format!("balance overflow for {}", account)))?;
        Ok(())
    }
}

impl DepositLedger for InMemoryDepositLedger {
    fn credit(&mut self, receiver: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()> {
        self.add(receiver, token, amount)
    }

    fn debit(&mut self, sender: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()> {
        let balance = self.balance(sender, token);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            BridgeError::Ledger(format!(
                "insufficient balance for {}: have {}, need {}",
                sender, balance, amount
            ))
        })?;
        self.balances.insert((sender.clone(), *token), remaining);
        Ok(())
    }

    fn refund(&mut self, sender: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()> {
        self.add(sender, token, amount)
    }
}
