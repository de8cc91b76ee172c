//! Pool of recently seen transactions, used as the dependency supplier

use crate::evaluator::TransactionLookup;
use crate::transaction::calculate_tx_id;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Hash-indexed store of transactions that later transactions may spend from
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: HashMap<Hash, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction, returning its id. Re-inserting replaces the entry.
    pub fn insert(&mut self, tx: Transaction) -> Hash {
        let tx_id = calculate_tx_id(&tx);
        trace!(inputs = tx.inputs.len(), outputs = tx.outputs.len(), "pooling transaction");
        self.transactions.insert(tx_id, tx);
        tx_id
    }

    pub fn remove(&mut self, tx_id: &Hash) -> Option<Transaction> {
        self.transactions.remove(tx_id)
    }

    pub fn get(&self, tx_id: &Hash) -> Option<&Transaction> {
        self.transactions.get(tx_id)
    }

    pub fn contains(&self, tx_id: &Hash) -> bool {
        self.transactions.contains_key(tx_id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Pooled parents of `tx`, in input order, each listed once
    ///
    /// Inputs whose parent is not pooled are left out.
    pub fn dependencies_of(&self, tx: &Transaction) -> Vec<&Transaction> {
        let mut seen = HashSet::new();
        tx.inputs
            .iter()
            .filter(|input| seen.insert(input.prevout.hash))
            .filter_map(|input| self.transactions.get(&input.prevout.hash))
            .collect()
    }
}

impl<'a> TransactionLookup<'a> for &'a TransactionPool {
    fn lookup(&self, hash: &Hash) -> Option<&'a Transaction> {
        let pool: &'a TransactionPool = *self;
        pool.get(hash)
    }
}

impl FromIterator<Transaction> for TransactionPool {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut pool = TransactionPool::new();
        for tx in iter {
            pool.insert(tx);
        }
        pool
    }
}
