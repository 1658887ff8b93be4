//! Storage port for accounts and producers.
//!
//! The level engine and geo matching never touch storage; callers load
//! records through a [`Repository`] and pass them in. [`MemoryStore`] backs
//! tests and database-less deployments. The API crate provides a Postgres
//! adapter.

use std::collections::BTreeMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use crate::types::{Account, AccountId, Producer, ProducerId};

/// Errors surfaced by storage adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed (connection, query, I/O).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,

    /// A stored value could not be turned back into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// A storable record with a primary key.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Hash + Send + Sync + std::fmt::Display + 'static;

    fn id(&self) -> Self::Id;
}

impl Record for Account {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }
}

impl Record for Producer {
    type Id = ProducerId;

    fn id(&self) -> ProducerId {
        self.id
    }
}

/// Typed get/put/list access to one record kind.
pub trait Repository<R: Record>: Send + Sync {
    /// Fetch by primary key.
    fn get(&self, id: R::Id) -> impl Future<Output = Result<Option<R>, StoreError>> + Send;

    /// Insert or replace by primary key.
    fn put(&self, record: R) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All records in ascending key order.
    fn list(&self) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;
}

/// One in-memory table.
#[derive(Debug)]
pub struct MemoryTable<R: Record> {
    rows: Arc<RwLock<BTreeMap<R::Id, R>>>,
}

impl<R: Record> Clone for MemoryTable<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<R: Record> Default for MemoryTable<R> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<R: Record> MemoryTable<R> {
    fn get(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    fn put(&self, record: R) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        rows.insert(record.id(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<R>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.rows.write().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }
}

/// In-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: MemoryTable<Account>,
    producers: MemoryTable<Producer>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with the given records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] only if a lock is poisoned, which
    /// cannot happen on a freshly built store.
    pub fn seeded(
        accounts: impl IntoIterator<Item = Account>,
        producers: impl IntoIterator<Item = Producer>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for account in accounts {
            store.accounts.put(account)?;
        }
        for producer in producers {
            store.producers.put(producer)?;
        }
        Ok(store)
    }

    /// Remove every producer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the table lock is poisoned.
    pub fn clear_producers(&self) -> Result<(), StoreError> {
        self.producers.clear()
    }
}

impl Repository<Account> for MemoryStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.accounts.get(id)
    }

    async fn put(&self, record: Account) -> Result<(), StoreError> {
        self.accounts.put(record)
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        self.accounts.list()
    }
}

impl Repository<Producer> for MemoryStore {
    async fn get(&self, id: ProducerId) -> Result<Option<Producer>, StoreError> {
        self.producers.get(id)
    }

    async fn put(&self, record: Producer) -> Result<(), StoreError> {
        self.producers.put(record)
    }

    async fn list(&self) -> Result<Vec<Producer>, StoreError> {
        self.producers.list()
    }
}
