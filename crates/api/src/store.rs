//! Storage backend selection.

use pressly_core::store::{MemoryStore, Record, Repository, StoreError};

use crate::db::PgStore;

/// The store handlers talk to: in-memory when no database is configured.
#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    /// Backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if it cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Postgres(pg) => pg.ping().await,
        }
    }

    /// Remove every producer.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the delete fails.
    pub async fn clear_producers(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(memory) => memory.clear_producers(),
            Self::Postgres(pg) => pg.clear_producers().await.map(|_| ()),
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<PgStore> for Store {
    fn from(store: PgStore) -> Self {
        Self::Postgres(store)
    }
}

impl<R> Repository<R> for Store
where
    R: Record,
    MemoryStore: Repository<R>,
    PgStore: Repository<R>,
{
    async fn get(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        match self {
            Self::Memory(memory) => Repository::<R>::get(memory, id).await,
            Self::Postgres(pg) => Repository::<R>::get(pg, id).await,
        }
    }

    async fn put(&self, record: R) -> Result<(), StoreError> {
        match self {
            Self::Memory(memory) => Repository::<R>::put(memory, record).await,
            Self::Postgres(pg) => Repository::<R>::put(pg, record).await,
        }
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        match self {
            Self::Memory(memory) => Repository::<R>::list(memory).await,
            Self::Postgres(pg) => Repository::<R>::list(pg).await,
        }
    }
}
