//! Persistence handle for owners, cats and achievements.
//!
//! [`CatRepository`] is the seam the representation layer writes through. Two
//! backends implement it:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, used by the server.
//! - [`InMemoryStore`]: lock-protected tables for development and tests.
//!
//! [`Storage`] wraps either one so application state stays a concrete type.
//! Multi-step writes go through a [`UnitOfWork`] obtained from
//! [`CatRepository::begin`]; dropping it without `commit` discards its writes.

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryStore, InMemoryTx, StoreStats};
pub use postgres::{PgStore, PgTx};
pub(crate) use postgres::quoted;

use crate::error::AppError;
use crate::models::{
    Achievement, AchievementCat, Cat, CatChanges, CatDetail, NewCat, NewOwner, Owner, OwnerDetail,
};
use async_trait::async_trait;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Limit defaults to 100 and is capped at 1000; offset defaults to 0.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Page {
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

#[async_trait]
pub trait CatRepository: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, AppError>;
    async fn owner_exists(&self, id: i64) -> Result<bool, AppError>;
    async fn get_owner(&self, id: i64) -> Result<Option<OwnerDetail>, AppError>;
    async fn list_owners(&self, page: Page) -> Result<Vec<OwnerDetail>, AppError>;

    /// Single insert outside any unit of work.
    async fn insert_cat(&self, cat: NewCat) -> Result<Cat, AppError>;
    async fn get_cat(&self, id: i64) -> Result<Option<CatDetail>, AppError>;
    async fn list_cats(&self, page: Page) -> Result<Vec<CatDetail>, AppError>;
    async fn update_cat(&self, id: i64, changes: CatChanges) -> Result<Option<Cat>, AppError>;
    /// Returns false when no cat had that id. Links go with the cat.
    async fn delete_cat(&self, id: i64) -> Result<bool, AppError>;

    async fn begin(&self) -> Result<StoreTx, AppError>;
}

/// Writes that must land together or not at all.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_cat(&mut self, cat: NewCat) -> Result<Cat, AppError>;

    /// Looks up an achievement by exact name, creating it when absent.
    /// The flag reports whether a new row was created.
    async fn get_or_create_achievement(&mut self, name: &str) -> Result<(Achievement, bool), AppError>;

    async fn link_achievement(&mut self, achievement_id: i64, cat_id: i64) -> Result<AchievementCat, AppError>;

    async fn commit(self) -> Result<(), AppError>;
}

/// Enum wrapper over the repository backends.
#[derive(Clone)]
pub enum Storage {
    Postgres(PgStore),
    InMemory(InMemoryStore),
}

impl Storage {
    pub fn new_in_memory() -> Self {
        Storage::InMemory(InMemoryStore::new())
    }

    pub fn new_postgres(pool: sqlx::PgPool, schema: impl Into<String>) -> Self {
        Storage::Postgres(PgStore::new(pool, schema))
    }
}

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            Storage::Postgres($repo) => $call,
            Storage::InMemory($repo) => $call,
        }
    };
}

#[async_trait]
impl CatRepository for Storage {
    async fn ping(&self) -> Result<(), AppError> {
        delegate!(self, repo => repo.ping().await)
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, AppError> {
        delegate!(self, repo => repo.create_owner(owner).await)
    }

    async fn owner_exists(&self, id: i64) -> Result<bool, AppError> {
        delegate!(self, repo => repo.owner_exists(id).await)
    }

    async fn get_owner(&self, id: i64) -> Result<Option<OwnerDetail>, AppError> {
        delegate!(self, repo => repo.get_owner(id).await)
    }

    async fn list_owners(&self, page: Page) -> Result<Vec<OwnerDetail>, AppError> {
        delegate!(self, repo => repo.list_owners(page).await)
    }

    async fn insert_cat(&self, cat: NewCat) -> Result<Cat, AppError> {
        delegate!(self, repo => repo.insert_cat(cat).await)
    }

    async fn get_cat(&self, id: i64) -> Result<Option<CatDetail>, AppError> {
        delegate!(self, repo => repo.get_cat(id).await)
    }

    async fn list_cats(&self, page: Page) -> Result<Vec<CatDetail>, AppError> {
        delegate!(self, repo => repo.list_cats(page).await)
    }

    async fn update_cat(&self, id: i64, changes: CatChanges) -> Result<Option<Cat>, AppError> {
        delegate!(self, repo => repo.update_cat(id, changes).await)
    }

    async fn delete_cat(&self, id: i64) -> Result<bool, AppError> {
        delegate!(self, repo => repo.delete_cat(id).await)
    }

    async fn begin(&self) -> Result<StoreTx, AppError> {
        delegate!(self, repo => repo.begin().await)
    }
}

/// Open unit of work on either backend.
pub enum StoreTx {
    Postgres(PgTx),
    InMemory(InMemoryTx),
}

#[async_trait]
impl UnitOfWork for StoreTx {
    async fn insert_cat(&mut self, cat: NewCat) -> Result<Cat, AppError> {
        match self {
            StoreTx::Postgres(tx) => tx.insert_cat(cat).await,
            StoreTx::InMemory(tx) => tx.insert_cat(cat).await,
        }
    }

    async fn get_or_create_achievement(&mut self, name: &str) -> Result<(Achievement, bool), AppError> {
        match self {
            StoreTx::Postgres(tx) => tx.get_or_create_achievement(name).await,
            StoreTx::InMemory(tx) => tx.get_or_create_achievement(name).await,
        }
    }

    async fn link_achievement(&mut self, achievement_id: i64, cat_id: i64) -> Result<AchievementCat, AppError> {
        match self {
            StoreTx::Postgres(tx) => tx.link_achievement(achievement_id, cat_id).await,
            StoreTx::InMemory(tx) => tx.link_achievement(achievement_id, cat_id).await,
        }
    }

    async fn commit(self) -> Result<(), AppError> {
        match self {
            StoreTx::Postgres(tx) => tx.commit().await,
            StoreTx::InMemory(tx) => tx.commit().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_caps() {
        assert_eq!(Page::default(), Page { limit: 100, offset: 0 });
        assert_eq!(Page::new(Some(5000), Some(20)), Page { limit: 1000, offset: 20 });
    }
}
