//! In-memory repository. Tables live behind one `tokio::sync::Mutex`; a unit of
//! work holds the lock for its whole lifetime and restores a snapshot unless it
//! commits.

use super::{CatRepository, Page, StoreTx, UnitOfWork};
use crate::error::AppError;
use crate::models::{
    Achievement, AchievementCat, Cat, CatChanges, CatDetail, NewCat, NewOwner, Owner, OwnerDetail,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct Tables {
    owners: BTreeMap<i64, Owner>,
    cats: BTreeMap<i64, Cat>,
    achievements: BTreeMap<i64, Achievement>,
    links: BTreeMap<i64, AchievementCat>,
    next_owner_id: i64,
    next_cat_id: i64,
    next_achievement_id: i64,
    next_link_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn insert_cat(&mut self, new: NewCat) -> Result<Cat, AppError> {
        if !self.owners.contains_key(&new.owner_id) {
            return Err(AppError::Conflict(format!("owner {} does not exist", new.owner_id)));
        }
        let id = next_id(&mut self.next_cat_id);
        let cat = Cat {
            id,
            name: new.name,
            color: new.color,
            birth_year: new.birth_year,
            owner_id: new.owner_id,
        };
        self.cats.insert(id, cat.clone());
        Ok(cat)
    }

    fn cat_detail(&self, cat: &Cat) -> CatDetail {
        let achievements = self
            .links
            .values()
            .filter(|l| l.cat_id == cat.id)
            .filter_map(|l| self.achievements.get(&l.achievement_id).cloned())
            .collect();
        CatDetail {
            cat: cat.clone(),
            achievements,
        }
    }

    fn owner_detail(&self, owner: &Owner) -> OwnerDetail {
        let cats = self
            .cats
            .values()
            .filter(|c| c.owner_id == owner.id)
            .cloned()
            .collect();
        OwnerDetail {
            owner: owner.clone(),
            cats,
        }
    }
}

/// Call counters exposed for tests and diagnostics.
#[derive(Debug, Default)]
pub struct StoreStats {
    achievement_lookups: AtomicUsize,
    links_created: AtomicUsize,
    units_begun: AtomicUsize,
}

impl StoreStats {
    pub fn achievement_lookups(&self) -> usize {
        self.achievement_lookups.load(Ordering::SeqCst)
    }

    pub fn links_created(&self) -> usize {
        self.links_created.load(Ordering::SeqCst)
    }

    pub fn units_begun(&self) -> usize {
        self.units_begun.load(Ordering::SeqCst)
    }
}

/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    stats: Arc<StoreStats>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub async fn achievement_count(&self) -> usize {
        self.tables.lock().await.achievements.len()
    }

    pub async fn link_count(&self) -> usize {
        self.tables.lock().await.links.len()
    }

    pub async fn achievements_named(&self, name: &str) -> Vec<Achievement> {
        self.tables
            .lock()
            .await
            .achievements
            .values()
            .filter(|a| a.name == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatRepository for InMemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, AppError> {
        let mut tables = self.tables.lock().await;
        let id = next_id(&mut tables.next_owner_id);
        let owner = Owner {
            id,
            first_name: owner.first_name,
            last_name: owner.last_name,
        };
        tables.owners.insert(id, owner.clone());
        Ok(owner)
    }

    async fn owner_exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.owners.contains_key(&id))
    }

    async fn get_owner(&self, id: i64) -> Result<Option<OwnerDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.owners.get(&id).map(|o| tables.owner_detail(o)))
    }

    async fn list_owners(&self, page: Page) -> Result<Vec<OwnerDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .owners
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|o| tables.owner_detail(o))
            .collect())
    }

    async fn insert_cat(&self, cat: NewCat) -> Result<Cat, AppError> {
        self.tables.lock().await.insert_cat(cat)
    }

    async fn get_cat(&self, id: i64) -> Result<Option<CatDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.cats.get(&id).map(|c| tables.cat_detail(c)))
    }

    async fn list_cats(&self, page: Page) -> Result<Vec<CatDetail>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cats
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|c| tables.cat_detail(c))
            .collect())
    }

    async fn update_cat(&self, id: i64, changes: CatChanges) -> Result<Option<Cat>, AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(owner_id) = changes.owner_id {
            if !tables.owners.contains_key(&owner_id) {
                return Err(AppError::Conflict(format!("owner {} does not exist", owner_id)));
            }
        }
        Ok(tables.cats.get_mut(&id).map(|cat| {
            changes.apply(cat);
            cat.clone()
        }))
    }

    async fn delete_cat(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.cats.remove(&id).is_none() {
            return Ok(false);
        }
        tables.links.retain(|_, l| l.cat_id != id);
        Ok(true)
    }

    async fn begin(&self) -> Result<StoreTx, AppError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let snapshot = guard.clone();
        self.stats.units_begun.fetch_add(1, Ordering::SeqCst);
        Ok(StoreTx::InMemory(InMemoryTx {
            guard,
            snapshot: Some(snapshot),
            stats: Arc::clone(&self.stats),
        }))
    }
}

pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    snapshot: Option<Tables>,
    stats: Arc<StoreStats>,
}

#[async_trait]
impl UnitOfWork for InMemoryTx {
    async fn insert_cat(&mut self, cat: NewCat) -> Result<Cat, AppError> {
        self.guard.insert_cat(cat)
    }

    async fn get_or_create_achievement(&mut self, name: &str) -> Result<(Achievement, bool), AppError> {
        self.stats.achievement_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(existing) = self.guard.achievements.values().find(|a| a.name == name) {
            return Ok((existing.clone(), false));
        }
        let id = next_id(&mut self.guard.next_achievement_id);
        let achievement = Achievement {
            id,
            name: name.to_string(),
        };
        self.guard.achievements.insert(id, achievement.clone());
        Ok((achievement, true))
    }

    async fn link_achievement(&mut self, achievement_id: i64, cat_id: i64) -> Result<AchievementCat, AppError> {
        if !self.guard.achievements.contains_key(&achievement_id) || !self.guard.cats.contains_key(&cat_id) {
            return Err(AppError::Conflict(format!(
                "cannot link achievement {} to cat {}",
                achievement_id, cat_id
            )));
        }
        let id = next_id(&mut self.guard.next_link_id);
        let link = AchievementCat {
            id,
            achievement_id,
            cat_id,
        };
        self.guard.links.insert(id, link.clone());
        self.stats.links_created.fetch_add(1, Ordering::SeqCst);
        Ok(link)
    }

    async fn commit(mut self) -> Result<(), AppError> {
        self.snapshot = None;
        Ok(())
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            tracing::debug!("rolling back in-memory unit of work");
            *self.guard = snapshot;
        }
    }
}
