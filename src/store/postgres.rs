//! PostgreSQL repository. Tables live in one schema (see [`crate::migration`]).

use super::{CatRepository, Page, StoreTx, UnitOfWork};
use crate::error::AppError;
use crate::models::{
    Achievement, AchievementCat, Cat, CatChanges, CatDetail, NewCat, NewOwner, Owner, OwnerDetail,
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashMap;

/// Quote identifier for PostgreSQL (safe: only from config).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Schema-qualified table names, quoted once at construction.
#[derive(Debug, Clone)]
struct TableNames {
    owners: String,
    cats: String,
    achievements: String,
    links: String,
}

impl TableNames {
    fn new(schema: &str) -> Self {
        let q = |table: &str| format!("{}.{}", quoted(schema), quoted(table));
        TableNames {
            owners: q("owners"),
            cats: q("cats"),
            achievements: q("achievements"),
            links: q("achievement_cats"),
        }
    }
}

const CAT_COLUMNS: &str = "id, name, color, birth_year, owner_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    tables: TableNames,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        PgStore {
            pool,
            tables: TableNames::new(&schema),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Batch-load achievements for the given cats, keyed by cat id, in link order.
    async fn achievements_for(&self, cat_ids: &[i64]) -> Result<HashMap<i64, Vec<Achievement>>, AppError> {
        if cat_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT l.cat_id, a.id, a.name FROM {} l JOIN {} a ON a.id = l.achievement_id \
             WHERE l.cat_id = ANY($1) ORDER BY l.id",
            self.tables.links, self.tables.achievements
        );
        tracing::debug!(sql = %sql, cats = cat_ids.len(), "query");
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(&sql)
            .bind(cat_ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_cat: HashMap<i64, Vec<Achievement>> = HashMap::new();
        for (cat_id, id, name) in rows {
            by_cat.entry(cat_id).or_default().push(Achievement { id, name });
        }
        Ok(by_cat)
    }

    async fn cats_for_owners(&self, owner_ids: &[i64]) -> Result<HashMap<i64, Vec<Cat>>, AppError> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = ANY($1) ORDER BY id",
            CAT_COLUMNS, self.tables.cats
        );
        tracing::debug!(sql = %sql, owners = owner_ids.len(), "query");
        let cats: Vec<Cat> = sqlx::query_as(&sql)
            .bind(owner_ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_owner: HashMap<i64, Vec<Cat>> = HashMap::new();
        for cat in cats {
            by_owner.entry(cat.owner_id).or_default().push(cat);
        }
        Ok(by_owner)
    }

    async fn with_achievements(&self, cats: Vec<Cat>) -> Result<Vec<CatDetail>, AppError> {
        let ids: Vec<i64> = cats.iter().map(|c| c.id).collect();
        let mut by_cat = self.achievements_for(&ids).await?;
        Ok(cats
            .into_iter()
            .map(|cat| CatDetail {
                achievements: by_cat.remove(&cat.id).unwrap_or_default(),
                cat,
            })
            .collect())
    }

    async fn with_cats(&self, owners: Vec<Owner>) -> Result<Vec<OwnerDetail>, AppError> {
        let ids: Vec<i64> = owners.iter().map(|o| o.id).collect();
        let mut by_owner = self.cats_for_owners(&ids).await?;
        Ok(owners
            .into_iter()
            .map(|owner| OwnerDetail {
                cats: by_owner.remove(&owner.id).unwrap_or_default(),
                owner,
            })
            .collect())
    }
}

async fn insert_cat_on(conn: &mut PgConnection, tables: &TableNames, cat: &NewCat) -> Result<Cat, AppError> {
    let sql = format!(
        "INSERT INTO {} (name, color, birth_year, owner_id) VALUES ($1, $2, $3, $4) RETURNING {}",
        tables.cats, CAT_COLUMNS
    );
    tracing::debug!(sql = %sql, "query");
    let row = sqlx::query_as::<_, Cat>(&sql)
        .bind(&cat.name)
        .bind(cat.color)
        .bind(cat.birth_year)
        .bind(cat.owner_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

#[async_trait]
impl CatRepository for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner, AppError> {
        let sql = format!(
            "INSERT INTO {} (first_name, last_name) VALUES ($1, $2) RETURNING id, first_name, last_name",
            self.tables.owners
        );
        let row = sqlx::query_as::<_, Owner>(&sql)
            .bind(&owner.first_name)
            .bind(&owner.last_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn owner_exists(&self, id: i64) -> Result<bool, AppError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", self.tables.owners);
        let exists: (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists.0)
    }

    async fn get_owner(&self, id: i64) -> Result<Option<OwnerDetail>, AppError> {
        let sql = format!(
            "SELECT id, first_name, last_name FROM {} WHERE id = $1",
            self.tables.owners
        );
        let owner: Option<Owner> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        match owner {
            Some(owner) => Ok(self.with_cats(vec![owner]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_owners(&self, page: Page) -> Result<Vec<OwnerDetail>, AppError> {
        let sql = format!(
            "SELECT id, first_name, last_name FROM {} ORDER BY id LIMIT $1 OFFSET $2",
            self.tables.owners
        );
        tracing::debug!(sql = %sql, limit = page.limit, offset = page.offset, "query");
        let owners: Vec<Owner> = sqlx::query_as(&sql)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await?;
        self.with_cats(owners).await
    }

    async fn insert_cat(&self, cat: NewCat) -> Result<Cat, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_cat_on(&mut conn, &self.tables, &cat).await
    }

    async fn get_cat(&self, id: i64) -> Result<Option<CatDetail>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", CAT_COLUMNS, self.tables.cats);
        tracing::debug!(sql = %sql, id, "query");
        let cat: Option<Cat> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        match cat {
            Some(cat) => Ok(self.with_achievements(vec![cat]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_cats(&self, page: Page) -> Result<Vec<CatDetail>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id LIMIT $1 OFFSET $2",
            CAT_COLUMNS, self.tables.cats
        );
        tracing::debug!(sql = %sql, limit = page.limit, offset = page.offset, "query");
        let cats: Vec<Cat> = sqlx::query_as(&sql)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await?;
        self.with_achievements(cats).await
    }

    async fn update_cat(&self, id: i64, changes: CatChanges) -> Result<Option<Cat>, AppError> {
        if changes.is_empty() {
            let sql = format!("SELECT {} FROM {} WHERE id = $1", CAT_COLUMNS, self.tables.cats);
            let cat: Option<Cat> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
            return Ok(cat);
        }
        // COALESCE keeps the stored value for every absent column.
        let sql = format!(
            "UPDATE {} SET name = COALESCE($2, name), color = COALESCE($3, color), \
             birth_year = COALESCE($4, birth_year), owner_id = COALESCE($5, owner_id) \
             WHERE id = $1 RETURNING {}",
            self.tables.cats, CAT_COLUMNS
        );
        tracing::debug!(sql = %sql, id, "query");
        let cat: Option<Cat> = sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.color)
            .bind(changes.birth_year)
            .bind(changes.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cat)
    }

    async fn delete_cat(&self, id: i64) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.tables.cats);
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<StoreTx, AppError> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx::Postgres(PgTx {
            tx,
            tables: self.tables.clone(),
        }))
    }
}

/// Open PostgreSQL transaction; rolled back by `sqlx` when dropped uncommitted.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    tables: TableNames,
}

#[async_trait]
impl UnitOfWork for PgTx {
    async fn insert_cat(&mut self, cat: NewCat) -> Result<Cat, AppError> {
        insert_cat_on(&mut self.tx, &self.tables, &cat).await
    }

    async fn get_or_create_achievement(&mut self, name: &str) -> Result<(Achievement, bool), AppError> {
        let select = format!("SELECT id, name FROM {} WHERE name = $1", self.tables.achievements);
        let existing: Option<Achievement> = sqlx::query_as(&select)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        if let Some(a) = existing {
            return Ok((a, false));
        }
        // A concurrent creator may win the unique index; fall back to its row.
        let insert = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id, name",
            self.tables.achievements
        );
        tracing::debug!(sql = %insert, name, "query (tx)");
        let created: Option<Achievement> = sqlx::query_as(&insert)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        match created {
            Some(a) => Ok((a, true)),
            None => {
                let a: Achievement = sqlx::query_as(&select)
                    .bind(name)
                    .fetch_one(&mut *self.tx)
                    .await?;
                Ok((a, false))
            }
        }
    }

    async fn link_achievement(&mut self, achievement_id: i64, cat_id: i64) -> Result<AchievementCat, AppError> {
        let sql = format!(
            "INSERT INTO {} (achievement_id, cat_id) VALUES ($1, $2) RETURNING id, achievement_id, cat_id",
            self.tables.links
        );
        tracing::debug!(sql = %sql, achievement_id, cat_id, "query (tx)");
        let link = sqlx::query_as::<_, AchievementCat>(&sql)
            .bind(achievement_id)
            .bind(cat_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(link)
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
