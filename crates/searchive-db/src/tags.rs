//! Tag catalog implementation.
//!
//! Tag names are unique at the storage layer (`ux_tags_name`). The bulk
//! read-then-insert below only saves round trips; concurrent creators of the
//! same name are reconciled by `ON CONFLICT (name) DO NOTHING` followed by a
//! re-read, so both converge on the single committed row.
//!
//! New names are always inserted in sorted order so two transactions creating
//! overlapping sets take the unique-index locks in the same sequence.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgConnection, Pool, Postgres, Row};
use tracing::{debug, warn};

use searchive_core::{normalize_keyword, normalize_keywords, Error, Result, Tag, TagCatalog};

/// Longest tag name the schema accepts.
pub const MAX_TAG_NAME_CHARS: usize = 100;

/// Attempts for a tag attach that loses a deadlock.
const ATTACH_ATTEMPTS: u32 = 2;

/// PostgreSQL implementation of TagCatalog.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// One transaction: resolve `names` (already prepared) and link them.
    async fn attach_once(&self, document_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let tags = get_or_create_on(&mut *tx, names).await?;
        let tag_ids: Vec<i64> = tags.iter().map(|t| t.tag_id).collect();

        let linked = sqlx::query(
            "INSERT INTO document_tags (document_id, tag_id)
             SELECT $1, UNNEST($2::bigint[])
             ON CONFLICT (document_id, tag_id) DO NOTHING",
        )
        .bind(document_id)
        .bind(&tag_ids)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tags",
            op = "attach",
            document_id,
            tag_count = tags.len(),
            linked = linked.rows_affected(),
            "Tags attached to document"
        );
        Ok(tags)
    }
}

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        tag_id: row.get("tag_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

/// Normalize, dedupe, and drop names the schema cannot hold.
fn prepare_names(names: &[String]) -> Vec<String> {
    normalize_keywords(names)
        .into_iter()
        .filter(|name| {
            let ok = name.chars().count() <= MAX_TAG_NAME_CHARS;
            if !ok {
                warn!(
                    subsystem = "db",
                    component = "tags",
                    tag_len = name.chars().count(),
                    "Skipping tag name longer than {} chars",
                    MAX_TAG_NAME_CHARS
                );
            }
            ok
        })
        .collect()
}

/// Names not yet in `existing`, sorted into lock order.
fn missing_in_lock_order(names: &[String], existing: &HashMap<String, Tag>) -> Vec<String> {
    let mut missing: Vec<String> = names
        .iter()
        .filter(|n| !existing.contains_key(*n))
        .cloned()
        .collect();
    missing.sort_unstable();
    missing
}

/// Postgres SQLSTATE 40P01.
fn is_deadlock(e: &Error) -> bool {
    match e {
        Error::Database(sqlx::Error::Database(db)) => db.code().as_deref() == Some("40P01"),
        _ => false,
    }
}

async fn select_by_names(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT tag_id, name, created_at FROM tags WHERE name = ANY($1)")
        .bind(names)
        .fetch_all(conn)
        .await
        .map_err(Error::Database)?;
    Ok(rows.iter().map(tag_from_row).collect())
}

/// Resolve `names` (already prepared) on one connection, creating the missing ones.
async fn get_or_create_on(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Tag>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_name: HashMap<String, Tag> = select_by_names(&mut *conn, names)
        .await?
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect();

    let missing = missing_in_lock_order(names, &by_name);

    if !missing.is_empty() {
        let inserted = sqlx::query(
            "INSERT INTO tags (name)
             SELECT name FROM UNNEST($1::varchar[]) WITH ORDINALITY AS m(name, ord)
             ORDER BY ord
             ON CONFLICT (name) DO NOTHING
             RETURNING tag_id, name, created_at",
        )
        .bind(&missing)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::Database)?;

        let created = inserted.len();
        for row in &inserted {
            let tag = tag_from_row(row);
            by_name.insert(tag.name.clone(), tag);
        }

        // Names another transaction created between our read and insert.
        if created < missing.len() {
            let raced: Vec<String> = missing
                .into_iter()
                .filter(|n| !by_name.contains_key(n))
                .collect();
            for tag in select_by_names(&mut *conn, &raced).await? {
                by_name.insert(tag.name.clone(), tag);
            }
            debug!(
                subsystem = "db",
                component = "tags",
                op = "bulk_get_or_create",
                raced = raced.len(),
                "Resolved tags created concurrently"
            );
        }

        debug!(
            subsystem = "db",
            component = "tags",
            op = "bulk_get_or_create",
            created,
            "Created new tags"
        );
    }

    Ok(names.iter().filter_map(|n| by_name.remove(n)).collect())
}

#[async_trait]
impl TagCatalog for PgTagRepository {
    async fn bulk_get_or_create(&self, names: &[String]) -> Result<Vec<Tag>> {
        let names = prepare_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        get_or_create_on(&mut *conn, &names).await
    }

    async fn attach_tags_to_document(
        &self,
        document_id: i64,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        let names = prepare_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 1;
        loop {
            match self.attach_once(document_id, &names).await {
                Err(e) if attempt < ATTACH_ATTEMPTS && is_deadlock(&e) => {
                    warn!(
                        subsystem = "db",
                        component = "tags",
                        op = "attach",
                        document_id,
                        attempt,
                        "Tag attach deadlocked, retrying"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn get_tags_by_document_id(&self, document_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.tag_id, t.name, t.created_at
            FROM tags t
            JOIN document_tags dt ON dt.tag_id = t.tag_id
            WHERE dt.document_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let Some(name) = normalize_keyword(name) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT tag_id, name, created_at FROM tags WHERE name = $1")
            .bind(&name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(tag_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_names_normalizes_and_dedupes() {
        let names = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Tokio".to_string(),
        ];
        assert_eq!(prepare_names(&names), vec!["rust", "tokio"]);
    }

    #[test]
    fn test_prepare_names_drops_overlong() {
        let long = "가".repeat(MAX_TAG_NAME_CHARS + 1);
        let exact = "a".repeat(MAX_TAG_NAME_CHARS);
        let names = vec![long, exact.clone()];
        assert_eq!(prepare_names(&names), vec![exact]);
    }

    #[test]
    fn test_missing_names_sorted_regardless_of_caller_order() {
        let forward: Vec<String> = ["delta", "alpha", "charlie", "bravo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reverse: Vec<String> = forward.iter().rev().cloned().collect();
        let mut existing = HashMap::new();
        existing.insert(
            "charlie".to_string(),
            Tag {
                tag_id: 7,
                name: "charlie".to_string(),
                created_at: chrono::Utc::now(),
            },
        );

        let a = missing_in_lock_order(&forward, &existing);
        let b = missing_in_lock_order(&reverse, &existing);
        assert_eq!(a, vec!["alpha", "bravo", "delta"]);
        assert_eq!(a, b);
    }
}
