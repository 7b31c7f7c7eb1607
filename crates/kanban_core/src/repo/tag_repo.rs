//! Tag repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Keyed CRUD over `tags`, with `name` as the natural key.
//! - Find-or-create lookup shared with the work item repository.
//!
//! # Invariants
//! - Tag names are stored trimmed and are unique, compared case-sensitively.
//! - A tag with linked work items is only deleted when forced; its link
//!   rows go with it (`ON DELETE CASCADE`).

use crate::model::outcome::Outcome;
use crate::model::tag::{TagCreate, TagId, TagRecord, TagUpdate};
use crate::model::work_item::WorkItemId;
use crate::repo::error::RepoResult;
use crate::repo::schema_guard::ensure_connection_ready;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Repository interface for tag operations.
pub trait TagRepository {
    /// Inserts a tag. Returns `Conflict` plus the existing id when the name
    /// is already taken.
    fn create_tag(&mut self, tag: &TagCreate) -> RepoResult<(Outcome, Option<TagId>)>;
    /// Lists all tags ordered by id.
    fn read_tags(&self) -> RepoResult<Vec<TagRecord>>;
    /// Loads one tag by id.
    fn find_tag(&self, id: TagId) -> RepoResult<Option<TagRecord>>;
    /// Renames one tag.
    fn update_tag(&mut self, tag: &TagUpdate) -> RepoResult<Outcome>;
    /// Deletes one tag. Linked work items block deletion unless `force`.
    fn delete_tag(&mut self, id: TagId, force: bool) -> RepoResult<Outcome>;
    /// Ids of work items carrying this tag, ordered by id.
    fn tag_work_items(&self, id: TagId) -> RepoResult<Vec<WorkItemId>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&mut self, tag: &TagCreate) -> RepoResult<(Outcome, Option<TagId>)> {
        if let Err(err) = tag.validate() {
            debug!(
                "event=tag_create module=repo status=rejected outcome=bad_request reason={}",
                err.code()
            );
            return Ok((Outcome::BadRequest, None));
        }

        let name = tag.name.trim();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(existing_id) = find_tag_id_by_name(&tx, name)? {
            debug!(
                "event=tag_create module=repo status=rejected outcome=conflict tag_id={existing_id}"
            );
            return Ok((Outcome::Conflict, Some(existing_id)));
        }

        tx.execute("INSERT INTO tags (name) VALUES (?1);", [name])?;
        let tag_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=tag_create module=repo status=ok tag_id={tag_id}");
        Ok((Outcome::Created, Some(tag_id)))
    }

    fn read_tags(&self) -> RepoResult<Vec<TagRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(TagRecord {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(tags)
    }

    fn find_tag(&self, id: TagId) -> RepoResult<Option<TagRecord>> {
        let record = self
            .conn
            .query_row("SELECT id, name FROM tags WHERE id = ?1;", [id], |row| {
                Ok(TagRecord {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            })
            .optional()?;
        Ok(record)
    }

    fn update_tag(&mut self, tag: &TagUpdate) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !tag_exists(&tx, tag.id)? {
            return Ok(Outcome::NotFound);
        }
        if let Err(err) = tag.validate() {
            debug!(
                "event=tag_update module=repo status=rejected outcome=bad_request tag_id={} reason={}",
                tag.id,
                err.code()
            );
            return Ok(Outcome::BadRequest);
        }

        let name = tag.name.trim();
        if let Some(owner_id) = find_tag_id_by_name(&tx, name)? {
            if owner_id != tag.id {
                debug!(
                    "event=tag_update module=repo status=rejected outcome=conflict tag_id={} owner_id={owner_id}",
                    tag.id
                );
                return Ok(Outcome::Conflict);
            }
        }

        tx.execute(
            "UPDATE tags SET name = ?2 WHERE id = ?1;",
            params![tag.id, name],
        )?;
        tx.commit()?;
        Ok(Outcome::Updated)
    }

    fn delete_tag(&mut self, id: TagId, force: bool) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !tag_exists(&tx, id)? {
            return Ok(Outcome::NotFound);
        }

        let linked: i64 = tx.query_row(
            "SELECT COUNT(*) FROM work_item_tags WHERE tag_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if linked > 0 && !force {
            debug!(
                "event=tag_delete module=repo status=rejected outcome=conflict tag_id={id} linked_items={linked}"
            );
            return Ok(Outcome::Conflict);
        }

        tx.execute("DELETE FROM tags WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=tag_delete module=repo status=ok tag_id={id} linked_items={linked} force={force}"
        );
        Ok(Outcome::Deleted)
    }

    fn tag_work_items(&self, id: TagId) -> RepoResult<Vec<WorkItemId>> {
        let mut stmt = self.conn.prepare(
            "SELECT work_item_id
             FROM work_item_tags
             WHERE tag_id = ?1
             ORDER BY work_item_id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

/// Returns the id of the tag with exactly this stored name.
pub(crate) fn find_tag_id_by_name(conn: &Connection, name: &str) -> RepoResult<Option<TagId>> {
    let id = conn
        .query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

/// Resolves a tag name to its id, inserting the tag when it is unknown.
///
/// Callers run this inside their own transaction so that tags created for
/// a rejected write are rolled back with it.
pub(crate) fn find_or_create_tag(conn: &Connection, name: &str) -> RepoResult<TagId> {
    if let Some(id) = find_tag_id_by_name(conn, name)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO tags (name) VALUES (?1);", [name])?;
    let id = conn.last_insert_rowid();
    debug!("event=tag_autocreate module=repo status=ok tag_id={id}");
    Ok(id)
}

fn tag_exists(conn: &Connection, id: TagId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
