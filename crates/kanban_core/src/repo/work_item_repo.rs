//! Work item repository: lifecycle state machine and relationship sync.
//!
//! # Responsibility
//! - Resolve the assignee and tags of a work item across all collections.
//! - Enforce the state-gated deletion policy.
//! - Keep work item, user and tag memberships consistent on every write.
//!
//! # Invariants
//! - Tag membership lives only in `work_item_tags` and assignment only in
//!   `work_items.assigned_to`, so both directions of each relationship read
//!   from the same rows.
//! - Updates detach the old tag links before attaching the new set, inside
//!   the same transaction as the row overwrite.
//! - `state_updated_at` is written on create, on every update and when an
//!   active item is tombstoned.
//! - A rejected write leaves no trace, including tags it would have created.

use crate::model::outcome::Outcome;
use crate::model::tag::TagId;
use crate::model::user::UserId;
use crate::model::work_item::{
    DeletionPolicy, WorkItemCreate, WorkItemDetails, WorkItemId, WorkItemState, WorkItemSummary,
    WorkItemUpdate,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema_guard::ensure_connection_ready;
use crate::repo::tag_repo::find_or_create_tag;
use crate::repo::user_repo::user_exists;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::time::{SystemTime, UNIX_EPOCH};

const WORK_ITEM_SUMMARY_SQL: &str = "SELECT
    w.id,
    w.title,
    w.state,
    u.name AS assignee_name
FROM work_items w
LEFT JOIN users u ON u.id = w.assigned_to";

/// Filter applied by `WorkItemRepository::list_work_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItemFilter {
    /// Every stored work item, tombstones included.
    All,
    /// Exact state match.
    State(WorkItemState),
    /// Items carrying a tag with exactly this name.
    Tag(String),
    /// Items assigned to this user.
    AssignedTo(UserId),
}

/// Repository interface for work item operations.
pub trait WorkItemRepository {
    /// Creates a work item in state `New`.
    ///
    /// Returns `BadRequest` when the assignee is missing or unknown, or the
    /// payload is invalid. Unknown tags are created.
    fn create_work_item(
        &mut self,
        item: &WorkItemCreate,
    ) -> RepoResult<(Outcome, Option<WorkItemId>)>;
    /// Loads the detail projection of one work item.
    fn find_work_item(&self, id: WorkItemId) -> RepoResult<Option<WorkItemDetails>>;
    /// Lists summary projections matching `filter`, ordered by id.
    fn list_work_items(&self, filter: &WorkItemFilter) -> RepoResult<Vec<WorkItemSummary>>;
    /// Overwrites every field of a work item and re-links user and tags.
    fn update_work_item(&mut self, item: &WorkItemUpdate) -> RepoResult<Outcome>;
    /// Applies the deletion policy of the item's current state.
    fn delete_work_item(&mut self, id: WorkItemId) -> RepoResult<Outcome>;

    fn read_work_items(&self) -> RepoResult<Vec<WorkItemSummary>> {
        self.list_work_items(&WorkItemFilter::All)
    }

    fn read_work_items_by_state(&self, state: WorkItemState) -> RepoResult<Vec<WorkItemSummary>> {
        self.list_work_items(&WorkItemFilter::State(state))
    }

    fn read_work_items_by_tag(&self, tag: &str) -> RepoResult<Vec<WorkItemSummary>> {
        self.list_work_items(&WorkItemFilter::Tag(tag.to_string()))
    }

    fn read_work_items_by_user(&self, user_id: UserId) -> RepoResult<Vec<WorkItemSummary>> {
        self.list_work_items(&WorkItemFilter::AssignedTo(user_id))
    }

    fn read_removed_work_items(&self) -> RepoResult<Vec<WorkItemSummary>> {
        self.list_work_items(&WorkItemFilter::State(WorkItemState::Removed))
    }
}

/// SQLite-backed work item repository.
pub struct SqliteWorkItemRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteWorkItemRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl WorkItemRepository for SqliteWorkItemRepository<'_> {
    fn create_work_item(
        &mut self,
        item: &WorkItemCreate,
    ) -> RepoResult<(Outcome, Option<WorkItemId>)> {
        if let Err(err) = item.validate() {
            debug!(
                "event=work_item_create module=repo status=rejected outcome=bad_request reason={}",
                err.code()
            );
            return Ok((Outcome::BadRequest, None));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(assignee_id) = resolve_assignee(&tx, item.assigned_to_id)? else {
            debug!(
                "event=work_item_create module=repo status=rejected outcome=bad_request reason=unknown_assignee"
            );
            return Ok((Outcome::BadRequest, None));
        };
        let tag_ids = resolve_tags(&tx, &item.normalized_tags())?;

        let now = now_epoch_ms();
        tx.execute(
            "INSERT INTO work_items (
                title,
                description,
                state,
                assigned_to,
                created_at,
                state_updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                item.title,
                item.description,
                WorkItemState::New.as_db_str(),
                assignee_id,
                now,
            ],
        )?;
        let work_item_id = tx.last_insert_rowid();
        attach_tags(&tx, work_item_id, &tag_ids)?;
        tx.commit()?;

        info!(
            "event=work_item_create module=repo status=ok work_item_id={work_item_id} user_id={assignee_id} tag_count={}",
            tag_ids.len()
        );
        Ok((Outcome::Created, Some(work_item_id)))
    }

    fn find_work_item(&self, id: WorkItemId) -> RepoResult<Option<WorkItemDetails>> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    w.id,
                    w.title,
                    w.description,
                    w.created_at,
                    w.state,
                    w.state_updated_at,
                    u.name AS assignee_name
                 FROM work_items w
                 LEFT JOIN users u ON u.id = w.assigned_to
                 WHERE w.id = ?1;",
                [id],
                |row| {
                    Ok((
                        row.get::<_, WorkItemId>("id")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, Option<String>>("description")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, String>("state")?,
                        row.get::<_, i64>("state_updated_at")?,
                        row.get::<_, Option<String>>("assignee_name")?,
                    ))
                },
            )
            .optional()?;

        let Some((id, title, description, created_at, state, state_updated_at, assignee)) = row
        else {
            return Ok(None);
        };

        Ok(Some(WorkItemDetails {
            id,
            title,
            description: description.unwrap_or_default(),
            created_at,
            assigned_to: assignee.unwrap_or_default(),
            tags: load_tag_names(self.conn, id)?,
            state: parse_state(&state)?,
            state_updated_at,
        }))
    }

    fn list_work_items(&self, filter: &WorkItemFilter) -> RepoResult<Vec<WorkItemSummary>> {
        let mut sql = format!("{WORK_ITEM_SUMMARY_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match filter {
            WorkItemFilter::All => {}
            WorkItemFilter::State(state) => {
                sql.push_str(" AND w.state = ?");
                bind_values.push(Value::Text(state.as_db_str().to_string()));
            }
            WorkItemFilter::Tag(name) => {
                sql.push_str(
                    " AND EXISTS (
                        SELECT 1
                        FROM work_item_tags wt
                        INNER JOIN tags t ON t.id = wt.tag_id
                        WHERE wt.work_item_id = w.id
                          AND t.name = ?
                    )",
                );
                bind_values.push(Value::Text(name.clone()));
            }
            WorkItemFilter::AssignedTo(user_id) => {
                sql.push_str(" AND w.assigned_to = ?");
                bind_values.push(Value::Integer(*user_id));
            }
        }
        sql.push_str(" ORDER BY w.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let id: WorkItemId = row.get("id")?;
            let state: String = row.get("state")?;
            items.push(WorkItemSummary {
                id,
                title: row.get("title")?,
                assigned_to: row
                    .get::<_, Option<String>>("assignee_name")?
                    .unwrap_or_default(),
                tags: load_tag_names(self.conn, id)?,
                state: parse_state(&state)?,
            });
        }

        Ok(items)
    }

    fn update_work_item(&mut self, item: &WorkItemUpdate) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_state(&tx, item.id)?.is_none() {
            return Ok(Outcome::NotFound);
        }
        if let Err(err) = item.validate() {
            debug!(
                "event=work_item_update module=repo status=rejected outcome=bad_request work_item_id={} reason={}",
                item.id,
                err.code()
            );
            return Ok(Outcome::BadRequest);
        }
        let Some(assignee_id) = resolve_assignee(&tx, item.assigned_to_id)? else {
            debug!(
                "event=work_item_update module=repo status=rejected outcome=bad_request work_item_id={} reason=unknown_assignee",
                item.id
            );
            return Ok(Outcome::BadRequest);
        };
        let tag_ids = resolve_tags(&tx, &item.normalized_tags())?;

        detach_tags(&tx, item.id)?;
        tx.execute(
            "UPDATE work_items
             SET
                title = ?2,
                description = ?3,
                assigned_to = ?4,
                state = ?5,
                state_updated_at = ?6
             WHERE id = ?1;",
            params![
                item.id,
                item.title,
                item.description,
                assignee_id,
                item.state.as_db_str(),
                now_epoch_ms(),
            ],
        )?;
        attach_tags(&tx, item.id, &tag_ids)?;
        tx.commit()?;

        info!(
            "event=work_item_update module=repo status=ok work_item_id={} user_id={assignee_id} state={} tag_count={}",
            item.id,
            item.state.as_db_str(),
            tag_ids.len()
        );
        Ok(Outcome::Updated)
    }

    fn delete_work_item(&mut self, id: WorkItemId) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(state) = load_state(&tx, id)? else {
            return Ok(Outcome::NotFound);
        };

        match state.deletion_policy() {
            DeletionPolicy::HardDelete => {
                tx.execute("DELETE FROM work_items WHERE id = ?1;", [id])?;
            }
            DeletionPolicy::Tombstone => {
                tx.execute(
                    "UPDATE work_items
                     SET state = ?2, state_updated_at = ?3
                     WHERE id = ?1;",
                    params![id, WorkItemState::Removed.as_db_str(), now_epoch_ms()],
                )?;
            }
            DeletionPolicy::Protected => {
                debug!(
                    "event=work_item_delete module=repo status=rejected outcome=conflict work_item_id={id} state={}",
                    state.as_db_str()
                );
                return Ok(Outcome::Conflict);
            }
        }
        tx.commit()?;

        info!(
            "event=work_item_delete module=repo status=ok work_item_id={id} from_state={} policy={:?}",
            state.as_db_str(),
            state.deletion_policy()
        );
        Ok(Outcome::Deleted)
    }
}

/// Maps the requested assignee to an existing user id.
///
/// `None` means the request cannot be satisfied: either no user was named
/// or the named user does not exist.
fn resolve_assignee(conn: &Connection, requested: Option<UserId>) -> RepoResult<Option<UserId>> {
    match requested {
        Some(user_id) if user_exists(conn, user_id)? => Ok(Some(user_id)),
        _ => Ok(None),
    }
}

fn resolve_tags(conn: &Connection, names: &[String]) -> RepoResult<Vec<TagId>> {
    names
        .iter()
        .map(|name| find_or_create_tag(conn, name))
        .collect()
}

fn detach_tags(conn: &Connection, work_item_id: WorkItemId) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM work_item_tags WHERE work_item_id = ?1;",
        [work_item_id],
    )?;
    Ok(())
}

fn attach_tags(conn: &Connection, work_item_id: WorkItemId, tag_ids: &[TagId]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO work_item_tags (work_item_id, tag_id) VALUES (?1, ?2);",
    )?;
    for tag_id in tag_ids {
        stmt.execute(params![work_item_id, tag_id])?;
    }
    Ok(())
}

fn load_state(conn: &Connection, id: WorkItemId) -> RepoResult<Option<WorkItemState>> {
    let value: Option<String> = conn
        .query_row("SELECT state FROM work_items WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .optional()?;
    value.as_deref().map(parse_state).transpose()
}

fn load_tag_names(conn: &Connection, work_item_id: WorkItemId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM work_item_tags wt
         INNER JOIN tags t ON t.id = wt.tag_id
         WHERE wt.work_item_id = ?1
         ORDER BY t.name ASC, t.id ASC;",
    )?;
    let mut rows = stmt.query([work_item_id])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

fn parse_state(value: &str) -> RepoResult<WorkItemState> {
    WorkItemState::from_db_str(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid state `{value}` in work_items.state"
        ))
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
