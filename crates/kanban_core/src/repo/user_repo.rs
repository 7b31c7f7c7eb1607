//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Keyed CRUD over `users`, with `email` as the natural key.
//!
//! # Invariants
//! - Emails are unique and compared exactly as stored.
//! - A user with assigned work items is only deleted when forced; those
//!   items become unassigned (`ON DELETE SET NULL`).

use crate::model::outcome::Outcome;
use crate::model::user::{UserCreate, UserId, UserRecord, UserUpdate};
use crate::model::work_item::WorkItemId;
use crate::repo::error::RepoResult;
use crate::repo::schema_guard::ensure_connection_ready;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

/// Repository interface for user operations.
pub trait UserRepository {
    /// Inserts a user. Returns `Conflict` plus the existing id when the
    /// email is already registered.
    fn create_user(&mut self, user: &UserCreate) -> RepoResult<(Outcome, Option<UserId>)>;
    /// Lists all users ordered by id.
    fn read_users(&self) -> RepoResult<Vec<UserRecord>>;
    /// Loads one user by id.
    fn find_user(&self, id: UserId) -> RepoResult<Option<UserRecord>>;
    /// Overwrites name and email of one user.
    fn update_user(&mut self, user: &UserUpdate) -> RepoResult<Outcome>;
    /// Deletes one user. Assigned work items block deletion unless `force`.
    fn delete_user(&mut self, id: UserId, force: bool) -> RepoResult<Outcome>;
    /// Ids of work items assigned to this user, ordered by id.
    fn user_work_items(&self, id: UserId) -> RepoResult<Vec<WorkItemId>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&mut self, user: &UserCreate) -> RepoResult<(Outcome, Option<UserId>)> {
        if let Err(err) = user.validate() {
            debug!(
                "event=user_create module=repo status=rejected outcome=bad_request reason={}",
                err.code()
            );
            return Ok((Outcome::BadRequest, None));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(existing_id) = find_user_id_by_email(&tx, &user.email)? {
            debug!(
                "event=user_create module=repo status=rejected outcome=conflict user_id={existing_id}"
            );
            return Ok((Outcome::Conflict, Some(existing_id)));
        }

        tx.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2);",
            params![user.name, user.email],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=user_create module=repo status=ok user_id={user_id}");
        Ok((Outcome::Created, Some(user_id)))
    }

    fn read_users(&self) -> RepoResult<Vec<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1;",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn update_user(&mut self, user: &UserUpdate) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, user.id)? {
            return Ok(Outcome::NotFound);
        }
        if let Err(err) = user.validate() {
            debug!(
                "event=user_update module=repo status=rejected outcome=bad_request user_id={} reason={}",
                user.id,
                err.code()
            );
            return Ok(Outcome::BadRequest);
        }

        match find_user_id_by_email(&tx, &user.email)? {
            Some(owner_id) if owner_id != user.id => {
                debug!(
                    "event=user_update module=repo status=rejected outcome=conflict user_id={} owner_id={owner_id}",
                    user.id
                );
                return Ok(Outcome::Conflict);
            }
            _ => {}
        }

        tx.execute(
            "UPDATE users SET name = ?2, email = ?3 WHERE id = ?1;",
            params![user.id, user.name, user.email],
        )?;
        tx.commit()?;
        Ok(Outcome::Updated)
    }

    fn delete_user(&mut self, id: UserId, force: bool) -> RepoResult<Outcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, id)? {
            return Ok(Outcome::NotFound);
        }

        let assigned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM work_items WHERE assigned_to = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if assigned > 0 && !force {
            debug!(
                "event=user_delete module=repo status=rejected outcome=conflict user_id={id} assigned_items={assigned}"
            );
            return Ok(Outcome::Conflict);
        }

        tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=user_delete module=repo status=ok user_id={id} assigned_items={assigned} force={force}"
        );
        Ok(Outcome::Deleted)
    }

    fn user_work_items(&self, id: UserId) -> RepoResult<Vec<WorkItemId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id
             FROM work_items
             WHERE assigned_to = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

/// Returns whether a user row with this id exists.
pub(crate) fn user_exists(conn: &Connection, id: UserId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn find_user_id_by_email(conn: &Connection, email: &str) -> RepoResult<Option<UserId>> {
    let id = conn
        .query_row("SELECT id FROM users WHERE email = ?1;", [email], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}
