//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `kanban_core` linkage and storage bootstrap from a shell.
//! - Keep output deterministic `key=value` lines.
//!
//! Configuration: the first argument (or `KANBAN_DB`) is the database
//! path, in-memory when absent. `KANBAN_LOG_DIR` enables file logging at
//! `KANBAN_LOG_LEVEL` (build default when unset).

use kanban_core::db::migrations::current_user_version;
use kanban_core::db::{open_db, open_db_in_memory};
use kanban_core::{
    default_log_level, init_logging, SqliteTagRepository, SqliteUserRepository,
    SqliteWorkItemRepository, TagRepository, UserRepository, WorkItemRepository,
};
use log::error;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("kanban_core ping={}", kanban_core::ping());
    println!("kanban_core version={}", kanban_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("KANBAN_LOG_DIR") {
        let level =
            std::env::var("KANBAN_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let db_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("KANBAN_DB").ok());
    let mut conn = match db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    println!("kanban_core schema_version={}", current_user_version(&conn)?);

    let users = SqliteUserRepository::try_new(&mut conn)?.read_users()?.len();
    let tags = SqliteTagRepository::try_new(&mut conn)?.read_tags()?.len();
    let work_items = SqliteWorkItemRepository::try_new(&mut conn)?;
    let items = work_items.read_work_items()?.len();
    let removed = work_items.read_removed_work_items()?.len();

    println!("kanban_core users={users} tags={tags} work_items={items} removed={removed}");
    Ok(())
}
