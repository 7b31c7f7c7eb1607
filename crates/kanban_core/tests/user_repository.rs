use kanban_core::db::open_db_in_memory;
use kanban_core::{
    Outcome, SqliteUserRepository, SqliteWorkItemRepository, UserCreate, UserRecord,
    UserRepository, UserUpdate, WorkItemCreate, WorkItemRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create_user(conn: &mut Connection, name: &str, email: &str) -> i64 {
    let (outcome, id) = SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&UserCreate::new(name, email))
        .unwrap();
    assert_eq!(outcome, Outcome::Created);
    id.unwrap()
}

fn assign_work_item(conn: &mut Connection, user_id: i64, title: &str) -> i64 {
    let (outcome, id) = SqliteWorkItemRepository::try_new(conn)
        .unwrap()
        .create_work_item(&WorkItemCreate::new(title, Some(user_id)))
        .unwrap();
    assert_eq!(outcome, Outcome::Created);
    id.unwrap()
}

#[test]
fn create_user_returns_created_and_id() {
    let mut conn = setup();
    let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    let (outcome, id) = repo
        .create_user(&UserCreate::new("Billy", "Billy@example.com"))
        .unwrap();

    assert_eq!(outcome, Outcome::Created);
    assert_eq!(id, Some(1));
}

#[test]
fn create_user_with_taken_email_returns_conflict_and_keeps_count() {
    let mut conn = setup();
    let existing = create_user(&mut conn, "Billy", "billy@example.com");
    let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    let (outcome, id) = repo
        .create_user(&UserCreate::new("Other Billy", "billy@example.com"))
        .unwrap();

    assert_eq!(outcome, Outcome::Conflict);
    assert_eq!(id, Some(existing));
    assert_eq!(repo.read_users().unwrap().len(), 1);
}

#[test]
fn email_uniqueness_is_case_sensitive_as_stored() {
    let mut conn = setup();
    create_user(&mut conn, "Billy", "billy@example.com");
    let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    let (outcome, _) = repo
        .create_user(&UserCreate::new("Billy", "Billy@example.com"))
        .unwrap();

    assert_eq!(outcome, Outcome::Created);
}

#[test]
fn create_user_rejects_invalid_payloads() {
    let mut conn = setup();
    let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    let (no_name, _) = repo
        .create_user(&UserCreate::new(" ", "a@example.com"))
        .unwrap();
    let (bad_email, id) = repo
        .create_user(&UserCreate::new("Anna", "not-an-email"))
        .unwrap();

    assert_eq!(no_name, Outcome::BadRequest);
    assert_eq!(bad_email, Outcome::BadRequest);
    assert_eq!(id, None);
    assert!(repo.read_users().unwrap().is_empty());
}

#[test]
fn read_and_find_users() {
    let mut conn = setup();
    create_user(&mut conn, "Sigurd", "sigurd@example.com");
    create_user(&mut conn, "Anna", "anna@example.com");
    let repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    let users = repo.read_users().unwrap();
    assert_eq!(
        users.iter().map(|user| user.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(
        repo.find_user(2).unwrap(),
        Some(UserRecord {
            id: 2,
            name: "Anna".to_string(),
            email: "anna@example.com".to_string(),
        })
    );
    assert_eq!(repo.find_user(42).unwrap(), None);
}

#[test]
fn update_user_persists_changes() {
    let mut conn = setup();
    let id = create_user(&mut conn, "Sigurd", "sigurd@example.com");

    let outcome = SqliteUserRepository::try_new(&mut conn)
        .unwrap()
        .update_user(&UserUpdate::new(id, "Sigurd J", "sj@example.com"))
        .unwrap();
    assert_eq!(outcome, Outcome::Updated);

    let reloaded = SqliteUserRepository::try_new(&mut conn)
        .unwrap()
        .find_user(id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Sigurd J");
    assert_eq!(reloaded.email, "sj@example.com");
}

#[test]
fn update_user_outcomes() {
    let mut conn = setup();
    let sigurd = create_user(&mut conn, "Sigurd", "sigurd@example.com");
    create_user(&mut conn, "Anna", "anna@example.com");
    let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();

    assert_eq!(
        repo.update_user(&UserUpdate::new(99, "Ghost", "ghost@example.com"))
            .unwrap(),
        Outcome::NotFound
    );
    assert_eq!(
        repo.update_user(&UserUpdate::new(sigurd, "Sigurd", "anna@example.com"))
            .unwrap(),
        Outcome::Conflict
    );
    assert_eq!(
        repo.update_user(&UserUpdate::new(sigurd, "Sigurd", "nope"))
            .unwrap(),
        Outcome::BadRequest
    );
    assert_eq!(
        repo.update_user(&UserUpdate::new(sigurd, "Sigurd Renamed", "sigurd@example.com"))
            .unwrap(),
        Outcome::Updated
    );
}

#[test]
fn delete_user_outcomes_follow_assignment_and_force() {
    let mut conn = setup();
    let idle = create_user(&mut conn, "Idle", "idle@example.com");
    let busy = create_user(&mut conn, "Busy", "busy@example.com");
    let item_id = assign_work_item(&mut conn, busy, "Do Maths");

    {
        let mut repo = SqliteUserRepository::try_new(&mut conn).unwrap();
        assert_eq!(repo.delete_user(404, false).unwrap(), Outcome::NotFound);
        assert_eq!(repo.delete_user(idle, false).unwrap(), Outcome::Deleted);
        assert_eq!(repo.delete_user(busy, false).unwrap(), Outcome::Conflict);
        assert_eq!(repo.user_work_items(busy).unwrap(), vec![item_id]);
        assert_eq!(repo.delete_user(busy, true).unwrap(), Outcome::Deleted);
        assert!(repo.read_users().unwrap().is_empty());
    }

    let details = SqliteWorkItemRepository::try_new(&mut conn)
        .unwrap()
        .find_work_item(item_id)
        .unwrap()
        .unwrap();
    assert_eq!(details.assigned_to, "");
}
