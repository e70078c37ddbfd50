use rusqlite::Connection;

use crate::{Email, PasswordHash, User, create_user, db::initialize};

/// An in-memory database with all tables created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}

/// Insert a user with a dummy password hash, for tests that only need an owner.
#[track_caller]
pub(crate) fn create_test_user(conn: &Connection, email: &str) -> User {
    create_user(
        Email::new(email).unwrap(),
        PasswordHash::new_unchecked("$2b$04$not.a.real.hash"),
        conn,
    )
    .unwrap()
}
