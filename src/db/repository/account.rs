use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::RoleName;
use crate::models::*;

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        authority: row.get(1)?,
        deleted: row.get(2)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        enabled: row.get(3)?,
        doctor_id: row.get(4)?,
        patient_id: row.get(5)?,
    })
}

const USER_SELECT: &str =
    "SELECT id, username, password_hash, enabled, doctor_id, patient_id FROM users";

// ── Roles ──────────────────────────────────────────────────────────────────

pub fn insert_role(conn: &Connection, authority: &str) -> Result<i64, DatabaseError> {
    conn.execute("INSERT INTO roles (authority) VALUES (?1)", params![authority])?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_role(conn: &Connection, id: i64) -> Result<Option<Role>, DatabaseError> {
    conn.query_row(
        "SELECT id, authority, is_deleted FROM roles WHERE id = ?1",
        params![id],
        role_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_role(conn: &Connection, id: i64) -> Result<Option<Role>, DatabaseError> {
    conn.query_row(
        "SELECT id, authority, is_deleted FROM roles WHERE id = ?1 AND is_deleted = 0",
        params![id],
        role_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Delete-blind: authorities stay unique across deleted roles.
pub fn find_role_by_authority(
    conn: &Connection,
    authority: &str,
) -> Result<Option<Role>, DatabaseError> {
    conn.query_row(
        "SELECT id, authority, is_deleted FROM roles WHERE authority = ?1",
        params![authority],
        role_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_roles(conn: &Connection) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, authority, is_deleted FROM roles WHERE is_deleted = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map([], role_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_role(conn: &Connection, id: i64, authority: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE roles SET authority = ?1 WHERE id = ?2",
        params![authority, id],
    )?;
    Ok(())
}

pub fn count_users_with_role(conn: &Connection, role_id: i64) -> Result<i64, DatabaseError> {
    conn.query_row(
        "SELECT COUNT(*) FROM user_roles WHERE role_id = ?1",
        params![role_id],
        |row| row.get(0),
    )
    .map_err(DatabaseError::from)
}

// ── Users ──────────────────────────────────────────────────────────────────

pub fn insert_user(conn: &Connection, user: &UserData) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, password_hash, enabled, doctor_id, patient_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.username,
            user.password_hash,
            user.enabled,
            user.doctor_id,
            user.patient_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Any user, enabled or not.
pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        &format!("{USER_SELECT} WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_enabled_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        &format!("{USER_SELECT} WHERE id = ?1 AND enabled = 1"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Usernames are unique across enabled and disabled users.
pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        &format!("{USER_SELECT} WHERE username = ?1"),
        params![username],
        user_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_enabled_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE enabled = 1 ORDER BY id"))?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_user(conn: &Connection, id: i64, user: &UserData) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users
         SET username = ?1, password_hash = ?2, enabled = ?3, doctor_id = ?4, patient_id = ?5
         WHERE id = ?6",
        params![
            user.username,
            user.password_hash,
            user.enabled,
            user.doctor_id,
            user.patient_id,
            id,
        ],
    )?;
    Ok(())
}

pub fn set_user_enabled(conn: &Connection, id: i64, enabled: bool) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET enabled = ?1 WHERE id = ?2",
        params![enabled, id],
    )?;
    Ok(changed > 0)
}

/// Active roles held by a user, in role id order.
pub fn roles_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.authority, r.is_deleted
         FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = ?1 AND r.is_deleted = 0
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map(params![user_id], role_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Replace a user's role set. Callers wrap this in a transaction.
pub fn replace_user_roles(
    conn: &Connection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM user_roles WHERE user_id = ?1", params![user_id])?;
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)")?;
    for role_id in role_ids {
        stmt.execute(params![user_id, role_id])?;
    }
    Ok(())
}

/// True when at least one enabled user holds `ROLE_ADMIN`.
pub fn admin_exists(conn: &Connection) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM users u
         JOIN user_roles ur ON ur.user_id = u.id
         JOIN roles r ON r.id = ur.role_id
         WHERE u.enabled = 1 AND r.authority = ?1 AND r.is_deleted = 0",
        params![RoleName::Admin.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
