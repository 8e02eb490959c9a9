//! Users, roles and credential checks.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use super::{found, resolve_doctor, resolve_patient, ServiceError};
use crate::authorization::Caller;
use crate::crypto::{hash_password, verify_password};
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::{EntityKind, RoleName};
use crate::models::{Role, User, UserData};

const ROLE_PREFIX: &str = "ROLE_";

// ── Roles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub authority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i64,
    pub authority: String,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            authority: r.authority,
        }
    }
}

/// `"nurse"` and `"ROLE_nurse"` both become `"ROLE_NURSE"`.
pub fn normalize_authority(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.strip_prefix(ROLE_PREFIX) {
        Some(rest) => format!("{ROLE_PREFIX}{rest}"),
        None => format!("{ROLE_PREFIX}{upper}"),
    }
}

fn validated_authority(req: &RoleRequest) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let authority = normalize_authority(&req.authority);
    if errors.not_blank("authority", &req.authority) && authority == ROLE_PREFIX {
        errors.add("authority", "must name a role");
    }
    errors.into_result()?;
    Ok(authority)
}

fn ensure_not_builtin(role: &Role) -> Result<(), ServiceError> {
    if RoleName::from_str(&role.authority).is_ok() {
        return Err(ServiceError::Conflict(format!(
            "Built-in role {} cannot be changed",
            role.authority
        )));
    }
    Ok(())
}

pub fn create_role(conn: &Connection, req: &RoleRequest) -> Result<RoleResponse, ServiceError> {
    let authority = validated_authority(req)?;
    if repo::find_role_by_authority(conn, &authority)?.is_some() {
        return Err(ServiceError::AlreadyExists(format!("Role {authority} already exists")));
    }
    let id = repo::insert_role(conn, &authority)?;
    tracing::info!(role_id = id, authority = %authority, "role created");
    get_role(conn, id)
}

pub fn get_role(conn: &Connection, id: i64) -> Result<RoleResponse, ServiceError> {
    found(repo::get_active_role(conn, id)?, EntityKind::Role, id).map(RoleResponse::from)
}

pub fn list_roles(conn: &Connection) -> Result<Vec<RoleResponse>, ServiceError> {
    Ok(repo::list_active_roles(conn)?
        .into_iter()
        .map(RoleResponse::from)
        .collect())
}

pub fn update_role(
    conn: &Connection,
    id: i64,
    req: &RoleRequest,
) -> Result<RoleResponse, ServiceError> {
    let authority = validated_authority(req)?;
    let role = found(repo::get_active_role(conn, id)?, EntityKind::Role, id)?;
    ensure_not_builtin(&role)?;
    match repo::find_role_by_authority(conn, &authority)? {
        Some(existing) if existing.id != id => {
            return Err(ServiceError::AlreadyExists(format!("Role {authority} already exists")));
        }
        _ => {}
    }
    repo::update_role(conn, id, &authority)?;
    tracing::info!(role_id = id, authority = %authority, "role updated");
    get_role(conn, id)
}

/// Soft-delete a role nobody holds.
pub fn delete_role(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    let role = found(repo::get_role(conn, id)?, EntityKind::Role, id)?;
    ensure_not_builtin(&role)?;
    let holders = repo::count_users_with_role(conn, id)?;
    if holders > 0 {
        return Err(ServiceError::Conflict(format!(
            "Role {} is assigned to {holders} user(s)",
            role.authority
        )));
    }
    repo::soft_delete(conn, SoftDeleteTable::Roles, id)?;
    tracing::info!(role_id = id, "role deleted");
    Ok(())
}

// ── Users ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role_ids: Vec<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
}

/// Full edit payload. `enabled` is always written; a missing or blank
/// password keeps the stored hash and missing `role_ids` keep the roles.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub password: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub role_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
}

fn user_response(conn: &Connection, user: User) -> Result<UserResponse, ServiceError> {
    let roles = repo::roles_for_user(conn, user.id)?
        .into_iter()
        .map(|r| r.authority)
        .collect();
    Ok(UserResponse {
        id: user.id,
        username: user.username,
        enabled: user.enabled,
        roles,
        doctor_id: user.doctor_id,
        patient_id: user.patient_id,
    })
}

fn resolve_roles(conn: &Connection, role_ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
    role_ids
        .iter()
        .map(|&id| -> Result<i64, ServiceError> {
            Ok(found(repo::get_active_role(conn, id)?, EntityKind::Role, id)?.id)
        })
        .collect()
}

fn link_conflict(err: crate::db::DatabaseError) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::Conflict("Username or linked record already belongs to another user".into())
    } else {
        err.into()
    }
}

pub fn create_user(conn: &Connection, req: &UserRequest) -> Result<UserResponse, ServiceError> {
    let mut errors = ValidationErrors::new();
    errors.not_blank("username", &req.username);
    errors.not_blank("password", &req.password);
    errors.into_result()?;

    if repo::find_user_by_username(conn, &req.username)?.is_some() {
        return Err(ServiceError::AlreadyExists(format!(
            "Username '{}' is already taken",
            req.username
        )));
    }
    let role_ids = resolve_roles(conn, &req.role_ids)?;
    let doctor_id = match req.doctor_id {
        Some(id) => Some(resolve_doctor(conn, id)?.id),
        None => None,
    };
    let patient_id = match req.patient_id {
        Some(id) => Some(resolve_patient(conn, id)?.id),
        None => None,
    };

    let tx = conn.unchecked_transaction()?;
    let id = repo::insert_user(
        &tx,
        &UserData {
            username: req.username.clone(),
            password_hash: hash_password(&req.password),
            enabled: true,
            doctor_id,
            patient_id,
        },
    )
    .map_err(link_conflict)?;
    repo::replace_user_roles(&tx, id, &role_ids)?;
    tx.commit()?;

    tracing::info!(user_id = id, "user created");
    get_user(conn, id)
}

pub fn get_user(conn: &Connection, id: i64) -> Result<UserResponse, ServiceError> {
    let user = found(repo::get_enabled_user(conn, id)?, EntityKind::User, id)?;
    user_response(conn, user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserResponse>, ServiceError> {
    repo::list_enabled_users(conn)?
        .into_iter()
        .map(|u| user_response(conn, u))
        .collect()
}

/// Blank passwords leave the stored hash untouched.
///
/// Disabled users can be edited too, so an account can be re-enabled.
pub fn update_user(
    conn: &Connection,
    id: i64,
    req: &UserUpdateRequest,
) -> Result<UserResponse, ServiceError> {
    let user = found(repo::get_user(conn, id)?, EntityKind::User, id)?;
    let role_ids = match &req.role_ids {
        Some(ids) => Some(resolve_roles(conn, ids)?),
        None => None,
    };
    let password_hash = match req.password.as_deref() {
        Some(p) if !p.trim().is_empty() => hash_password(p),
        _ => user.password_hash.clone(),
    };

    let tx = conn.unchecked_transaction()?;
    repo::update_user(
        &tx,
        id,
        &UserData {
            username: user.username.clone(),
            password_hash,
            enabled: req.enabled,
            doctor_id: user.doctor_id,
            patient_id: user.patient_id,
        },
    )?;
    if let Some(role_ids) = role_ids {
        repo::replace_user_roles(&tx, id, &role_ids)?;
    }
    tx.commit()?;

    tracing::info!(user_id = id, "user updated");
    let updated = found(repo::get_user(conn, id)?, EntityKind::User, id)?;
    user_response(conn, updated)
}

/// Disable the account. Disabled users are `NotFound`.
pub fn delete_user(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    found(repo::get_enabled_user(conn, id)?, EntityKind::User, id)?;
    repo::set_user_enabled(conn, id, false)?;
    tracing::info!(user_id = id, "user disabled");
    Ok(())
}

// ── Authentication ─────────────────────────────────────────────────────────

fn caller_from(conn: &Connection, user: User) -> Result<Caller, ServiceError> {
    let roles = repo::roles_for_user(conn, user.id)?
        .iter()
        .filter_map(|r| RoleName::from_str(&r.authority).ok())
        .collect();
    Ok(Caller {
        user_id: user.id,
        username: user.username,
        roles,
        doctor_id: user.doctor_id,
        patient_id: user.patient_id,
    })
}

/// Check credentials of an enabled user.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Caller, ServiceError> {
    let Some(user) = repo::find_user_by_username(conn, username)?.filter(|u| u.enabled) else {
        tracing::warn!("login rejected: unknown or disabled user");
        return Err(ServiceError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "login rejected: wrong password");
        return Err(ServiceError::InvalidCredentials);
    }
    caller_from(conn, user)
}

/// Current identity of a session's user, or `None` once it is disabled.
pub fn load_caller(conn: &Connection, user_id: i64) -> Result<Option<Caller>, ServiceError> {
    match repo::get_enabled_user(conn, user_id)? {
        Some(user) => caller_from(conn, user).map(Some),
        None => Ok(None),
    }
}

/// Create the configured admin when no enabled admin exists yet.
/// Returns the new user's id.
pub fn ensure_bootstrap_admin(
    conn: &Connection,
    username: &str,
    password: Option<&str>,
) -> Result<Option<i64>, ServiceError> {
    if repo::admin_exists(conn)? {
        return Ok(None);
    }
    let Some(password) = password else {
        tracing::warn!("no admin account exists and CLINIC_ADMIN_PASSWORD is unset");
        return Ok(None);
    };
    if repo::find_user_by_username(conn, username)?.is_some() {
        tracing::warn!(username, "bootstrap admin username is taken by a non-admin user");
        return Ok(None);
    }
    let admin = repo::find_role_by_authority(conn, RoleName::Admin.as_str())?
        .filter(|r| !r.deleted)
        .ok_or_else(|| ServiceError::Conflict(format!("{} role is not available", RoleName::Admin)))?;

    let tx = conn.unchecked_transaction()?;
    let id = repo::insert_user(
        &tx,
        &UserData {
            username: username.to_string(),
            password_hash: hash_password(password),
            enabled: true,
            doctor_id: None,
            patient_id: None,
        },
    )?;
    repo::replace_user_roles(&tx, id, &[admin.id])?;
    tx.commit()?;

    tracing::info!(user_id = id, "bootstrap admin created");
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::services::fixtures;

    fn role_id(conn: &Connection, role: RoleName) -> i64 {
        repo::find_role_by_authority(conn, role.as_str()).unwrap().unwrap().id
    }

    fn user(name: &str, role_ids: Vec<i64>) -> UserRequest {
        UserRequest {
            username: name.into(),
            password: "pw".into(),
            role_ids,
            doctor_id: None,
            patient_id: None,
        }
    }

    #[test]
    fn authority_is_normalized() {
        assert_eq!(normalize_authority("nurse"), "ROLE_NURSE");
        assert_eq!(normalize_authority(" role_Nurse "), "ROLE_NURSE");
        assert_eq!(normalize_authority("ROLE_ADMIN"), "ROLE_ADMIN");
    }

    #[test]
    fn create_role_rejects_duplicates_after_normalizing() {
        let conn = open_memory_database().unwrap();
        let created = create_role(&conn, &RoleRequest { authority: "nurse".into() }).unwrap();
        assert_eq!(created.authority, "ROLE_NURSE");
        assert!(matches!(
            create_role(&conn, &RoleRequest { authority: "ROLE_NURSE".into() }),
            Err(ServiceError::AlreadyExists(_))
        ));
    }

    #[test]
    fn assigned_role_cannot_be_deleted() {
        let conn = open_memory_database().unwrap();
        let nurse = create_role(&conn, &RoleRequest { authority: "nurse".into() }).unwrap();
        let holder = create_user(&conn, &user("carla", vec![nurse.id])).unwrap();

        assert!(matches!(delete_role(&conn, nurse.id), Err(ServiceError::Conflict(_))));

        update_user(
            &conn,
            holder.id,
            &UserUpdateRequest {
                password: None,
                enabled: true,
                role_ids: Some(vec![]),
            },
        )
        .unwrap();
        delete_role(&conn, nurse.id).unwrap();
        assert!(matches!(get_role(&conn, nurse.id), Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn builtin_roles_are_protected() {
        let conn = open_memory_database().unwrap();
        let admin = role_id(&conn, RoleName::Admin);
        assert!(matches!(delete_role(&conn, admin), Err(ServiceError::Conflict(_))));
        assert!(matches!(
            update_role(&conn, admin, &RoleRequest { authority: "boss".into() }),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn create_user_resolves_roles_and_links() {
        let conn = open_memory_database().unwrap();
        let house = fixtures::house(&conn);
        let mut req = user("house", vec![role_id(&conn, RoleName::Doctor)]);
        req.doctor_id = Some(house);

        let created = create_user(&conn, &req).unwrap();
        assert_eq!(created.roles, vec!["ROLE_DOCTOR"]);
        assert_eq!(created.doctor_id, Some(house));

        assert!(matches!(
            create_user(&conn, &user("ghost", vec![999])),
            Err(ServiceError::NotFound { entity: EntityKind::Role, id: 999 })
        ));
    }

    #[test]
    fn doctor_links_to_one_user_only() {
        let conn = open_memory_database().unwrap();
        let house = fixtures::house(&conn);
        let mut first = user("house", vec![]);
        first.doctor_id = Some(house);
        create_user(&conn, &first).unwrap();

        let mut second = user("greg", vec![]);
        second.doctor_id = Some(house);
        assert!(matches!(create_user(&conn, &second), Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn delete_user_disables_and_blocks_login() {
        let conn = open_memory_database().unwrap();
        let created = create_user(&conn, &user("chase", vec![])).unwrap();
        assert!(authenticate(&conn, "chase", "pw").is_ok());

        delete_user(&conn, created.id).unwrap();
        assert!(matches!(get_user(&conn, created.id), Err(ServiceError::NotFound { .. })));
        assert!(matches!(delete_user(&conn, created.id), Err(ServiceError::NotFound { .. })));
        assert!(matches!(
            authenticate(&conn, "chase", "pw"),
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(load_caller(&conn, created.id).unwrap().is_none());
    }

    #[test]
    fn blank_password_update_keeps_old_password() {
        let conn = open_memory_database().unwrap();
        let created = create_user(&conn, &user("foreman", vec![])).unwrap();
        update_user(
            &conn,
            created.id,
            &UserUpdateRequest {
                password: Some("   ".into()),
                enabled: true,
                role_ids: None,
            },
        )
        .unwrap();
        assert!(authenticate(&conn, "foreman", "pw").is_ok());

        update_user(
            &conn,
            created.id,
            &UserUpdateRequest {
                password: Some("new".into()),
                enabled: true,
                role_ids: None,
            },
        )
        .unwrap();
        assert!(authenticate(&conn, "foreman", "pw").is_err());
        assert!(authenticate(&conn, "foreman", "new").is_ok());
    }

    #[test]
    fn updated_password_is_stored_as_typed() {
        let conn = open_memory_database().unwrap();
        let created = create_user(&conn, &user("cameron", vec![])).unwrap();
        update_user(
            &conn,
            created.id,
            &UserUpdateRequest {
                password: Some(" new pass ".into()),
                enabled: true,
                role_ids: None,
            },
        )
        .unwrap();
        assert!(authenticate(&conn, "cameron", " new pass ").is_ok());
        assert!(authenticate(&conn, "cameron", "new pass").is_err());
    }

    #[test]
    fn disabled_user_can_be_enabled_again() {
        let conn = open_memory_database().unwrap();
        let created = create_user(&conn, &user("taub", vec![])).unwrap();
        let off = UserUpdateRequest {
            password: None,
            enabled: false,
            role_ids: None,
        };

        let disabled = update_user(&conn, created.id, &off).unwrap();
        assert!(!disabled.enabled);
        assert!(authenticate(&conn, "taub", "pw").is_err());

        // A second edit still finds the disabled account
        update_user(&conn, created.id, &off).unwrap();

        let enabled = update_user(
            &conn,
            created.id,
            &UserUpdateRequest {
                password: None,
                enabled: true,
                role_ids: None,
            },
        )
        .unwrap();
        assert!(enabled.enabled);
        assert!(authenticate(&conn, "taub", "pw").is_ok());
    }

    #[test]
    fn deleted_user_is_restored_by_update() {
        let conn = open_memory_database().unwrap();
        let created = create_user(&conn, &user("thirteen", vec![])).unwrap();
        delete_user(&conn, created.id).unwrap();

        update_user(
            &conn,
            created.id,
            &UserUpdateRequest {
                password: None,
                enabled: true,
                role_ids: None,
            },
        )
        .unwrap();
        assert_eq!(get_user(&conn, created.id).unwrap().username, "thirteen");
    }

    #[test]
    fn update_of_unknown_user_is_not_found() {
        let conn = open_memory_database().unwrap();
        let req = UserUpdateRequest {
            password: None,
            enabled: true,
            role_ids: None,
        };
        assert!(matches!(
            update_user(&conn, 404, &req),
            Err(ServiceError::NotFound { entity: EntityKind::User, id: 404 })
        ));
    }

    #[test]
    fn patient_login_carries_linked_patient() {
        let conn = open_memory_database().unwrap();
        let john = fixtures::patient(&conn, "John", "Doe", None);
        let caller = authenticate(&conn, "John Doe", fixtures::PATIENT_PASSWORD).unwrap();
        assert_eq!(caller.roles, vec![RoleName::Patient]);
        assert_eq!(caller.patient_id, Some(john));
    }

    #[test]
    fn bootstrap_admin_is_created_once() {
        let conn = open_memory_database().unwrap();
        assert_eq!(ensure_bootstrap_admin(&conn, "admin", None).unwrap(), None);

        let id = ensure_bootstrap_admin(&conn, "admin", Some("s3cret")).unwrap();
        assert!(id.is_some());
        assert_eq!(ensure_bootstrap_admin(&conn, "admin", Some("s3cret")).unwrap(), None);

        let caller = authenticate(&conn, "admin", "s3cret").unwrap();
        assert!(caller.has_role(RoleName::Admin));
    }
}
