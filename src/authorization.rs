//! Role-based access for authenticated callers.
//!
//! Default-deny: a caller reaches an operation only when it holds one of the
//! roles the operation lists. PATIENT callers are further scoped to the
//! patient their account is linked to.

use crate::models::enums::RoleName;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Authenticated identity, resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<RoleName>,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
}

impl Caller {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, allowed: &[RoleName]) -> bool {
        allowed.iter().any(|r| self.has_role(*r))
    }
}

// ═══════════════════════════════════════════════════════════
// Role gates
// ═══════════════════════════════════════════════════════════

pub const ADMIN_ONLY: &[RoleName] = &[RoleName::Admin];
pub const STAFF: &[RoleName] = &[RoleName::Admin, RoleName::Doctor];
pub const PATIENT_ONLY: &[RoleName] = &[RoleName::Patient];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("{username} lacks a required role ({required})")]
    MissingRole { username: String, required: String },
    #[error("{0} is not linked to a patient record")]
    NoLinkedPatient(String),
}

/// Allow the caller if it holds any of `allowed`.
pub fn require_any(caller: &Caller, allowed: &[RoleName]) -> Result<(), AuthorizationError> {
    if caller.has_any_role(allowed) {
        return Ok(());
    }
    Err(AuthorizationError::MissingRole {
        username: caller.username.clone(),
        required: allowed
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Patient id a PATIENT caller may read its own records through.
pub fn own_patient_id(caller: &Caller) -> Result<i64, AuthorizationError> {
    require_any(caller, PATIENT_ONLY)?;
    caller
        .patient_id
        .ok_or_else(|| AuthorizationError::NoLinkedPatient(caller.username.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(roles: &[RoleName], patient_id: Option<i64>) -> Caller {
        Caller {
            user_id: 1,
            username: "someone".into(),
            roles: roles.to_vec(),
            doctor_id: None,
            patient_id,
        }
    }

    #[test]
    fn admin_passes_staff_gate() {
        assert!(require_any(&caller(&[RoleName::Admin], None), STAFF).is_ok());
    }

    #[test]
    fn doctor_is_denied_admin_gate() {
        let err = require_any(&caller(&[RoleName::Doctor], None), ADMIN_ONLY).unwrap_err();
        assert!(matches!(err, AuthorizationError::MissingRole { .. }));
    }

    #[test]
    fn caller_without_roles_is_denied_everywhere() {
        let nobody = caller(&[], Some(3));
        for gate in [ADMIN_ONLY, STAFF, PATIENT_ONLY] {
            assert!(require_any(&nobody, gate).is_err());
        }
    }

    #[test]
    fn patient_resolves_own_patient_id() {
        assert_eq!(own_patient_id(&caller(&[RoleName::Patient], Some(7))), Ok(7));
    }

    #[test]
    fn unlinked_patient_account_is_denied() {
        assert_eq!(
            own_patient_id(&caller(&[RoleName::Patient], None)),
            Err(AuthorizationError::NoLinkedPatient("someone".into()))
        );
    }

    #[test]
    fn admin_has_no_own_patient_records() {
        assert!(own_patient_id(&caller(&[RoleName::Admin], Some(7))).is_err());
    }
}
