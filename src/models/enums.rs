use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Built-in authorities seeded by migration 002. Admin-created roles are
// stored as plain strings and never parse into this enum.
str_enum!(RoleName {
    Admin => "ROLE_ADMIN",
    Doctor => "ROLE_DOCTOR",
    Patient => "ROLE_PATIENT",
});

// Entity kinds, used to name the target of a failed lookup.
str_enum!(EntityKind {
    Doctor => "doctor",
    Patient => "patient",
    Diagnosis => "diagnosis",
    Examination => "examination",
    HospitalRecord => "hospital_record",
    User => "user",
    Role => "role",
});

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_name_round_trips_through_authority_string() {
        for role in [RoleName::Admin, RoleName::Doctor, RoleName::Patient] {
            assert_eq!(RoleName::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_authority_is_invalid_enum() {
        let err = RoleName::from_str("ROLE_NURSE").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn entity_kind_displays_as_snake_case() {
        assert_eq!(EntityKind::HospitalRecord.to_string(), "hospital_record");
    }
}
