use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "medical-record";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_PATIENT_PASSWORD: &str = "1234";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medical_record_lib=info,tower_http=warn"
}

/// Default database location: `<data dir>/medical-record/clinic.db`.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("clinic.db")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub admin_username: String,
    /// Bootstrap admin is only created when a password is configured.
    pub admin_password: Option<String>,
    /// Initial password for users created alongside patients.
    pub patient_password: String,
    pub session_ttl: Duration,
}

impl ClinicConfig {
    /// Read `CLINIC_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("CLINIC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let bind_raw = lookup("CLINIC_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "CLINIC_BIND_ADDR",
            expected: "socket address",
            value: bind_raw.clone(),
        })?;

        let session_ttl = match lookup("CLINIC_SESSION_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "CLINIC_SESSION_TTL_SECS",
                expected: "number of seconds",
                value: raw.clone(),
            })?),
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };

        Ok(Self {
            db_path,
            bind_addr,
            admin_username: lookup("CLINIC_ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.into()),
            admin_password: lookup("CLINIC_ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            patient_password: lookup("CLINIC_PATIENT_PASSWORD")
                .unwrap_or_else(|| DEFAULT_PATIENT_PASSWORD.into()),
            session_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ClinicConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClinicConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.admin_username, "admin");
        assert!(config.admin_password.is_none());
        assert_eq!(config.patient_password, "1234");
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert!(config.db_path.ends_with("medical-record/clinic.db"));
    }

    #[test]
    fn overrides_are_read() {
        let config = from_pairs(&[
            ("CLINIC_DB_PATH", "/tmp/c.db"),
            ("CLINIC_BIND_ADDR", "0.0.0.0:9000"),
            ("CLINIC_ADMIN_PASSWORD", "s3cret"),
            ("CLINIC_SESSION_TTL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/c.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(config.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn empty_admin_password_disables_bootstrap() {
        let config = from_pairs(&[("CLINIC_ADMIN_PASSWORD", "")]).unwrap();
        assert!(config.admin_password.is_none());
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let err = from_pairs(&[("CLINIC_BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CLINIC_BIND_ADDR", .. }));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
