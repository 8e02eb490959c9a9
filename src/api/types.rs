//! Shared state for the clinic API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::config::ClinicConfig;
use crate::crypto::{generate_token, hash_token};
use crate::db::{self, DatabaseError};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<ClinicConfig>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(config: ClinicConfig) -> Self {
        let ttl = config.session_ttl;
        Self {
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(SessionStore::new(ttl))),
        }
    }

    /// Fresh connection for one request.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.config.db_path)
    }
}

// ═══════════════════════════════════════════════════════════
// Session store: bearer tokens issued at login
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct SessionEntry {
    user_id: i64,
    expires: Instant,
}

/// In-memory bearer sessions. Only the SHA-256 of each token is kept.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<[u8; 32], SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Issue a token for `user_id`. Returns the plaintext token once.
    pub fn issue(&mut self, user_id: i64) -> String {
        // Periodic cleanup when the store grows large
        if self.sessions.len() > 1000 {
            self.cleanup();
        }
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            SessionEntry {
                user_id,
                expires: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// User behind a live token. Expired tokens are dropped.
    pub fn resolve(&mut self, token: &str) -> Option<i64> {
        let key = hash_token(token);
        match self.sessions.get(&key) {
            Some(entry) if Instant::now() < entry.expires => Some(entry.user_id),
            Some(_) => {
                self.sessions.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| now < entry.expires);
    }
}
