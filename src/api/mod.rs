//! Clinic JSON API.
//!
//! Routes are nested under `/api/` and protected by a middleware stack:
//! Auth → Audit → Handler. Login and health stay public.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
