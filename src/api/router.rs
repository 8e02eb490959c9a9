//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. No-store header → 2. Auth validator → 3. Audit logger

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_api_router(ctx: ApiContext) -> Router {
    use endpoints::{admin, diagnoses, doctors, examinations, hospital_records, patients};

    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/doctors", get(doctors::list).post(doctors::create))
        .route("/doctors/with-patients", get(doctors::with_patients))
        .route("/doctors/examination-counts", get(doctors::examination_counts))
        .route(
            "/doctors/:id",
            get(doctors::detail).put(doctors::update).delete(doctors::remove),
        )
        .route("/patients", get(patients::list).post(patients::create))
        .route("/patients/with-examinations", get(patients::with_examinations))
        .route("/patients/by-diagnosis/:id", get(patients::by_diagnosis))
        .route("/patients/by-doctor/:id", get(patients::by_doctor))
        .route(
            "/patients/:id",
            get(patients::detail).put(patients::update).delete(patients::remove),
        )
        .route("/diagnoses", get(diagnoses::list).post(diagnoses::create))
        .route("/diagnoses/most-common", get(diagnoses::most_common))
        .route(
            "/diagnoses/:id",
            get(diagnoses::detail)
                .put(diagnoses::update)
                .delete(diagnoses::remove),
        )
        .route("/examinations", get(examinations::list).post(examinations::create))
        .route("/examinations/mine", get(examinations::mine))
        .route("/examinations/by-doctor", get(examinations::by_doctor))
        .route(
            "/examinations/:id",
            get(examinations::detail)
                .put(examinations::update)
                .delete(examinations::remove),
        )
        .route(
            "/hospital-records",
            get(hospital_records::list).post(hospital_records::create),
        )
        .route("/hospital-records/by-date", get(hospital_records::by_date))
        .route("/hospital-records/busiest-month", get(hospital_records::busiest_month))
        .route("/hospital-records/busiest-doctor", get(hospital_records::busiest_doctor))
        .route(
            "/hospital-records/:id",
            get(hospital_records::detail)
                .put(hospital_records::update)
                .delete(hospital_records::remove),
        )
        .route("/admin/roles", get(admin::list_roles).post(admin::create_role))
        .route(
            "/admin/roles/:id",
            get(admin::role_detail)
                .put(admin::update_role)
                .delete(admin::remove_role),
        )
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/:id",
            get(admin::user_detail)
                .put(admin::update_user)
                .delete(admin::remove_user),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Clinical data must never land in a shared cache
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (audited, no auth required)
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", protected.merge(unprotected))
}
