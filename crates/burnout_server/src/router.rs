//! Router construction for the burnout tracker server.

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_mw,
    routing::{get, patch, post},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::jwt::{jwt_auth, JwtConfig};
use crate::state::Services;

/// Browser access for a single origin, cookies and auth headers allowed.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the full axum router with all routes and middleware, nested under `/api`.
pub fn build_router(services: Services, jwt_config: JwtConfig, cors_origin: HeaderValue) -> Router {
    // Routes that require JWT authentication
    let protected = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/admin-only", get(handlers::home::admin_only))
        .route("/student-only", get(handlers::home::student_only))
        // Users
        .route("/users", get(handlers::users::list))
        .route(
            "/users/:id",
            get(handlers::users::get)
                .patch(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route("/users/:id/status", patch(handlers::users::update_status))
        .route(
            "/users/username/:username",
            get(handlers::users::get_by_username),
        )
        .route("/users/role/:role", get(handlers::users::list_by_role))
        // Evaluations
        .route(
            "/evaluations",
            post(handlers::evaluations::submit).get(handlers::evaluations::list_all),
        )
        .route(
            "/evaluations/:id",
            get(handlers::evaluations::get).delete(handlers::evaluations::delete),
        )
        .route(
            "/evaluations/user/:user_id",
            get(handlers::evaluations::list_for_user),
        )
        .route(
            "/evaluations/username/:username",
            get(handlers::evaluations::list_for_username),
        )
        .route(
            "/evaluations/:id/set-meeting",
            patch(handlers::evaluations::schedule_meeting),
        )
        .route(
            "/evaluations/:id/handle",
            patch(handlers::evaluations::mark_handled),
        )
        .route(
            "/evaluations/student/meeting",
            get(handlers::evaluations::student_meeting),
        )
        .route("/my-evaluations", get(handlers::evaluations::list_mine))
        // Notifications
        .route(
            "/notifications",
            get(handlers::notifications::list).post(handlers::notifications::echo),
        )
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt_config));

    // Public routes (no auth)
    let public = Router::new()
        .route("/", get(handlers::home::welcome))
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(Extension(services.credentials))
        .layer(Extension(services.evaluations))
        .layer(Extension(services.gate))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}
