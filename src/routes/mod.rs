pub mod admin;
pub mod student;


use axum::http::{header, Method};
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::err::handler404;
use crate::{guard, proceeds, AppState, Payload};

pub fn router(state: AppState) -> Router {
    let students = Router::new()
        .route("/api/users/me", get(student::me))
        .route("/api/users/profile", put(student::update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_student,
        ));

    let admins = Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route(
            "/api/admin/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route(
            "/api/admin/students/:id",
            put(admin::update_student).delete(admin::delete_student),
        )
        .route("/api/admin/change-password", put(admin::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_admin,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/oauth/google/redirect_url", get(student::redirect_url))
        .route("/api/sessions", post(student::create_session))
        .route("/api/logout", get(student::logout))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", get(admin::logout).post(admin::logout))
        .merge(students)
        .merge(admins)
        .fallback(handler404)
        .layer(cors())
        .with_state(state)
}

/// Browsers send the session cookies cross-origin, so the origin is echoed
/// back instead of `*`.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Payload<Health> {
    proceeds(Health { status: "ok" })
}
