use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminSummary, LoggedInAdmin};
use crate::err::{Done, Error, Success};
use crate::models::{Student, StudentStats};
use crate::session::{
    expired_cookie, session_cookie, AdminClaims, ADMIN_SESSION_COOKIE, ADMIN_SESSION_MAX_AGE,
};
use crate::{proceeds, AppState, Payload};

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Blank optional text is stored as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoggedIn {
    admin: AdminSummary,
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<AdminLogin>, Error>,
) -> Result<impl IntoResponse, Error> {
    if !looks_like_email(&body.email) {
        return Err(Error::invalid("A valid email is required"));
    }
    if body.password.is_empty() {
        return Err(Error::invalid("Password is required"));
    }

    let LoggedInAdmin { admin, token } = state.admin.login(&body.email, &body.password).await?;
    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(ADMIN_SESSION_COOKIE, &token, ADMIN_SESSION_MAX_AGE),
        )],
        Json(Success::of(AdminLoggedIn { admin })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_cookie(ADMIN_SESSION_COOKIE))],
        Json(Success::of(Done {})),
    )
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StudentStats>, Error> {
    Ok(Json(state.store.student_stats().await?))
}

pub async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, Error> {
    Ok(Json(state.store.list_students().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewStudent {
    #[serde(default)]
    email: String,
    name: Option<String>,
    college_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedStudent {
    id: i64,
}

pub async fn create_student(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    WithRejection(Json(body), _): WithRejection<Json<NewStudent>, Error>,
) -> Payload<CreatedStudent> {
    if !looks_like_email(&body.email) {
        return Err(Error::invalid("A valid email is required"));
    }
    let name = body.name.ok_or_else(|| Error::invalid("Name is required"))?;
    let college_name = non_blank(body.college_name);

    // not a provider id, so the row can never be claimed by a student login
    let external_identity = format!("admin-{}", Uuid::new_v4());
    let id = state
        .store
        .insert_student(
            &external_identity,
            &body.email,
            Some(name.trim()),
            college_name.as_deref(),
        )
        .await?;
    log::info!("Admin {} created student {}", admin.email, id);
    proceeds(CreatedStudent { id })
}

#[derive(Debug, Deserialize)]
pub struct StudentUpdate {
    name: Option<String>,
    college_name: Option<String>,
}

pub async fn update_student(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(body), _): WithRejection<Json<StudentUpdate>, Error>,
) -> Payload<Done> {
    if body.name.is_none() && body.college_name.is_none() {
        return Err(Error::invalid("No fields to update"));
    }
    let name = body.name.as_deref().map(str::trim);
    let college_name = body.college_name.as_deref().map(str::trim);

    if state.store.update_student(id, name, college_name).await? == 0 {
        return Err(Error::NotFound {
            message: "Student not found".to_string(),
        });
    }
    proceeds(Done {})
}

/// Deleting an id that does not exist still succeeds.
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Payload<Done> {
    if state.store.delete_student(id).await? > 0 {
        log::info!("Admin {} deleted student {}", admin.email, id);
    }
    proceeds(Done {})
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
    confirm_password: Option<String>,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    WithRejection(Json(body), _): WithRejection<Json<PasswordChange>, Error>,
) -> Payload<Done> {
    if body.current_password.is_empty() {
        return Err(Error::invalid("Current password is required"));
    }
    if let Some(confirm) = &body.confirm_password {
        if *confirm != body.new_password {
            return Err(Error::PasswordMismatch);
        }
    }

    state
        .admin
        .change_password(&admin, &body.current_password, &body.new_password)
        .await?;
    proceeds(Done {})
}
