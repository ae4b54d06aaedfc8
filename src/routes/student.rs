use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::{Deserialize, Serialize};

use crate::err::{Done, Error, Success};
use crate::models::{ProviderUser, StudentView};
use crate::session::{expired_cookie, session_cookie, STUDENT_SESSION_COOKIE, STUDENT_SESSION_MAX_AGE};
use crate::{proceeds, AppState, Payload};

fn upstream(err: anyhow::Error) -> Error {
    Error::internal("IdentityProvider", format!("{:#}", err))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectUrl {
    redirect_url: String,
}

pub async fn redirect_url(State(state): State<AppState>) -> Result<Json<RedirectUrl>, Error> {
    let redirect_url = state.provider.redirect_url("google").await.map_err(upstream)?;
    Ok(Json(RedirectUrl { redirect_url }))
}

#[derive(Debug, Deserialize)]
pub struct NewSession {
    #[serde(default)]
    code: Option<String>,
}

pub async fn create_session(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<NewSession>, Error>,
) -> Result<impl IntoResponse, Error> {
    let code = body
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::invalid("No authorization code provided"))?;
    let token = state.provider.exchange_code(&code).await.map_err(upstream)?;

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(STUDENT_SESSION_COOKIE, &token, STUDENT_SESSION_MAX_AGE),
        )],
        Json(Success::of(Done {})),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<ProviderUser>,
) -> Result<Json<StudentView>, Error> {
    Ok(Json(state.students.ensure_student(&user).await?))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    college_name: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<ProviderUser>,
    WithRejection(Json(body), _): WithRejection<Json<ProfileUpdate>, Error>,
) -> Payload<Done> {
    let college_name = body
        .college_name
        .ok_or_else(|| Error::invalid("College name is required"))?;
    state.students.complete_profile(&user, &college_name).await?;
    proceeds(Done {})
}

/// Always clears the cookie; a failed provider call is only logged.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let token = jar
        .get(STUDENT_SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());
    if let Some(token) = token {
        if let Err(err) = state.provider.delete_session(&token).await {
            log::warn!("Could not end student session at the provider: {:#}", err);
        }
    }

    (
        [(header::SET_COOKIE, expired_cookie(STUDENT_SESSION_COOKIE))],
        Json(Success::of(Done {})),
    )
}
