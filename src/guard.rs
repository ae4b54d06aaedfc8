//! Request guards for the two session kinds.
//!
//! Each guard either attaches an identity to the request extensions and runs
//! the handler, or answers 401 without reaching it.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::err::Error;
use crate::session::{ADMIN_SESSION_COOKIE, STUDENT_SESSION_COOKIE};
use crate::AppState;

fn cookie_value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(|cookie| cookie.value()).filter(|value| !value.is_empty())
}

/// Resolves the delegated session with the identity provider on every request.
/// Attaches a [`ProviderUser`](crate::models::ProviderUser).
pub async fn require_student(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = cookie_value(&jar, STUDENT_SESSION_COOKIE).ok_or(Error::Unauthorized)?;
    let user = match state.provider.resolve_session(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(Error::Unauthorized),
        Err(err) => {
            log::warn!("Could not resolve student session: {:#}", err);
            return Err(Error::internal("IdentityProvider", err));
        }
    };
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Trusts the signed admin cookie without touching the store.
/// Attaches [`AdminClaims`](crate::session::AdminClaims).
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let claims = cookie_value(&jar, ADMIN_SESSION_COOKIE)
        .and_then(|token| state.admin.codec().decode(token).ok())
        .ok_or(Error::AccessDenied)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
