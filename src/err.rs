use std::fmt;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

/// Successful body: `{ "success": true, ...value }`.
#[derive(Debug, Clone, Serialize)]
pub struct Success<V> {
    success: bool,
    #[serde(flatten)]
    value: V,
}

impl<V: Serialize> Success<V> {
    pub fn of(value: V) -> Self {
        Self {
            success: true,
            value,
        }
    }
}

/// Empty payload for endpoints that only acknowledge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Done {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Unauthorized,
    AccessDenied,
    Validation { message: String },
    InvalidCredentials,
    InvalidCurrentPassword,
    WeakPassword,
    PasswordMismatch,
    NotFound { message: String },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn invalid<S: Into<String>>(msg: S) -> Error {
        Error::Validation {
            message: msg.into(),
        }
    }

    pub fn internal<D: fmt::Display>(kind: &'static str, err: D) -> Error {
        Error::InternalError {
            kind,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::AccessDenied | Error::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Error::Validation { .. }
            | Error::InvalidCurrentPassword
            | Error::WeakPassword
            | Error::PasswordMismatch => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details stay in the server log.
    pub fn message(&self) -> String {
        match self {
            Error::Unauthorized => "Unauthorized".to_string(),
            Error::AccessDenied => "Access Denied".to_string(),
            Error::Validation { message } | Error::NotFound { message } => message.clone(),
            Error::InvalidCredentials => "Invalid Admin Credentials".to_string(),
            Error::InvalidCurrentPassword => "Current password is incorrect".to_string(),
            Error::WeakPassword => "New password must be at least 6 characters".to_string(),
            Error::PasswordMismatch => "New passwords do not match".to_string(),
            Error::InternalError { .. } => "Internal Server Error".to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InternalError { kind, message } => write!(f, "{}: {}", kind, message),
            other => f.write_str(&other.message()),
        }
    }
}

impl std::error::Error for Error {}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.message())?;
        map.end()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Error::InternalError { kind, message } = &self {
            log::error!("{}: {}", kind, message);
        }
        (self.status(), Json(self)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::internal("DatabaseError", err)
    }
}

impl From<pbkdf2::password_hash::Error> for Error {
    fn from(err: pbkdf2::password_hash::Error) -> Self {
        Self::internal("PasswordHashError", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::internal("SerializationError", err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal("TaskError", err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Unknown", format!("{:#}", err))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}
