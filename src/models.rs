use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    /// User id issued by the identity provider, or `admin-<uuid>` for rows created by an admin.
    pub external_identity: String,
    pub email: String,
    pub name: Option<String>,
    pub college_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Never serialized: the row carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentStats {
    pub total_students: i64,
    pub new_students_this_week: i64,
}

/// User record as resolved by the identity provider. Unknown fields are kept
/// so `/api/users/me` can hand the full record back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub google_user_data: GoogleUserData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleUserData {
    pub name: Option<String>,
    pub given_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderUser {
    pub fn display_name(&self) -> &str {
        let data = &self.google_user_data;
        data.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| data.given_name.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or("Student")
    }
}

/// Provider identity merged with the locally stored profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentView {
    #[serde(flatten)]
    pub user: ProviderUser,
    pub college_name: Option<String>,
}
