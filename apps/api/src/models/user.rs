use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of `users`. The password hash never leaves this type.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub is_verified: bool,
}

/// The public view of a user, as returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_verified: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            is_verified: row.is_verified,
        }
    }
}
