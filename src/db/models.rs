use sqlx::FromRow;

/// A persisted user record. The password hash and auth token never leave
/// the db layer in this shape; API-facing views live in `api::users`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub age: Option<i64>,
    pub password_hash: String,
    /// Assigned exactly once, at creation. Never regenerated implicitly.
    pub auth_token: Option<String>,
    pub created_at: i64,
}
