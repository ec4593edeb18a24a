use sqlx::SqlitePool;

use crate::db::models::User;

pub async fn create_user_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            firstname TEXT NOT NULL,
            lastname TEXT NOT NULL,
            username TEXT UNIQUE NOT NULL,
            age INTEGER,
            password_hash TEXT NOT NULL,
            auth_token TEXT UNIQUE,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, firstname, lastname, username, age, password_hash, auth_token, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.firstname)
    .bind(&user.lastname)
    .bind(&user.username)
    .bind(user.age)
    .bind(&user.password_hash)
    .bind(&user.auth_token)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE auth_token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Updates the mutable fields of a record. Identity, username, auth token
/// and creation time are fixed for the life of the record.
pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users SET firstname = ?, lastname = ?, age = ?, password_hash = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.firstname)
    .bind(&user.lastname)
    .bind(user.age)
    .bind(&user.password_hash)
    .bind(&user.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// True when the error is the storage layer refusing a duplicate username
/// or auth token. Uniqueness lives in the schema, not application locks,
/// so concurrent creates can never race two records onto the same value.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_user_table(&pool).await.unwrap();
        pool
    }

    fn sample_user(username: &str, token: &str) -> User {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            username: username.to_string(),
            age: Some(36),
            password_hash: "$argon2id$fake".to_string(),
            auth_token: Some(token.to_string()),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = test_pool().await;
        let user = sample_user("ada", "tok_a");
        insert_user(&pool, &user).await.unwrap();

        let found = find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "ada");
        assert_eq!(found.auth_token.as_deref(), Some("tok_a"));

        let by_token = find_by_token(&pool, "tok_a").await.unwrap().unwrap();
        assert_eq!(by_token.id, user.id);

        assert!(find_by_token(&pool, "tok_missing").await.unwrap().is_none());
        assert!(find_by_id(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = test_pool().await;
        insert_user(&pool, &sample_user("ada", "tok_a")).await.unwrap();

        let err = insert_user(&pool, &sample_user("ada", "tok_b"))
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(list_users(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let pool = test_pool().await;
        insert_user(&pool, &sample_user("ada", "tok_a")).await.unwrap();

        let err = insert_user(&pool, &sample_user("grace", "tok_a"))
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_keeps_token() {
        let pool = test_pool().await;
        let mut user = sample_user("ada", "tok_a");
        insert_user(&pool, &user).await.unwrap();

        user.firstname = "Augusta".to_string();
        user.age = Some(37);
        update_user(&pool, &user).await.unwrap();

        let found = find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(found.firstname, "Augusta");
        assert_eq!(found.age, Some(37));
        assert_eq!(found.auth_token.as_deref(), Some("tok_a"));
    }

    #[tokio::test]
    async fn test_list_users() {
        let pool = test_pool().await;
        insert_user(&pool, &sample_user("ada", "tok_a")).await.unwrap();
        insert_user(&pool, &sample_user("grace", "tok_b")).await.unwrap();

        let users = list_users(&pool).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
