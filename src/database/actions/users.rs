use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{SessionData, SessionKeys},
    },
    error::StoreError,
    pagination::{Page, PageRequest},
    schema::{Credentials, Id, NewUser, PasswordChange, User, UserRow},
    validation::{validate_new_user, validate_password},
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, StoreError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Postgres>) -> Result<Option<User>, StoreError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn require_user(user_id: Id, pool: &Pool<Postgres>) -> Result<User, StoreError> {
    get_user_by_id(user_id, pool)
        .await?
        .ok_or(StoreError::NotFound("user"))
}

pub async fn get_users_by_ids(ids: &[Id], pool: &Pool<Postgres>) -> Result<Vec<User>, StoreError> {
    let rows: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn list_users(request: PageRequest, pool: &Pool<Postgres>) -> Result<Page<User>, StoreError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.email LIMIT $1 OFFSET $2",
    )
    .bind(request.limit)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(|row| row.user).collect();

    Page::checked(rows, total_count, request)
}

/// Creates a user; the password is stored as an argon2 hash. Email and
/// username clashes come back as field errors from the unique constraints.
pub async fn register_user(new_user: NewUser, pool: &Pool<Postgres>) -> Result<User, StoreError> {
    validate_new_user(&new_user)?;
    let password = hash_password(&new_user.password)?;

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(new_user.email.trim())
    .bind(new_user.username.trim())
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await?;

    log::info!("Registered user {} <{}>", user.id, user.email);

    Ok(user)
}

pub async fn login_user(
    credentials: Credentials,
    keys: &SessionKeys,
    pool: &Pool<Postgres>,
) -> Result<String, StoreError> {
    let invalid = || {
        StoreError::invalid(
            "non_field_errors",
            "Unable to log in with provided credentials",
        )
    };

    let user = get_user_by_email(&credentials.email, pool)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&credentials.password, &user.password) {
        return Err(invalid());
    }

    keys.generate_jwt_session(&user)
}

pub async fn set_password(
    change: PasswordChange,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), StoreError> {
    let user = get_user_by_id(session.user_id, pool)
        .await?
        .ok_or(StoreError::Unauthenticated)?;

    if !verify_password(&change.current_password, &user.password) {
        return Err(StoreError::invalid("current_password", "Invalid password"));
    }
    validate_password("new_password", &change.new_password)?;

    let password = hash_password(&change.new_password)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(())
}
