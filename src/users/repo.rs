use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::repo_types::{NewUser, User, UserChanges};
use crate::{
    auth::password::{hash_password, verify_password},
    error::AppError,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, is_active, is_staff, is_superuser";

/// Lower-case the domain part of an address; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn duplicate_email() -> AppError {
    AppError::field("email", "user with this email already exists.")
}

pub async fn create_user(db: &SqlitePool, new: NewUser) -> Result<User, AppError> {
    if new.email.trim().is_empty() {
        return Err(AppError::field("email", "Users must have an email address."));
    }
    let email = normalize_email(&new.email);
    let hash = hash_password(&new.password)?;

    let sql = format!(
        "INSERT INTO users (email, password_hash, name, is_active, is_staff, is_superuser) \
         VALUES (?, ?, ?, 1, ?, ?) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&email)
        .bind(&hash)
        .bind(&new.name)
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_email()
            } else {
                e.into()
            }
        })?;

    debug!(user_id = user.id, "user created");
    Ok(user)
}

pub async fn create_superuser(db: &SqlitePool, email: &str, password: &str) -> Result<User, AppError> {
    create_user(
        db,
        NewUser {
            email: email.to_string(),
            password: password.to_string(),
            is_staff: true,
            is_superuser: true,
            ..NewUser::default()
        },
    )
    .await
}

pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// `None` covers unknown email, wrong password and inactive accounts alike.
pub async fn authenticate(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = find_by_email(db, &normalize_email(email)).await? else {
        debug!("authenticate: unknown email");
        return Ok(None);
    };

    let ok = match verify_password(password, &user.password_hash) {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, user_id = user.id, "stored password hash unreadable");
            false
        }
    };

    if !ok || !user.is_active {
        debug!(user_id = user.id, active = user.is_active, "authenticate rejected");
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn update_user(db: &SqlitePool, id: i64, changes: UserChanges) -> Result<User, AppError> {
    let email = match changes.email {
        Some(email) if email.trim().is_empty() => {
            return Err(AppError::field("email", "Users must have an email address."));
        }
        Some(email) => Some(normalize_email(&email)),
        None => None,
    };
    let password_hash = changes.password.as_deref().map(hash_password).transpose()?;

    let sql = format!(
        "UPDATE users SET \
             email = COALESCE(?, email), \
             password_hash = COALESCE(?, password_hash), \
             name = COALESCE(?, name) \
         WHERE id = ? RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .bind(password_hash)
        .bind(changes.name)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_email()
            } else {
                e.into()
            }
        })?
        .ok_or(AppError::NotFound)?;

    debug!(user_id = user.id, "user updated");
    Ok(user)
}
