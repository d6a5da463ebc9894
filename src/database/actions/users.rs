use crate::{
    authentication::cryptography::{hash_password, validate_password_strength, verify_password},
    authentication::jwt::{generate_jwt_session, SessionData},
    error::{ApiError, Error, QueryError},
    schema::{NewUser, User, UserProfile, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Registers a new account. Email and username uniqueness is enforced by the
/// store; a clash surfaces as a conflict instead of a duplicate row.
pub async fn register_user(new_user: NewUser, pool: &Pool<Postgres>) -> Result<Uuid, Error> {
    validate_new_user(&new_user)?;

    let password = hash_password(&new_user.password)
        .map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password, role)
        VALUES ($1, $2, $3, $4, $5, 'user')
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(password)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match row {
        Some((id,)) => Ok(id),
        None => Err(ApiError::Conflict.new("Email or username is already taken")),
    }
}

pub async fn login_user(
    username: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = match get_user(pool, username).await? {
        Some(user) => user,
        None => return Err(ApiError::InvalidRequest.new("Invalid credentials")),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;
    if !authenticated {
        return Err(ApiError::InvalidRequest.new("Invalid credentials"));
    }

    Ok(generate_jwt_session(&user))
}

/// Changes the session user's password after verifying the current one.
pub async fn set_password(
    current: &str,
    new: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let user = match get_user_by_id(pool, session.user_id).await? {
        Some(user) => user,
        None => return Err(ApiError::NotFound.new("No user exists with specified id")),
    };

    let authenticated = verify_password(current, &user.password)
        .map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;
    if !authenticated {
        return Err(ApiError::InvalidRequest.new("Current password is incorrect"));
    }

    validate_password_strength(new)?;
    let password =
        hash_password(new).map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Public profile with `is_subscribed` relative to the session user;
/// anonymous readers are never subscribed.
pub async fn get_user_profile(
    user_id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserProfile>, Error> {
    let viewer = session.map(|s| s.user_id).unwrap_or(0);

    let row: Option<UserProfile> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            EXISTS (
                SELECT 1 FROM subscriptions s
                WHERE s.user_id = $2 AND s.author_id = u.id
            ) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(user_id)
    .bind(viewer)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

fn validate_new_user(new_user: &NewUser) -> Result<(), Error> {
    let (local, domain) = match new_user.email.split_once('@') {
        Some(parts) => parts,
        None => return Err(ApiError::InvalidRequest.new("Invalid email address")),
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::InvalidRequest.new("Invalid email address"));
    }

    if new_user.username.trim().is_empty() {
        return Err(ApiError::InvalidRequest.new("Username cannot be empty"));
    }

    validate_password_strength(&new_user.password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: "Co".into(),
            last_name: "Ok".into(),
            password: "long enough".into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_registration() {
        assert!(validate_new_user(&new_user()).is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "plain", "@example.com", "cook@", "cook@nodot"] {
            let mut user = new_user();
            user.email = email.into();
            assert!(validate_new_user(&user).is_err(), "accepted {email:?}");
        }
    }

    #[test]
    fn rejects_short_passwords() {
        let mut user = new_user();
        user.password = "short".into();
        assert_eq!(validate_new_user(&user).unwrap_err().code, 400);
    }

    #[test]
    fn rejects_blank_usernames() {
        let mut user = new_user();
        user.username = "   ".into();
        assert!(validate_new_user(&user).is_err());
    }
}
