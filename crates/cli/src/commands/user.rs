//! Marketplace account management.
//!
//! ```bash
//! fd-cli user create -e lito@farm.ph -n "Lito Reyes" -r PRODUCER -p 'long-password'
//! fd-cli user list --role MERCHANT
//! fd-cli user set-password -e lito@farm.ph -p 'new-long-password'
//! ```

use freshdart_core::{Email, UserRole};
use freshdart_storefront::db::{RepositoryError, UserRepository};
use freshdart_storefront::services::auth::{
    AuthError, AuthService, hash_password, validate_password,
};

use super::{ConnectError, connect};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid role: {0}. Valid roles: CUSTOMER, MERCHANT, PRODUCER")]
    InvalidRole(String),

    #[error("No user with email: {0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

fn parse_role(role: &str) -> Result<UserRole, UserError> {
    role.to_uppercase()
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))
}

/// Create an account with a password.
///
/// # Errors
///
/// Returns an error for an invalid role, name, email or password, or if
/// the email is already registered.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<i32, UserError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&pool)
        .register(name, email, password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id.as_i32())
}

/// Log every account, optionally only one role.
///
/// # Errors
///
/// Returns an error for an invalid role or a failed query.
pub async fn list(role: Option<&str>) -> Result<(), UserError> {
    let role = role.map(parse_role).transpose()?;
    let pool = connect().await?;

    let users = UserRepository::new(&pool).list(role).await?;

    tracing::info!("{} users", users.len());
    for user in users {
        tracing::info!(
            "  #{:<5} {:<9} {:<32} {}",
            user.id.as_i32(),
            user.role.as_str(),
            user.email.as_str(),
            user.name
        );
    }
    Ok(())
}

/// Replace an account's password.
///
/// # Errors
///
/// Returns an error if the password is too short or the email is unknown.
pub async fn set_password(email: &str, password: &str) -> Result<(), UserError> {
    let parsed = Email::parse(email).map_err(AuthError::from)?;
    validate_password(password)?;
    let pool = connect().await?;

    let users = UserRepository::new(&pool);
    let user = users
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_owned()))?;

    users
        .set_password_hash(user.id, &hash_password(password)?)
        .await?;

    tracing::info!("Password updated for {}", user.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_is_case_insensitive() {
        assert!(matches!(parse_role("producer"), Ok(UserRole::Producer)));
        assert!(matches!(parse_role("MERCHANT"), Ok(UserRole::Merchant)));
        assert!(matches!(parse_role("admin"), Err(UserError::InvalidRole(_))));
    }
}
