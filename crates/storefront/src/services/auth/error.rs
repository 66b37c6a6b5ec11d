//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("Invalid email address")]
    InvalidEmail(#[from] freshdart_core::EmailError),

    /// Name shorter than the minimum.
    #[error("Name must be at least {min} characters")]
    NameTooShort { min: usize },

    /// Password too short.
    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Wrong password or unknown email.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("A user with this email already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
