//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod clubs;
pub mod events;
pub mod shop;

use rallypoint_client::Client;
use rallypoint_core::Email;

/// Errors shared by the command modules.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Session credentials are missing.
    #[error(
        "sign-in required: pass -e/-p or set RALLYPOINT_EMAIL and RALLYPOINT_PASSWORD"
    )]
    MissingCredentials,

    /// The email did not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] rallypoint_core::EmailError),

    /// A client operation failed.
    #[error(transparent)]
    Client(#[from] rallypoint_client::ClientError),
}

/// Resolve credentials from flags or environment.
fn credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<(Email, String), CommandError> {
    let email = email
        .or_else(|| std::env::var("RALLYPOINT_EMAIL").ok())
        .ok_or(CommandError::MissingCredentials)?;
    let password = password
        .or_else(|| std::env::var("RALLYPOINT_PASSWORD").ok())
        .ok_or(CommandError::MissingCredentials)?;
    Ok((Email::parse(&email)?, password))
}

/// Sign in from flags or environment, returning the session user.
pub(crate) async fn sign_in(
    client: &Client,
    email: Option<String>,
    password: Option<String>,
) -> Result<rallypoint_client::models::SessionUser, CommandError> {
    let (email, password) = credentials(email, password)?;
    Ok(client.users().sign_in(&email, &password).await?)
}
