//! Account commands.

use clap::Subcommand;

use rallypoint_client::Client;
use rallypoint_core::Email;

use super::CommandError;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create an account (credential + profile document)
    SignUp {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Sign in and print the merged session
    SignIn {
        /// Account email address
        #[arg(short, long)]
        email: Option<String>,

        /// Account password
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[allow(clippy::print_stdout)]
pub async fn run(client: &Client, action: AccountAction) -> Result<(), CommandError> {
    match action {
        AccountAction::SignUp {
            email,
            password,
            name,
        } => {
            let email = Email::parse(&email)?;
            let session = client.users().sign_up(&email, &password, &name).await?;
            println!("created account {} ({})", session.uid, session.email);
        }
        AccountAction::SignIn { email, password } => {
            let session = super::sign_in(client, email, password).await?;
            println!("signed in as {} ({})", session.uid, session.email);
            if let Some(name) = &session.display_name {
                println!("  display name: {name}");
            }
            match &session.profile {
                Some(profile) => println!("  profile: {} addresses", profile.addresses.len()),
                None => println!("  profile: unavailable (bare identity)"),
            }
        }
    }
    Ok(())
}
