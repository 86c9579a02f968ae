//! Club commands.

use clap::Subcommand;

use rallypoint_client::Client;
use rallypoint_client::clubs::JoinOutcome;
use rallypoint_client::models::NewClub;
use rallypoint_core::ClubId;

use super::CommandError;

#[derive(Subcommand)]
pub enum ClubsAction {
    /// List public clubs, or the signed-in user's clubs with --joined
    List {
        /// List clubs the signed-in user is a member of
        #[arg(long)]
        joined: bool,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a club owned by the signed-in user
    Create {
        /// Club title
        #[arg(short, long)]
        title: String,

        /// Make the club private (join by request)
        #[arg(long)]
        private: bool,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
    /// Join a club (direct for public clubs, request for private ones)
    Join {
        /// Club id
        #[arg(short, long)]
        club: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
}

#[allow(clippy::print_stdout)]
pub async fn run(client: &Client, action: ClubsAction) -> Result<(), CommandError> {
    match action {
        ClubsAction::List {
            joined,
            email,
            password,
        } => {
            let clubs = if joined {
                let session = super::sign_in(client, email, password).await?;
                client.clubs().list_joined(&session.uid).await?
            } else {
                client.clubs().list_public().await?
            };

            for club in clubs {
                let visibility = if club.is_public { "public" } else { "private" };
                println!(
                    "{}  {} [{visibility}] {} members",
                    club.id,
                    club.name,
                    club.members.len()
                );
            }
        }
        ClubsAction::Create {
            title,
            private,
            email,
            password,
        } => {
            super::sign_in(client, email, password).await?;
            let club = client
                .clubs()
                .create(NewClub {
                    title,
                    about: None,
                    is_public: !private,
                    category: None,
                    image_url: None,
                    location: None,
                })
                .await?;
            println!("created club {} ({})", club.id, club.name);
        }
        ClubsAction::Join {
            club,
            email,
            password,
        } => {
            super::sign_in(client, email, password).await?;
            match client.clubs().join(&ClubId::new(club)).await? {
                JoinOutcome::Joined => println!("joined"),
                JoinOutcome::Requested(id) => println!("join request {id} pending approval"),
            }
        }
    }
    Ok(())
}
