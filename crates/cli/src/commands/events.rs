//! Event commands, including the live feed watcher.

use clap::Subcommand;

use rallypoint_client::Client;
use rallypoint_client::models::Event;
use rallypoint_core::ClubId;

use super::CommandError;

#[derive(Subcommand)]
pub enum EventsAction {
    /// List events for a club (or all public events)
    List {
        /// Club id; omit for the public feed
        #[arg(short, long)]
        club: Option<String>,
    },
    /// Watch events live, printing every update until Ctrl+C.
    ///
    /// Exercises the push channel; if it fails the watch silently
    /// continues on a 30s poll.
    Watch {
        /// Club id; omit for the public feed
        #[arg(short, long)]
        club: Option<String>,
    },
}

#[allow(clippy::print_stdout)]
fn print_events(events: &[Event]) {
    for event in events {
        let spots = event.max_attendees.map_or_else(
            || format!("{} attending", event.attendees.len()),
            |max| format!("{}/{max} attending", event.attendees.len()),
        );
        println!(
            "{}  {}  {} [{}] {spots}",
            event.id,
            event.start_time.format("%Y-%m-%d %H:%M"),
            event.title,
            event.club_name,
        );
    }
}

#[allow(clippy::print_stdout)]
pub async fn run(client: &Client, action: EventsAction) -> Result<(), CommandError> {
    match action {
        EventsAction::List { club } => {
            let events = match club {
                Some(club) => client.events().list_for_club(&ClubId::new(club)).await?,
                None => client.events().list_public().await?,
            };
            print_events(&events);
        }
        EventsAction::Watch { club } => {
            let on_update = |events: Vec<Event>| {
                println!("--- {} events ---", events.len());
                print_events(&events);
            };

            let subscription = match club {
                Some(club) => client
                    .events()
                    .subscribe_for_club(&ClubId::new(club), on_update),
                None => client.events().subscribe_public(on_update),
            };

            println!("watching; Ctrl+C to stop");
            tokio::signal::ctrl_c()
                .await
                .map_err(rallypoint_client::ClientError::from)?;
            subscription.cancel();
        }
    }
    Ok(())
}
