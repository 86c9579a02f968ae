//! Store commands.

use clap::Subcommand;

use rallypoint_client::Client;
use rallypoint_core::{ClubId, OrderStatus, OrderId};

use super::CommandError;

#[derive(Subcommand)]
pub enum StoreAction {
    /// List a club's active items
    Items {
        /// Club id
        #[arg(short, long)]
        club: String,
    },
    /// List a club's orders, newest first
    Orders {
        /// Club id
        #[arg(short, long)]
        club: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
    /// Move an order to a new status (stamps shipped/delivered times)
    SetStatus {
        /// Order id
        #[arg(short, long)]
        order: String,

        /// New status (pending, processing, shipped, delivered, picked_up, cancelled)
        #[arg(short, long)]
        status: OrderStatus,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
}

#[allow(clippy::print_stdout)]
pub async fn run(client: &Client, action: StoreAction) -> Result<(), CommandError> {
    match action {
        StoreAction::Items { club } => {
            let items = client.shop().list_items(&ClubId::new(club)).await?;
            for item in items {
                println!(
                    "{}  {}  {} {}  ({} in stock, {} sold)",
                    item.id,
                    item.name,
                    item.price,
                    item.currency.code(),
                    item.inventory,
                    item.sold,
                );
            }
        }
        StoreAction::Orders {
            club,
            email,
            password,
        } => {
            super::sign_in(client, email, password).await?;
            let orders = client.shop().list_orders_for_club(&ClubId::new(club)).await?;
            for order in orders {
                println!(
                    "{}  {}  x{} {}  {} {}",
                    order.id,
                    order.item_name,
                    order.quantity,
                    order.status,
                    order.total,
                    order.currency.code(),
                );
            }
        }
        StoreAction::SetStatus {
            order,
            status,
            email,
            password,
        } => {
            super::sign_in(client, email, password).await?;
            client
                .shop()
                .set_order_status(&OrderId::new(order), status)
                .await?;
            println!("order moved to {status}");
        }
    }
    Ok(())
}
