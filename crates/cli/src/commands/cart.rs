//! Local cart commands.

use clap::Subcommand;

use rallypoint_client::Client;
use rallypoint_client::cart::CartStore;

use super::CommandError;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the locally persisted cart
    Show,
    /// Empty the cart
    Clear,
}

#[allow(clippy::print_stdout)]
pub async fn run(client: &Client, action: CartAction) -> Result<(), CommandError> {
    let cart = CartStore::load(client.config().cart_path.clone()).await;

    match action {
        CartAction::Show => {
            if cart.is_empty() {
                println!("cart is empty");
                return Ok(());
            }
            for line in cart.items() {
                let variant = line
                    .variant
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{}  {} x{}  {}  [{variant}]",
                    line.item_id, line.name, line.quantity, line.unit_price,
                );
            }
            println!("total: {}  ({} items)", cart.total(), cart.count());
        }
        CartAction::Clear => {
            cart.clear();
            cart.flush().await;
            println!("cart cleared");
        }
    }
    Ok(())
}
