//! Club store operations: items, orders, and the address book.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{instrument, warn};

use rallypoint_core::{AddressId, ClubId, DeliveryMethod, OrderId, OrderStatus, StoreItemId, UserId};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{
    NewAddress, NewOrder, NewStoreItem, ShippingAddress, StoreItem, StoreItemPatch, StoreOrder,
    StoreOrderFields, UserProfileFields,
};
use crate::store::{Query, collections};

/// Store operations, borrowed from a [`Client`].
pub struct Shop<'a> {
    client: &'a Client,
}

impl<'a> Shop<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// List a new store item under a club.
    ///
    /// Fetches the club to denormalize its name onto the item.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the club does not exist.
    #[instrument(skip(self, new), fields(club = %new.club_id, name = %new.name))]
    pub async fn create_item(&self, new: NewStoreItem) -> Result<StoreItem> {
        self.client.require_uid()?;
        let club = self.client.clubs().get(&new.club_id).await?;

        let fields = new.into_fields(club.name);
        let doc = self
            .client
            .store()
            .create(collections::STORE_ITEMS, &fields)
            .await?;
        Ok(StoreItem::from_doc(doc))
    }

    /// Read one store item.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the item does not exist.
    #[instrument(skip(self), fields(item = %id))]
    pub async fn get_item(&self, id: &StoreItemId) -> Result<StoreItem> {
        let doc = self
            .client
            .store()
            .get(collections::STORE_ITEMS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("store item {id}")))?;
        Ok(StoreItem::from_doc(doc))
    }

    /// List a club's active items, sorted by name client-side.
    ///
    /// # Errors
    ///
    /// Returns a store error; callers rendering an empty state can
    /// `unwrap_or_default()`.
    #[instrument(skip(self), fields(club = %club))]
    pub async fn list_items(&self, club: &ClubId) -> Result<Vec<StoreItem>> {
        let docs = self
            .client
            .store()
            .query(
                collections::STORE_ITEMS,
                &Query::all()
                    .filter_eq("clubId", club.as_str())
                    .filter_eq("active", true),
            )
            .await?;
        let mut items: Vec<StoreItem> = docs.into_iter().map(StoreItem::from_doc).collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Apply a field-by-field item update.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the item does not exist.
    #[instrument(skip(self, patch), fields(item = %id))]
    pub async fn update_item(&self, id: &StoreItemId, patch: StoreItemPatch) -> Result<()> {
        self.client
            .store()
            .patch(collections::STORE_ITEMS, id.as_str(), &patch)
            .await
            .map_err(|e| ClientError::from_store(e, || format!("store item {id}")))
    }

    /// Delete an item.
    ///
    /// Soft delete: the `active` flag is flipped so existing orders keep a
    /// valid reference. Associated images are removed best-effort;
    /// failures there are logged, never surfaced.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the item does not exist.
    #[instrument(skip(self), fields(item = %id))]
    pub async fn delete_item(&self, id: &StoreItemId) -> Result<()> {
        let item = self.get_item(id).await?;

        self.client
            .store()
            .patch(collections::STORE_ITEMS, id.as_str(), &json!({ "active": false }))
            .await?;

        for url in &item.images {
            if let Err(e) = self.client.blobs().delete_by_url(url).await {
                warn!(url = %url, error = %e, "item image cleanup failed");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order as the signed-in user.
    ///
    /// Creates the order document, then bumps the item's sold counter via
    /// read-then-write (concurrent orders can under-count; the order
    /// itself is never lost). A failure on the counter write is logged,
    /// not surfaced - the order already exists.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` for inactive items and
    /// `ClientError::InvalidInput` for a shipping order without an
    /// address or a zero quantity.
    #[instrument(skip(self, new), fields(item = %new.item_id, quantity = new.quantity))]
    pub async fn create_order(&self, new: NewOrder) -> Result<StoreOrder> {
        let uid = self.client.require_uid()?;

        if new.quantity == 0 {
            return Err(ClientError::InvalidInput(
                "order quantity must be at least 1".to_string(),
            ));
        }
        if new.delivery_method == DeliveryMethod::Shipping && new.address.is_none() {
            return Err(ClientError::InvalidInput(
                "shipping orders need a shipping address".to_string(),
            ));
        }

        let item = self.get_item(&new.item_id).await?;
        if !item.active {
            return Err(ClientError::Conflict(
                "this item is no longer available".to_string(),
            ));
        }

        let total = order_total(
            item.price,
            new.quantity,
            item.tax_rate,
            item.shipping_cost,
            new.delivery_method,
        );

        let fields = StoreOrderFields {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            club_id: item.club_id.clone(),
            club_name: item.club_name.clone(),
            buyer_id: uid,
            quantity: new.quantity,
            variant: new.variant,
            unit_price: item.price,
            currency: item.currency,
            tax_rate: item.tax_rate,
            shipping_cost: item.shipping_cost,
            total,
            delivery_method: new.delivery_method,
            address: new.address,
            status: OrderStatus::Pending,
            shipped_at: None,
            delivered_at: None,
        };

        let doc = self
            .client
            .store()
            .create(collections::STORE_ORDERS, &fields)
            .await?;

        let sold = item.sold + i64::from(new.quantity);
        if let Err(e) = self
            .client
            .store()
            .patch(collections::STORE_ITEMS, item.id.as_str(), &json!({ "sold": sold }))
            .await
        {
            warn!(item = %item.id, error = %e, "sold counter update failed");
        }

        Ok(StoreOrder::from_doc(doc))
    }

    /// Read one order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the order does not exist.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<StoreOrder> {
        let doc = self
            .client
            .store()
            .get(collections::STORE_ORDERS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("order {id}")))?;
        Ok(StoreOrder::from_doc(doc))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn list_orders_for_user(&self, user: &UserId) -> Result<Vec<StoreOrder>> {
        let docs = self
            .client
            .store()
            .query(
                collections::STORE_ORDERS,
                &Query::all().filter_eq("buyerId", user.as_str()),
            )
            .await?;
        Ok(sort_orders(docs.into_iter().map(StoreOrder::from_doc).collect()))
    }

    /// A club's incoming orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(club = %club))]
    pub async fn list_orders_for_club(&self, club: &ClubId) -> Result<Vec<StoreOrder>> {
        let docs = self
            .client
            .store()
            .query(
                collections::STORE_ORDERS,
                &Query::all().filter_eq("clubId", club.as_str()),
            )
            .await?;
        Ok(sort_orders(docs.into_iter().map(StoreOrder::from_doc).collect()))
    }

    /// Move an order to a new status.
    ///
    /// `shipped` stamps `shippedAt`; `delivered` and `picked_up` stamp
    /// `deliveredAt`. The prior state is not validated - callers are
    /// trusted to request legal transitions
    /// (`pending -> processing -> shipped -> delivered`, `picked_up` as
    /// the parallel pickup terminal, `cancelled` from any non-terminal
    /// state).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the order does not exist.
    #[instrument(skip(self), fields(order = %id, status = %status))]
    pub async fn set_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<()> {
        let patch = status_patch(status, Utc::now());
        self.client
            .store()
            .patch(collections::STORE_ORDERS, id.as_str(), &patch)
            .await
            .map_err(|e| ClientError::from_store(e, || format!("order {id}")))
    }

    // =========================================================================
    // Address book
    // =========================================================================

    /// The signed-in user's address book.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotSignedIn` without a session.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self) -> Result<Vec<ShippingAddress>> {
        let uid = self.client.require_uid()?;
        Ok(self.profile_fields(&uid).await?.addresses)
    }

    /// Add an address.
    ///
    /// The first address always becomes the default; `make_default`
    /// clears `is_default` on every other stored address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the profile document does not
    /// exist.
    #[instrument(skip(self, new))]
    pub async fn add_address(&self, new: NewAddress) -> Result<ShippingAddress> {
        let uid = self.client.require_uid()?;
        let mut addresses = self.profile_fields(&uid).await?.addresses;

        let address = ShippingAddress {
            id: AddressId::new(uuid::Uuid::new_v4().to_string()),
            recipient: new.recipient,
            line1: new.line1,
            line2: new.line2,
            city: new.city,
            region: new.region,
            postal_code: new.postal_code,
            country: new.country,
            phone: new.phone,
            is_default: false,
        };
        push_address(&mut addresses, address.clone(), new.make_default);

        self.write_addresses(&uid, &addresses).await?;
        // The pushed copy may have been promoted to default
        Ok(addresses
            .into_iter()
            .find(|a| a.id == address.id)
            .unwrap_or(address))
    }

    /// Make an address the single default.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the address is not in the
    /// book.
    #[instrument(skip(self), fields(address = %id))]
    pub async fn set_default_address(&self, id: &AddressId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let mut addresses = self.profile_fields(&uid).await?.addresses;

        if !set_default(&mut addresses, id) {
            return Err(ClientError::NotFound(format!("address {id}")));
        }

        self.write_addresses(&uid, &addresses).await
    }

    /// Delete an address.
    ///
    /// Deleting the current default promotes the first remaining address
    /// (if any) to default. Deleting an absent address is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the profile document does not
    /// exist.
    #[instrument(skip(self), fields(address = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let mut addresses = self.profile_fields(&uid).await?.addresses;

        if remove_address(&mut addresses, id) {
            self.write_addresses(&uid, &addresses).await?;
        }
        Ok(())
    }

    async fn profile_fields(&self, uid: &UserId) -> Result<UserProfileFields> {
        let doc = self
            .client
            .store()
            .get::<UserProfileFields>(collections::USERS, uid.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("profile for {uid}")))?;
        Ok(doc.fields)
    }

    async fn write_addresses(&self, uid: &UserId, addresses: &[ShippingAddress]) -> Result<()> {
        self.client
            .store()
            .patch(
                collections::USERS,
                uid.as_str(),
                &json!({ "addresses": addresses }),
            )
            .await?;
        Ok(())
    }
}

/// Order total: `unit x quantity`, plus tax, plus shipping for the
/// shipping path, rounded to cents.
fn order_total(
    unit_price: Decimal,
    quantity: u32,
    tax_rate: Decimal,
    shipping_cost: Decimal,
    delivery_method: DeliveryMethod,
) -> Decimal {
    let subtotal = unit_price * Decimal::from(quantity);
    let mut total = subtotal + subtotal * tax_rate;
    if delivery_method == DeliveryMethod::Shipping {
        total += shipping_cost;
    }
    total.round_dp(2)
}

/// Build the merge-patch for a status transition, stamping the matching
/// timestamp.
fn status_patch(status: OrderStatus, now: chrono::DateTime<Utc>) -> serde_json::Value {
    match status {
        OrderStatus::Shipped => json!({ "status": status, "shippedAt": now }),
        OrderStatus::Delivered | OrderStatus::PickedUp => {
            json!({ "status": status, "deliveredAt": now })
        }
        OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Cancelled => {
            json!({ "status": status })
        }
    }
}

fn sort_orders(mut orders: Vec<StoreOrder>) -> Vec<StoreOrder> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    orders
}

// =============================================================================
// Address-book invariant helpers
// =============================================================================
// Exactly one address carries `is_default` once any address exists. These
// run on the in-memory array; the caller writes the whole array back.

fn push_address(addresses: &mut Vec<ShippingAddress>, mut address: ShippingAddress, make_default: bool) {
    if make_default || addresses.is_empty() {
        for existing in addresses.iter_mut() {
            existing.is_default = false;
        }
        address.is_default = true;
    }
    addresses.push(address);
}

fn set_default(addresses: &mut [ShippingAddress], id: &AddressId) -> bool {
    if !addresses.iter().any(|a| a.id == *id) {
        return false;
    }
    for address in addresses.iter_mut() {
        address.is_default = address.id == *id;
    }
    true
}

fn remove_address(addresses: &mut Vec<ShippingAddress>, id: &AddressId) -> bool {
    let Some(idx) = addresses.iter().position(|a| a.id == *id) else {
        return false;
    };
    let removed = addresses.remove(idx);
    if removed.is_default
        && let Some(first) = addresses.first_mut()
    {
        first.is_default = true;
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address(id: &str, is_default: bool) -> ShippingAddress {
        ShippingAddress {
            id: AddressId::new(id),
            recipient: "Robin Okafor".to_string(),
            line1: "12 Mill Lane".to_string(),
            line2: None,
            city: "Leeds".to_string(),
            region: None,
            postal_code: "LS1 4AB".to_string(),
            country: "GB".to_string(),
            phone: None,
            is_default,
        }
    }

    fn default_count(addresses: &[ShippingAddress]) -> usize {
        addresses.iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut book = Vec::new();
        push_address(&mut book, address("a_1", false), false);
        assert!(book[0].is_default);
    }

    #[test]
    fn test_new_default_clears_previous() {
        let mut book = Vec::new();
        push_address(&mut book, address("a_1", false), false);
        push_address(&mut book, address("a_2", false), true);

        assert!(!book[0].is_default);
        assert!(book[1].is_default);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_set_default_clears_all_others() {
        let mut book = vec![address("a_1", true), address("a_2", false), address("a_3", false)];
        assert!(set_default(&mut book, &AddressId::new("a_3")));

        assert!(book[2].is_default);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_set_default_unknown_id_is_rejected() {
        let mut book = vec![address("a_1", true)];
        assert!(!set_default(&mut book, &AddressId::new("a_9")));
        assert!(book[0].is_default);
    }

    #[test]
    fn test_deleting_default_promotes_first_remaining() {
        let mut book = vec![address("a_1", true), address("a_2", false), address("a_3", false)];
        assert!(remove_address(&mut book, &AddressId::new("a_1")));

        assert_eq!(book.len(), 2);
        assert!(book[0].is_default);
        assert_eq!(book[0].id, AddressId::new("a_2"));
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_deleting_non_default_keeps_default() {
        let mut book = vec![address("a_1", true), address("a_2", false)];
        assert!(remove_address(&mut book, &AddressId::new("a_2")));
        assert!(book[0].is_default);
    }

    #[test]
    fn test_deleting_last_address_leaves_empty_book() {
        let mut book = vec![address("a_1", true)];
        assert!(remove_address(&mut book, &AddressId::new("a_1")));
        assert!(book.is_empty());
    }

    #[test]
    fn test_order_total_shipping_path() {
        // 2 x 24.00 = 48.00, 10% tax = 4.80, shipping 5.00 => 57.80
        let total = order_total(
            Decimal::new(2400, 2),
            2,
            Decimal::new(10, 2),
            Decimal::new(500, 2),
            DeliveryMethod::Shipping,
        );
        assert_eq!(total, Decimal::new(5780, 2));
    }

    #[test]
    fn test_order_total_pickup_skips_shipping() {
        let total = order_total(
            Decimal::new(2400, 2),
            2,
            Decimal::ZERO,
            Decimal::new(500, 2),
            DeliveryMethod::Pickup,
        );
        assert_eq!(total, Decimal::new(4800, 2));
    }

    #[test]
    fn test_status_patch_stamps_timestamps() {
        let now = Utc::now();

        let patch = status_patch(OrderStatus::Shipped, now);
        assert_eq!(patch["status"], "shipped");
        assert!(patch.get("shippedAt").is_some());
        assert!(patch.get("deliveredAt").is_none());

        let patch = status_patch(OrderStatus::Delivered, now);
        assert!(patch.get("deliveredAt").is_some());
        assert!(patch.get("shippedAt").is_none());

        let patch = status_patch(OrderStatus::PickedUp, now);
        assert_eq!(patch["status"], "picked_up");
        assert!(patch.get("deliveredAt").is_some());

        let patch = status_patch(OrderStatus::Cancelled, now);
        assert_eq!(patch["status"], "cancelled");
        assert!(patch.get("shippedAt").is_none());
        assert!(patch.get("deliveredAt").is_none());
    }
}
