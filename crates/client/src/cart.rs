//! Local shopping cart.
//!
//! The cart is purely client-side: an in-memory list of line items,
//! persisted as one serialized JSON list to a local file. The in-memory
//! state is authoritative for the session - every mutation schedules a
//! fire-and-forget write, and persistence failures are logged and
//! swallowed, never surfaced to the caller. No write ever blocks a
//! subsequent read.
//!
//! Line identity is the `(item id, variant selection)` pair: adding the
//! same selection twice merges into one line by summing quantities, so at
//! most one line exists per distinct pair.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rallypoint_core::{ClubId, Price, StoreItemId};

use crate::models::StoreItem;

/// One cart line.
///
/// Inventory and sold counters are a read-only snapshot copied from the
/// store item at add time; checkout re-validates against the live item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_id: StoreItemId,
    pub name: String,
    pub unit_price: Price,
    /// Line quantity, always >= 1 while the line exists.
    pub quantity: u32,
    /// Chosen variant selection (axis name -> option).
    #[serde(default)]
    pub variant: BTreeMap<String, String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub club_id: ClubId,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub inventory: i64,
    #[serde(default)]
    pub sold: i64,
}

impl CartItem {
    /// Build a cart line from a store item and a chosen variant selection.
    #[must_use]
    pub fn from_item(item: &StoreItem, quantity: u32, variant: BTreeMap<String, String>) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: Price::new(item.price, item.currency),
            quantity,
            variant,
            images: item.images.clone(),
            club_id: item.club_id.clone(),
            tax_rate: item.tax_rate,
            shipping_cost: item.shipping_cost,
            inventory: item.inventory,
            sold: item.sold,
        }
    }

    fn matches(&self, item_id: &StoreItemId, variant: &BTreeMap<String, String>) -> bool {
        self.item_id == *item_id && self.variant == *variant
    }
}

/// The local cart store.
///
/// Cheaply cloneable; all clones share one in-memory list.
#[derive(Debug, Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

#[derive(Debug)]
struct CartInner {
    path: PathBuf,
    items: Mutex<Vec<CartItem>>,
}

impl CartStore {
    /// Load the cart from its persistence file.
    ///
    /// A missing or unreadable file yields an empty cart; the failure is
    /// logged, never returned.
    pub async fn load(path: PathBuf) -> Self {
        let items = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<CartItem>>(&bytes) {
                Ok(items) => {
                    debug!(lines = items.len(), "cart restored");
                    items
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cart file unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cart restore failed, starting empty");
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(CartInner {
                path,
                items: Mutex::new(items),
            }),
        }
    }

    /// Add a line, merging with an existing line of the same identity.
    ///
    /// A zero-quantity add is ignored.
    pub fn add_item(&self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }

        {
            let mut items = self.lock();
            if let Some(existing) = items
                .iter_mut()
                .find(|line| line.matches(&item.item_id, &item.variant))
            {
                existing.quantity += item.quantity;
            } else {
                items.push(item);
            }
        }
        self.persist();
    }

    /// Remove the line with the given identity. No-op when absent.
    pub fn remove_item(&self, item_id: &StoreItemId, variant: &BTreeMap<String, String>) {
        let changed = {
            let mut items = self.lock();
            let before = items.len();
            items.retain(|line| !line.matches(item_id, variant));
            items.len() != before
        };
        if changed {
            self.persist();
        }
    }

    /// Set a line's quantity; `quantity <= 0` behaves as [`Self::remove_item`].
    ///
    /// No-op when the line does not exist.
    pub fn update_quantity(
        &self,
        item_id: &StoreItemId,
        variant: &BTreeMap<String, String>,
        quantity: i64,
    ) {
        if quantity <= 0 {
            self.remove_item(item_id, variant);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let changed = {
            let mut items = self.lock();
            match items
                .iter_mut()
                .find(|line| line.matches(item_id, variant))
            {
                Some(line) => {
                    line.quantity = quantity;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.persist();
        }
    }

    /// Empty the cart.
    pub fn clear(&self) {
        {
            self.lock().clear();
        }
        self.persist();
    }

    /// Sum of `unit price x quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock()
            .iter()
            .map(|line| line.unit_price.amount * Decimal::from(line.quantity))
            .sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lock().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write the current list to disk and wait for the write to finish.
    ///
    /// Mutations already schedule fire-and-forget writes; this is for
    /// shutdown paths (and tests) that want the file settled.
    pub async fn flush(&self) {
        let snapshot = self.items();
        if let Err(e) = write_cart(&self.inner.path, &snapshot).await {
            warn!(path = %self.inner.path.display(), error = %e, "cart persist failed");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CartItem>> {
        self.inner.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule a full-list write. Failures are logged and swallowed; the
    /// in-memory state remains authoritative.
    fn persist(&self) {
        let snapshot = self.items();
        let path = self.inner.path.clone();
        tokio::spawn(async move {
            if let Err(e) = write_cart(&path, &snapshot).await {
                warn!(path = %path.display(), error = %e, "cart persist failed");
            }
        });
    }
}

async fn write_cart(path: &Path, items: &[CartItem]) -> std::io::Result<()> {
    let bytes = serde_json::to_vec(items).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rallypoint_core::CurrencyCode;

    fn temp_cart_path() -> PathBuf {
        std::env::temp_dir().join(format!("rallypoint-cart-test-{}.json", uuid::Uuid::new_v4()))
    }

    fn line(id: &str, size: &str, quantity: u32, price: Decimal) -> CartItem {
        let mut variant = BTreeMap::new();
        variant.insert("Size".to_string(), size.to_string());
        CartItem {
            item_id: StoreItemId::new(id),
            name: format!("Item {id}"),
            unit_price: Price::new(price, CurrencyCode::USD),
            quantity,
            variant,
            images: Vec::new(),
            club_id: ClubId::new("c_1"),
            tax_rate: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            inventory: 10,
            sold: 0,
        }
    }

    async fn empty_cart() -> CartStore {
        CartStore::load(temp_cart_path()).await
    }

    #[tokio::test]
    async fn test_add_same_identity_merges_quantities() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 2, Decimal::new(2400, 2)));
        cart.add_item(line("i_1", "M", 3, Decimal::new(2400, 2)));

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_distinct_variants_are_distinct_lines() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 1, Decimal::new(2400, 2)));
        cart.add_item(line("i_1", "L", 1, Decimal::new(2400, 2)));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.count(), 2);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_price_times_quantity() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 2, Decimal::new(2400, 2))); // 48.00
        cart.add_item(line("i_2", "M", 1, Decimal::new(1050, 2))); // 10.50

        assert_eq!(cart.total(), Decimal::new(5850, 2));
        assert_eq!(cart.count(), 3);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_equals_remove() {
        let removed = empty_cart().await;
        removed.add_item(line("i_1", "M", 2, Decimal::ONE));
        removed.remove_item(&StoreItemId::new("i_1"), &line("i_1", "M", 1, Decimal::ONE).variant);

        let zeroed = empty_cart().await;
        zeroed.add_item(line("i_1", "M", 2, Decimal::ONE));
        zeroed.update_quantity(
            &StoreItemId::new("i_1"),
            &line("i_1", "M", 1, Decimal::ONE).variant,
            0,
        );

        assert_eq!(removed.items(), zeroed.items());
        assert!(zeroed.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_sets_value() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 2, Decimal::ONE));
        cart.update_quantity(
            &StoreItemId::new("i_1"),
            &line("i_1", "M", 1, Decimal::ONE).variant,
            7,
        );
        assert_eq!(cart.items()[0].quantity, 7);

        // Negative quantity removes the line
        cart.update_quantity(
            &StoreItemId::new("i_1"),
            &line("i_1", "M", 1, Decimal::ONE).variant,
            -3,
        );
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 1, Decimal::ONE));
        cart.remove_item(&StoreItemId::new("i_9"), &BTreeMap::new());
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_cart() {
        let cart = empty_cart().await;
        cart.add_item(line("i_1", "M", 1, Decimal::ONE));
        cart.add_item(line("i_2", "L", 2, Decimal::ONE));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let path = temp_cart_path();
        let cart = CartStore::load(path.clone()).await;
        cart.add_item(line("i_1", "M", 2, Decimal::new(2400, 2)));
        cart.flush().await;

        let restored = CartStore::load(path.clone()).await;
        assert_eq!(restored.items(), cart.items());

        let _ = tokio::fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let path = temp_cart_path();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let cart = CartStore::load(path.clone()).await;
        assert!(cart.is_empty());

        let _ = tokio::fs::remove_file(path).await;
    }
}
