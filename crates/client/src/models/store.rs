//! Store item, order, and shipping-address documents.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rallypoint_core::{
    AddressId, ClubId, CurrencyCode, DeliveryMethod, OrderStatus, Patch, StoreItemId, OrderId,
    UserId,
};

use crate::store::Document;

const fn default_true() -> bool {
    true
}

/// One variant axis a buyer chooses from (e.g. `Size` -> S/M/L).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGroup {
    pub name: String,
    pub options: Vec<String>,
}

/// Stored store-item fields.
///
/// `title`, `imageUrls`, and `stock` are legacy names; reads accept both.
/// Deleting an item flips `active` instead of removing the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreItemFields {
    pub club_id: ClubId,
    #[serde(alias = "clubTitle")]
    pub club_name: String,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default, alias = "imageUrls")]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<VariantGroup>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default, alias = "stock")]
    pub inventory: i64,
    #[serde(default)]
    pub sold: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A store item as callers see it.
#[derive(Debug, Clone)]
pub struct StoreItem {
    pub id: StoreItemId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub club_id: ClubId,
    pub club_name: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub images: Vec<String>,
    pub variants: Vec<VariantGroup>,
    pub tax_rate: Decimal,
    pub shipping_cost: Decimal,
    pub inventory: i64,
    pub sold: i64,
    pub active: bool,
}

impl StoreItem {
    pub(crate) fn from_doc(doc: Document<StoreItemFields>) -> Self {
        let f = doc.fields;
        Self {
            id: StoreItemId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            club_id: f.club_id,
            club_name: f.club_name,
            name: f.name,
            description: f.description,
            price: f.price,
            currency: f.currency,
            images: f.images,
            variants: f.variants,
            tax_rate: f.tax_rate,
            shipping_cost: f.shipping_cost,
            inventory: f.inventory,
            sold: f.sold,
            active: f.active,
        }
    }
}

/// Payload for listing a new store item.
///
/// The create operation fetches the owning club to denormalize its name.
#[derive(Debug, Clone)]
pub struct NewStoreItem {
    pub club_id: ClubId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub images: Vec<String>,
    pub variants: Vec<VariantGroup>,
    pub tax_rate: Decimal,
    pub shipping_cost: Decimal,
    pub inventory: i64,
}

impl NewStoreItem {
    pub(crate) fn into_fields(self, club_name: String) -> StoreItemFields {
        StoreItemFields {
            club_id: self.club_id,
            club_name,
            name: self.name,
            description: self.description,
            price: self.price,
            currency: self.currency,
            images: self.images,
            variants: self.variants,
            tax_rate: self.tax_rate,
            shipping_cost: self.shipping_cost,
            inventory: self.inventory,
            sold: 0,
            active: true,
        }
    }
}

/// Field-by-field store-item update.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItemPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub price: Patch<Decimal>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub images: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub variants: Patch<Vec<VariantGroup>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub tax_rate: Patch<Decimal>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub shipping_cost: Patch<Decimal>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub inventory: Patch<i64>,
}

/// A shipping address in a user's address book.
///
/// Addresses live on the user document; ids are client-generated. At most
/// one address per user carries `is_default` once any address exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub id: AddressId,
    #[serde(alias = "name")]
    pub recipient: String,
    #[serde(alias = "street")]
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Payload for adding an address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    /// Make this the default address, clearing any previous default.
    pub make_default: bool,
}

/// Stored order fields.
///
/// Item and club names are denormalized at creation time for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreOrderFields {
    pub item_id: StoreItemId,
    #[serde(alias = "itemTitle")]
    pub item_name: String,
    pub club_id: ClubId,
    #[serde(alias = "clubTitle")]
    pub club_name: String,
    pub buyer_id: UserId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: BTreeMap<String, String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ShippingAddress>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// A store order as callers see it.
#[derive(Debug, Clone)]
pub struct StoreOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_id: StoreItemId,
    pub item_name: String,
    pub club_id: ClubId,
    pub club_name: String,
    pub buyer_id: UserId,
    pub quantity: u32,
    pub variant: BTreeMap<String, String>,
    pub unit_price: Decimal,
    pub currency: CurrencyCode,
    pub tax_rate: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub delivery_method: DeliveryMethod,
    pub address: Option<ShippingAddress>,
    pub status: OrderStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl StoreOrder {
    pub(crate) fn from_doc(doc: Document<StoreOrderFields>) -> Self {
        let f = doc.fields;
        Self {
            id: OrderId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            item_id: f.item_id,
            item_name: f.item_name,
            club_id: f.club_id,
            club_name: f.club_name,
            buyer_id: f.buyer_id,
            quantity: f.quantity,
            variant: f.variant,
            unit_price: f.unit_price,
            currency: f.currency,
            tax_rate: f.tax_rate,
            shipping_cost: f.shipping_cost,
            total: f.total,
            delivery_method: f.delivery_method,
            address: f.address,
            status: f.status,
            shipped_at: f.shipped_at,
            delivered_at: f.delivered_at,
        }
    }
}

/// Payload for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub item_id: StoreItemId,
    pub quantity: u32,
    /// Chosen variant selection (axis name -> option).
    pub variant: BTreeMap<String, String>,
    pub delivery_method: DeliveryMethod,
    /// Shipping address snapshot; required for the shipping path.
    pub address: Option<ShippingAddress>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_item_accepts_legacy_names() {
        let json = r#"{
            "clubId": "c_1",
            "clubTitle": "Trail Runners",
            "title": "Club tee",
            "price": "24.00",
            "imageUrls": ["https://img.example/tee.jpg"],
            "stock": 40
        }"#;
        let fields: StoreItemFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.name, "Club tee");
        assert_eq!(fields.images.len(), 1);
        assert_eq!(fields.inventory, 40);
        assert!(fields.active);
        assert_eq!(fields.sold, 0);
    }

    #[test]
    fn test_order_status_defaults_pending() {
        let json = r#"{
            "itemId": "i_1",
            "itemName": "Club tee",
            "clubId": "c_1",
            "clubName": "Trail Runners",
            "buyerId": "u_1",
            "quantity": 2,
            "unitPrice": "24.00",
            "total": "48.00"
        }"#;
        let fields: StoreOrderFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.status, OrderStatus::Pending);
        assert!(fields.shipped_at.is_none());
        assert_eq!(fields.delivery_method, DeliveryMethod::Shipping);
    }

    #[test]
    fn test_address_accepts_legacy_names() {
        let json = r#"{
            "id": "a_1",
            "name": "Robin Okafor",
            "street": "12 Mill Lane",
            "city": "Leeds",
            "postalCode": "LS1 4AB",
            "country": "GB"
        }"#;
        let addr: ShippingAddress = serde_json::from_str(json).unwrap();
        assert_eq!(addr.recipient, "Robin Okafor");
        assert_eq!(addr.line1, "12 Mill Lane");
        assert!(!addr.is_default);
    }
}
