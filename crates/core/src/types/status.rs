//! Status enums for orders, featured placements, and delivery.

use serde::{Deserialize, Serialize};

/// Store order status.
///
/// The lifecycle is `pending -> processing -> shipped -> delivered`, with a
/// parallel terminal `picked_up` for the pickup-delivery path and
/// `cancelled` reachable from any non-terminal state. This layer does not
/// validate transitions against the prior state; callers are trusted to
/// request legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    PickedUp,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::PickedUp | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::PickedUp => "picked_up",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "picked_up" => Ok(Self::PickedUp),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Featured-event placement status, derived from the paid date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturedStatus {
    /// The placement has not started yet.
    Scheduled,
    /// Now is inside the paid date range.
    Active,
    /// The paid date range has passed.
    Expired,
}

impl std::fmt::Display for FeaturedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// How a store order is handed to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[default]
    Shipping,
    Pickup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::PickedUp.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_order_status_roundtrip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::PickedUp,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = s.to_string().parse().expect("parse");
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PickedUp).expect("serialize");
        assert_eq!(json, "\"picked_up\"");
        let json = serde_json::to_string(&FeaturedStatus::Active).expect("serialize");
        assert_eq!(json, "\"active\"");
    }
}
