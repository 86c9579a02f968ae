//! Featured-event placement documents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rallypoint_core::{ClubId, EventId, FeaturedEventId, FeaturedStatus};

use crate::store::Document;

/// Stored featured-placement fields.
///
/// `totalCost` and `status` are derived at creation time from the paid
/// date range; `status` can go stale, so active-placement reads re-check
/// `endDate` client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeaturedEventFields {
    pub event_id: EventId,
    pub club_id: ClubId,
    pub placement: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_per_day: Decimal,
    pub total_cost: Decimal,
    pub status: FeaturedStatus,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
}

/// A paid placement boosting an event for a scheduled date range.
#[derive(Debug, Clone)]
pub struct FeaturedEvent {
    pub id: FeaturedEventId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event_id: EventId,
    pub club_id: ClubId,
    pub placement: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_per_day: Decimal,
    pub total_cost: Decimal,
    pub status: FeaturedStatus,
    pub impressions: u64,
    pub clicks: u64,
}

impl FeaturedEvent {
    pub(crate) fn from_doc(doc: Document<FeaturedEventFields>) -> Self {
        let f = doc.fields;
        Self {
            id: FeaturedEventId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            event_id: f.event_id,
            club_id: f.club_id,
            placement: f.placement,
            start_date: f.start_date,
            end_date: f.end_date,
            price_per_day: f.price_per_day,
            total_cost: f.total_cost,
            status: f.status,
            impressions: f.impressions,
            clicks: f.clicks,
        }
    }
}

/// Payload for buying a placement.
#[derive(Debug, Clone)]
pub struct NewFeaturedEvent {
    pub event_id: EventId,
    pub club_id: ClubId,
    /// Where the placement shows (e.g. `home_banner`).
    pub placement: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_per_day: Decimal,
}
