//! Featured-event placement operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use rallypoint_core::{FeaturedEventId, FeaturedStatus};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{FeaturedEvent, FeaturedEventFields, NewFeaturedEvent};
use crate::store::{Query, collections};

/// Featured-placement operations, borrowed from a [`Client`].
pub struct Featured<'a> {
    client: &'a Client,
}

impl<'a> Featured<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Buy a placement.
    ///
    /// `totalCost` and `status` are derived here: cost is
    /// `ceil(days in range) x price per day`, status compares the current
    /// time to the range.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidInput` when the date range is
    /// inverted.
    #[instrument(skip(self, new), fields(event = %new.event_id, placement = %new.placement))]
    pub async fn create(&self, new: NewFeaturedEvent) -> Result<FeaturedEvent> {
        self.client.require_uid()?;

        if new.end_date < new.start_date {
            return Err(ClientError::InvalidInput(
                "placement end date is before its start date".to_string(),
            ));
        }

        let fields = FeaturedEventFields {
            event_id: new.event_id,
            club_id: new.club_id,
            placement: new.placement,
            start_date: new.start_date,
            end_date: new.end_date,
            price_per_day: new.price_per_day,
            total_cost: placement_cost(new.start_date, new.end_date, new.price_per_day),
            status: derive_status(new.start_date, new.end_date, Utc::now()),
            impressions: 0,
            clicks: 0,
        };

        let doc = self
            .client
            .store()
            .create(collections::FEATURED_EVENTS, &fields)
            .await?;
        Ok(FeaturedEvent::from_doc(doc))
    }

    /// Active placements for a placement slot.
    ///
    /// The stored `status` was derived at creation time and goes stale, so
    /// the result is re-checked against `endDate` client-side and expired
    /// rows are dropped.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(placement = %placement))]
    pub async fn list_active(&self, placement: &str) -> Result<Vec<FeaturedEvent>> {
        let docs = self
            .client
            .store()
            .query(
                collections::FEATURED_EVENTS,
                &Query::all()
                    .filter_eq("status", FeaturedStatus::Active)
                    .filter_eq("placement", placement),
            )
            .await?;

        let now = Utc::now();
        Ok(docs
            .into_iter()
            .map(FeaturedEvent::from_doc)
            .filter(|f| f.end_date >= now)
            .collect())
    }

    /// Count one impression.
    ///
    /// Read-then-write: concurrent impressions can under-count. Accepted;
    /// the counter is advisory.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the placement does not exist.
    #[instrument(skip(self), fields(placement = %id))]
    pub async fn record_impression(&self, id: &FeaturedEventId) -> Result<()> {
        let doc = self.get_fields(id).await?;
        self.client
            .store()
            .patch(
                collections::FEATURED_EVENTS,
                id.as_str(),
                &json!({ "impressions": doc.impressions + 1 }),
            )
            .await?;
        Ok(())
    }

    /// Count one click (same read-then-write caveat as
    /// [`Self::record_impression`]).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the placement does not exist.
    #[instrument(skip(self), fields(placement = %id))]
    pub async fn record_click(&self, id: &FeaturedEventId) -> Result<()> {
        let doc = self.get_fields(id).await?;
        self.client
            .store()
            .patch(
                collections::FEATURED_EVENTS,
                id.as_str(),
                &json!({ "clicks": doc.clicks + 1 }),
            )
            .await?;
        Ok(())
    }

    async fn get_fields(&self, id: &FeaturedEventId) -> Result<FeaturedEventFields> {
        let doc = self
            .client
            .store()
            .get::<FeaturedEventFields>(collections::FEATURED_EVENTS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("featured placement {id}")))?;
        Ok(doc.fields)
    }
}

/// Billable days in a range: fractional days round up.
fn billable_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    // `i64::div_ceil` is unstable (int_roundings); `seconds` is non-negative
    // via `.max(0)`, so the unsigned `div_ceil` yields identical results.
    (seconds as u64).div_ceil(86_400) as i64
}

/// Total placement cost: `ceil(days) x price per day`.
#[must_use]
pub fn placement_cost(start: DateTime<Utc>, end: DateTime<Utc>, price_per_day: Decimal) -> Decimal {
    Decimal::from(billable_days(start, end)) * price_per_day
}

/// Derive placement status from the range and the current time:
/// `active` iff `start <= now <= end`, `scheduled` iff `now < start`,
/// `expired` otherwise.
#[must_use]
pub fn derive_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> FeaturedStatus {
    if now < start {
        FeaturedStatus::Scheduled
    } else if now <= end {
        FeaturedStatus::Active
    } else {
        FeaturedStatus::Expired
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_status_scheduled_before_start() {
        let start = at(2026, 4, 10, 0);
        let end = at(2026, 4, 20, 0);
        assert_eq!(
            derive_status(start, end, at(2026, 4, 9, 23)),
            FeaturedStatus::Scheduled
        );
    }

    #[test]
    fn test_status_active_inside_range_inclusive() {
        let start = at(2026, 4, 10, 0);
        let end = at(2026, 4, 20, 0);
        assert_eq!(derive_status(start, end, start), FeaturedStatus::Active);
        assert_eq!(
            derive_status(start, end, at(2026, 4, 15, 12)),
            FeaturedStatus::Active
        );
        assert_eq!(derive_status(start, end, end), FeaturedStatus::Active);
    }

    #[test]
    fn test_status_expired_after_end() {
        let start = at(2026, 4, 10, 0);
        let end = at(2026, 4, 20, 0);
        assert_eq!(
            derive_status(start, end, end + Duration::seconds(1)),
            FeaturedStatus::Expired
        );
    }

    #[test]
    fn test_cost_whole_days() {
        let start = at(2026, 4, 10, 0);
        let end = at(2026, 4, 17, 0); // 7 days
        assert_eq!(
            placement_cost(start, end, Decimal::new(500, 2)),
            Decimal::new(3500, 2)
        );
    }

    #[test]
    fn test_cost_fractional_days_round_up() {
        let start = at(2026, 4, 10, 0);
        let end = at(2026, 4, 12, 12); // 2.5 days -> 3 billable
        assert_eq!(
            placement_cost(start, end, Decimal::new(1000, 2)),
            Decimal::new(3000, 2)
        );
    }

    #[test]
    fn test_cost_zero_length_range() {
        let start = at(2026, 4, 10, 0);
        assert_eq!(placement_cost(start, start, Decimal::ONE), Decimal::ZERO);
    }
}
