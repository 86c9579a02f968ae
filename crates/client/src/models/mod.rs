//! Domain models and their wire shapes.
//!
//! Each entity comes in up to three forms:
//!
//! - a `*Fields` struct: the stored field set in storage vocabulary
//!   (camelCase), with `#[serde(alias)]` entries normalizing legacy field
//!   names still present in older documents;
//! - the public domain struct: the fields plus the document envelope
//!   (id, timestamps);
//! - `New*` / `*Patch` payloads: what callers hand to create and update
//!   operations. Patches use [`rallypoint_core::Patch`] so untouched
//!   fields stay untouched by construction.
//!
//! These documents are owned by the backend; this layer only marshals
//! them.

mod club;
mod event;
mod featured;
mod store;
mod user;

pub use club::{Club, ClubPatch, JoinRequest, JoinRequestStatus, NewClub};
pub(crate) use club::JoinRequestFields;
pub use event::{Event, NewEvent};
pub(crate) use event::EventFields;
pub use featured::{FeaturedEvent, NewFeaturedEvent};
pub(crate) use featured::FeaturedEventFields;
pub use store::{
    NewAddress, NewOrder, NewStoreItem, ShippingAddress, StoreItem, StoreItemPatch, StoreOrder,
    VariantGroup,
};
pub(crate) use store::StoreOrderFields;
pub use user::{ProfilePatch, SessionUser, UserProfile};
pub(crate) use user::UserProfileFields;
