//! Cloud document store
//!
//! This module provides the shared backend used by every client of the
//! reporting system:
//! - Document types and field value encoding ([`value`])
//! - A thin REST client for the document store ([`client`])
//! - Identified complaints partitioned by service category ([`complaints`])
//! - User profiles keyed by account id ([`users`])

pub mod client;
pub mod complaints;
pub mod users;
pub mod value;

pub use client::DocumentClient;
pub use complaints::{
    IdentifiedComplaint, NewIdentifiedComplaint, PartialListing, RemoteComplaintStore,
};
pub use users::{NewUserProfile, UserDirectory, UserProfile};
pub use value::{Document, FieldValue};
