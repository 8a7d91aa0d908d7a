//! # Comunidad Core
//!
//! Core library for the "Ayuda a Mejorar tu Comunidad" citizen reporting
//! system.
//!
//! ## Features
//!
//! - Anonymous complaints in a local SQLite store with live queries
//! - Identified complaints in a cloud document store, partitioned by
//!   service category
//! - Complaint lifecycle with gated forward-only status transitions
//! - Email/password accounts with stored user profiles
//! - Municipal service directory lookup
//!
//! ## Example
//!
//! ```no_run
//! use comunidad_core::NewAnonymousComplaint;
//! use comunidad_core::local::LocalComplaintStore;
//! use std::path::Path;
//!
//! let store = LocalComplaintStore::open(Path::new("/data/queja_database")).unwrap();
//!
//! let complaint = NewAnonymousComplaint::new(
//!     "Alumbrado",
//!     "Calle 5",
//!     "Av. Héroes",
//!     "Centro",
//!     "2 semanas",
//!     "Poste apagado",
//! );
//! let id = store.insert(&complaint).unwrap();
//!
//! for complaint in store.query_all().unwrap() {
//!     println!("{}: {}", complaint.id, complaint.description);
//! }
//! # let _ = id;
//! ```

pub mod accounts;
pub mod auth;
pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod local;
pub mod remote;
pub mod status;

// Re-export main types
pub use error::{CoreError, Result};
pub use status::ComplaintStatus;
pub use config::{AuthConfig, CloudConfig, DirectoryConfig};
pub use database::models::{AnonymousComplaint, NewAnonymousComplaint, StoreProperties};
pub use local::{ComplaintFilter, CountScope, LocalComplaintStore};
pub use remote::{
    IdentifiedComplaint, NewIdentifiedComplaint, NewUserProfile, PartialListing,
    RemoteComplaintStore, UserDirectory, UserProfile,
};
pub use auth::{AuthClient, AuthSession};
pub use accounts::{Account, AccountService};
pub use directory::{ServiceContact, ServiceDirectory, ServiceDirectoryClient};

/// Local database filename
pub const DATABASE_FILENAME: &str = "queja_database";

/// Service categories complaints are filed under; the cross-category
/// listing fans out over exactly this set
pub const SERVICE_CATEGORIES: [&str; 5] = [
    "Alumbrado",
    "Alcantarillado",
    "Áreas Verdes",
    "Baches",
    "Banquetas",
];

/// Production document store endpoint
pub const CLOUD_BASE_URL: &str = "https://firestore.googleapis.com";

/// Production identity service endpoint
pub const AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Production municipal service directory endpoint
pub const DIRECTORY_BASE_URL: &str = "http://comedatos.qroo.gob.mx/api";
