//! Data models for the local complaint store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::status::ComplaintStatus;

/// Store properties and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProperties {
    /// Unique store identifier (32 chars)
    pub database_id: String,
    /// Schema version
    pub version: String,
    /// When the store file was first created
    pub create_timestamp: Option<DateTime<Utc>>,
}

/// An anonymous complaint as stored on the device
///
/// Every field except `status` is immutable after creation; the app only
/// ever deletes or bulk-clears submitted anonymous complaints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousComplaint {
    /// Locally assigned sequential identifier
    pub id: i64,
    /// Service category, free text (indexed)
    pub category: String,
    /// Street where the problem is located
    pub street: String,
    /// Nearest cross streets
    pub cross_streets: String,
    /// Neighborhood (indexed)
    pub neighborhood: String,
    /// How long the problem has existed, as the citizen described it
    pub wait_time: String,
    /// Free-form description of the problem
    pub description: String,
    /// Filing time, millisecond precision
    pub created_at: DateTime<Utc>,
    /// Lifecycle state
    pub status: ComplaintStatus,
}

/// Input record for inserting into the local store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAnonymousComplaint {
    /// Row to upsert; `None` lets the store assign the next id
    pub id: Option<i64>,
    /// Service category, free text
    pub category: String,
    /// Street where the problem is located
    pub street: String,
    /// Nearest cross streets
    pub cross_streets: String,
    /// Neighborhood
    pub neighborhood: String,
    /// How long the problem has existed
    pub wait_time: String,
    /// Free-form description of the problem
    pub description: String,
    /// Filing time; `None` lets the store assign the current time
    pub created_at: Option<DateTime<Utc>>,
    /// Lifecycle state; fresh complaints start Pending
    pub status: ComplaintStatus,
}

impl NewAnonymousComplaint {
    /// A pending complaint with store-assigned id and filing time
    pub fn new(
        category: impl Into<String>,
        street: impl Into<String>,
        cross_streets: impl Into<String>,
        neighborhood: impl Into<String>,
        wait_time: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            category: category.into(),
            street: street.into(),
            cross_streets: cross_streets.into(),
            neighborhood: neighborhood.into(),
            wait_time: wait_time.into(),
            description: description.into(),
            created_at: None,
            status: ComplaintStatus::Pending,
        }
    }

    /// Reject blank required fields before anything touches the database
    pub fn validate(&self) -> Result<()> {
        required(&self.category, "category")?;
        required(&self.street, "street")?;
        required(&self.cross_streets, "cross_streets")?;
        required(&self.neighborhood, "neighborhood")?;
        required(&self.wait_time, "wait_time")?;
        required(&self.description, "description")?;
        Ok(())
    }
}

fn required(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(name));
    }
    Ok(())
}
