//! Cloud store for user profiles
//!
//! Profiles live in a flat `usuarios` collection, one document per
//! account, keyed by the identity service's account id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::CloudConfig;
use crate::error::{CoreError, Result};
use super::client::DocumentClient;
use super::value::{Document, FieldValue, fields_from};

/// Name of the profile collection
const USERS_COLLECTION: &str = "usuarios";

/// A user profile read back from the cloud store
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    /// Account id the profile is keyed by
    pub uid: String,
    /// Given name
    pub first_name: String,
    /// Paternal surname
    pub paternal_surname: String,
    /// Maternal surname
    pub maternal_surname: String,
    /// Contact phone number
    pub phone: String,
    /// Contact email
    pub email: String,
    /// Server-assigned creation time of the profile document
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Full display name in customary order
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.first_name, self.paternal_surname, self.maternal_surname
        )
    }
}

/// Input for creating or replacing a profile
#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    /// Given name
    pub first_name: String,
    /// Paternal surname
    pub paternal_surname: String,
    /// Maternal surname
    pub maternal_surname: String,
    /// Contact phone number
    pub phone: String,
    /// Contact email
    pub email: String,
}

impl NewUserProfile {
    /// Reject blank fields before anything goes on the wire
    pub fn validate(&self) -> Result<()> {
        required(&self.first_name, "first_name")?;
        required(&self.paternal_surname, "paternal_surname")?;
        required(&self.maternal_surname, "maternal_surname")?;
        required(&self.phone, "phone")?;
        required(&self.email, "email")?;
        Ok(())
    }
}

fn required(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(name));
    }
    Ok(())
}

/// Cloud store for user profiles
#[derive(Debug, Clone)]
pub struct UserDirectory {
    client: DocumentClient,
}

impl UserDirectory {
    /// Build a profile store client for the configured project
    pub fn new(config: &CloudConfig) -> Result<Self> {
        Ok(Self {
            client: DocumentClient::new(config)?,
        })
    }

    /// Reuse an existing document client (shares its connection pool)
    pub fn with_client(client: DocumentClient) -> Self {
        Self { client }
    }

    fn profile_path(uid: &str) -> String {
        format!("{USERS_COLLECTION}/{uid}")
    }

    /// Create the profile document for an account, or replace it wholesale
    /// if one already exists.
    pub async fn save_profile(&self, uid: &str, profile: &NewUserProfile) -> Result<UserProfile> {
        profile.validate()?;

        let doc = self
            .client
            .set_document(&Self::profile_path(uid), &to_fields(profile))
            .await?;
        debug!(uid, "saved user profile");
        from_document(&doc)
    }

    /// Look up the profile for an account; `None` when no profile document
    /// has been written yet.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        match self.client.get_document(&Self::profile_path(uid)).await? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Remove the profile document for an account
    pub async fn delete_profile(&self, uid: &str) -> Result<()> {
        self.client.delete_document(&Self::profile_path(uid)).await
    }

    /// Every registered profile
    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let docs = self.client.list_documents(USERS_COLLECTION).await?;

        let mut profiles = Vec::new();
        for doc in docs {
            match from_document(&doc) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!(error = %e, "skipping malformed profile document"),
            }
        }
        Ok(profiles)
    }
}

fn to_fields(profile: &NewUserProfile) -> BTreeMap<String, FieldValue> {
    fields_from([
        ("nombre", FieldValue::str(&profile.first_name)),
        ("apellidoPaterno", FieldValue::str(&profile.paternal_surname)),
        ("apellidoMaterno", FieldValue::str(&profile.maternal_surname)),
        ("numeroTelefonico", FieldValue::str(&profile.phone)),
        ("correoElectronico", FieldValue::str(&profile.email)),
    ])
}

fn from_document(doc: &Document) -> Result<UserProfile> {
    Ok(UserProfile {
        uid: doc.id().to_string(),
        first_name: doc.require_str("nombre")?.to_string(),
        paternal_surname: doc.require_str("apellidoPaterno")?.to_string(),
        maternal_surname: doc.require_str("apellidoMaterno")?.to_string(),
        phone: doc.require_str("numeroTelefonico")?.to_string(),
        email: doc.require_str("correoElectronico")?.to_string(),
        created_at: doc.create_time.ok_or_else(|| {
            CoreError::InvalidDocument(format!("document {} missing createTime", doc.id()))
        })?,
    })
}
