//! Cloud store for identified complaints
//!
//! Complaints live in a two-level layout: a `quejas` collection with one
//! document per service category, each holding a `quejasList`
//! sub-collection of complaint documents. Wire field names match what the
//! mobile clients already store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::SERVICE_CATEGORIES;
use crate::config::CloudConfig;
use crate::error::{CoreError, Result};
use crate::status::ComplaintStatus;
use super::client::DocumentClient;
use super::value::{Document, FieldValue, fields_from};

/// Name of the per-category complaint sub-collection
const COMPLAINTS_SUBCOLLECTION: &str = "quejasList";

/// An identified complaint read back from the cloud store
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedComplaint {
    /// Backend-assigned document id
    pub document_id: String,
    /// Service category the complaint is filed under (partition key)
    pub category: String,
    /// Position in the batch it was returned in
    pub position: usize,
    /// Reporter's full name
    pub reporter_full_name: String,
    /// Reporter's contact email; ownership queries filter on this
    pub reporter_email: String,
    /// Reporter's phone; the citizen form has no phone field
    pub reporter_phone: Option<String>,
    /// Street where the problem is located
    pub street: String,
    /// Nearest cross streets
    pub cross_streets: String,
    /// Neighborhood
    pub neighborhood: String,
    /// How long the problem has existed
    pub problem_duration: String,
    /// Why the complaint is being filed
    pub reason_description: String,
    /// Lifecycle state
    pub status: ComplaintStatus,
    /// Backend-assigned submission time
    pub submitted_at: DateTime<Utc>,
}

/// Input for submitting an identified complaint
#[derive(Debug, Clone, Default)]
pub struct NewIdentifiedComplaint {
    /// Reporter's full name
    pub reporter_full_name: String,
    /// Reporter's contact email
    pub reporter_email: String,
    /// Reporter's phone, collected on the staff submission path
    pub reporter_phone: Option<String>,
    /// Street where the problem is located
    pub street: String,
    /// Nearest cross streets
    pub cross_streets: String,
    /// Neighborhood
    pub neighborhood: String,
    /// How long the problem has existed
    pub problem_duration: String,
    /// Why the complaint is being filed
    pub reason_description: String,
}

impl NewIdentifiedComplaint {
    /// Reject blank required fields before anything goes on the wire
    pub fn validate(&self) -> Result<()> {
        required(&self.reporter_full_name, "reporter_full_name")?;
        required(&self.reporter_email, "reporter_email")?;
        required(&self.street, "street")?;
        required(&self.cross_streets, "cross_streets")?;
        required(&self.neighborhood, "neighborhood")?;
        required(&self.problem_duration, "problem_duration")?;
        required(&self.reason_description, "reason_description")?;
        if let Some(phone) = &self.reporter_phone {
            required(phone, "reporter_phone")?;
        }
        Ok(())
    }
}

fn required(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(name));
    }
    Ok(())
}

/// Result of the cross-category ownership listing.
///
/// A failed category query never sinks the listing: documents from every
/// category that answered are merged, and the most recent failure message
/// is carried alongside them.
#[derive(Debug, Clone, Default)]
pub struct PartialListing {
    /// Documents merged from every category whose query succeeded
    pub complaints: Vec<IdentifiedComplaint>,
    /// Most recent per-category failure, if any query failed
    pub error: Option<String>,
}

/// Cloud store for identified complaints
#[derive(Debug, Clone)]
pub struct RemoteComplaintStore {
    client: DocumentClient,
}

impl RemoteComplaintStore {
    /// Build a store client for the configured project
    pub fn new(config: &CloudConfig) -> Result<Self> {
        Ok(Self {
            client: DocumentClient::new(config)?,
        })
    }

    /// Reuse an existing document client (shares its connection pool)
    pub fn with_client(client: DocumentClient) -> Self {
        Self { client }
    }

    fn category_path(category: &str) -> String {
        format!("quejas/{category}")
    }

    fn list_path(category: &str) -> String {
        format!("quejas/{category}/{COMPLAINTS_SUBCOLLECTION}")
    }

    /// Submit a new complaint under a service category.
    ///
    /// Returns the created record with its backend-assigned document id
    /// and submission time; callers clear their form only on success.
    pub async fn submit(
        &self,
        category: &str,
        complaint: &NewIdentifiedComplaint,
    ) -> Result<IdentifiedComplaint> {
        if !SERVICE_CATEGORIES.contains(&category) {
            return Err(CoreError::UnknownCategory(category.to_string()));
        }
        complaint.validate()?;

        let fields = to_fields(category, complaint);
        let doc = self
            .client
            .create_document(&Self::list_path(category), &fields)
            .await?;
        debug!(category, document_id = doc.id(), "submitted complaint");
        from_document(category, 0, &doc)
    }

    /// Every complaint filed under one category, annotated with document id
    /// and position in the batch. A category nobody has written to yet
    /// yields an empty list.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<IdentifiedComplaint>> {
        let docs = self.client.list_documents(&Self::list_path(category)).await?;
        Ok(collect_complaints(category, docs))
    }

    /// Every complaint a reporter filed, across all known categories.
    ///
    /// One filtered query per category, all run concurrently and merged
    /// once every query has completed.
    pub async fn list_mine_by_email(&self, email: &str) -> PartialListing {
        let queries = SERVICE_CATEGORIES.iter().map(|category| async move {
            let result = self.query_category_for_email(category, email).await;
            (*category, result)
        });
        merge_listing(join_all(queries).await)
    }

    async fn query_category_for_email(
        &self,
        category: &str,
        email: &str,
    ) -> Result<Vec<IdentifiedComplaint>> {
        let docs = self
            .client
            .query_equal(
                &Self::category_path(category),
                COMPLAINTS_SUBCOLLECTION,
                "correo",
                FieldValue::str(email),
            )
            .await?;
        Ok(collect_complaints(category, docs))
    }

    /// Advance a complaint one lifecycle step.
    ///
    /// `current` is the status the caller last loaded; the step is checked
    /// against the lifecycle table before anything goes on the wire, and
    /// an illegal step leaves the store untouched. The write itself is one
    /// atomic field update with no optimistic concurrency: when two staff
    /// members race, the last write wins.
    pub async fn update_status(
        &self,
        category: &str,
        document_id: &str,
        current: ComplaintStatus,
        target: ComplaintStatus,
    ) -> Result<ComplaintStatus> {
        current.validate_transition(target)?;

        let path = format!("{}/{document_id}", Self::list_path(category));
        self.client
            .patch_field(&path, "estado", FieldValue::str(target.display_name()))
            .await?;
        debug!(category, document_id, from = %current, to = %target, "advanced complaint status");
        Ok(target)
    }
}

/// Map documents into typed records, skipping ones the typed model
/// cannot represent
fn collect_complaints(category: &str, docs: Vec<Document>) -> Vec<IdentifiedComplaint> {
    let mut complaints = Vec::new();
    for doc in docs {
        match from_document(category, complaints.len(), &doc) {
            Ok(complaint) => complaints.push(complaint),
            Err(e) => warn!(category, error = %e, "skipping malformed complaint document"),
        }
    }
    complaints
}

/// Merge per-category query results. Successes always land; positions are
/// re-assigned across the merged batch; the most recent failure wins.
fn merge_listing(results: Vec<(&str, Result<Vec<IdentifiedComplaint>>)>) -> PartialListing {
    let mut listing = PartialListing::default();

    for (category, result) in results {
        match result {
            Ok(complaints) => listing.complaints.extend(complaints),
            Err(e) => {
                warn!(category, error = %e, "category query failed");
                listing.error = Some(e.to_string());
            }
        }
    }

    for (position, complaint) in listing.complaints.iter_mut().enumerate() {
        complaint.position = position;
    }

    listing
}

fn to_fields(category: &str, complaint: &NewIdentifiedComplaint) -> BTreeMap<String, FieldValue> {
    let mut fields = fields_from([
        ("nombre", FieldValue::str(&complaint.reporter_full_name)),
        ("correo", FieldValue::str(&complaint.reporter_email)),
        ("calle", FieldValue::str(&complaint.street)),
        ("cruzamientos", FieldValue::str(&complaint.cross_streets)),
        ("colonia", FieldValue::str(&complaint.neighborhood)),
        ("tiempoProblema", FieldValue::str(&complaint.problem_duration)),
        ("motivoQueja", FieldValue::str(&complaint.reason_description)),
        ("estado", FieldValue::str(ComplaintStatus::Pending.display_name())),
        ("tipo", FieldValue::str(category)),
    ]);
    if let Some(phone) = &complaint.reporter_phone {
        fields.insert("numTelefonico".to_string(), FieldValue::str(phone));
    }
    fields
}

fn from_document(category: &str, position: usize, doc: &Document) -> Result<IdentifiedComplaint> {
    // Documents written before the lifecycle rollout carry no estado field
    let status = match doc.str_field("estado") {
        Some(s) => s.parse().map_err(CoreError::InvalidDocument)?,
        None => ComplaintStatus::Pending,
    };

    let submitted_at = doc.create_time.ok_or_else(|| {
        CoreError::InvalidDocument(format!("document {} missing createTime", doc.id()))
    })?;

    Ok(IdentifiedComplaint {
        document_id: doc.id().to_string(),
        category: category.to_string(),
        position,
        reporter_full_name: doc.require_str("nombre")?.to_string(),
        reporter_email: doc.require_str("correo")?.to_string(),
        reporter_phone: doc.str_field("numTelefonico").map(str::to_string),
        street: doc.require_str("calle")?.to_string(),
        cross_streets: doc.require_str("cruzamientos")?.to_string(),
        neighborhood: doc.require_str("colonia")?.to_string(),
        problem_duration: doc.require_str("tiempoProblema")?.to_string(),
        reason_description: doc.require_str("motivoQueja")?.to_string(),
        status,
        submitted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_input() -> NewIdentifiedComplaint {
        NewIdentifiedComplaint {
            reporter_full_name: "Ana López".to_string(),
            reporter_email: "ana@example.com".to_string(),
            reporter_phone: None,
            street: "Calle 5".to_string(),
            cross_streets: "Av. Héroes".to_string(),
            neighborhood: "Centro".to_string(),
            problem_duration: "2 semanas".to_string(),
            reason_description: "Poste apagado".to_string(),
        }
    }

    fn sample_document(id: &str) -> Document {
        Document {
            name: format!("projects/p/databases/(default)/documents/quejas/Baches/quejasList/{id}"),
            fields: to_fields("Baches", &sample_input()),
            create_time: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
            update_time: None,
        }
    }

    fn sample_complaint(id: &str) -> IdentifiedComplaint {
        from_document("Baches", 0, &sample_document(id)).unwrap()
    }

    #[test]
    fn test_validate_rejects_blank_provided_phone() {
        let mut input = sample_input();
        input.reporter_phone = Some("  ".to_string());
        match input.validate() {
            Err(CoreError::MissingField(name)) => assert_eq!(name, "reporter_phone"),
            other => panic!("Expected MissingField, got {other:?}"),
        }

        let mut input = sample_input();
        input.reporter_phone = Some("983 123 4567".to_string());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_to_fields_writes_partition_and_initial_status() {
        let fields = to_fields("Baches", &sample_input());
        assert_eq!(fields.get("tipo"), Some(&FieldValue::str("Baches")));
        assert_eq!(fields.get("estado"), Some(&FieldValue::str("Pendiente")));
        assert!(!fields.contains_key("numTelefonico"));

        let mut input = sample_input();
        input.reporter_phone = Some("983 123 4567".to_string());
        let fields = to_fields("Baches", &input);
        assert_eq!(
            fields.get("numTelefonico"),
            Some(&FieldValue::str("983 123 4567"))
        );
    }

    #[test]
    fn test_from_document_reads_record_back() {
        let complaint = from_document("Baches", 3, &sample_document("abc123")).unwrap();
        assert_eq!(complaint.document_id, "abc123");
        assert_eq!(complaint.category, "Baches");
        assert_eq!(complaint.position, 3);
        assert_eq!(complaint.reporter_email, "ana@example.com");
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(
            complaint.submitted_at,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_from_document_defaults_missing_status_to_pending() {
        let mut doc = sample_document("abc123");
        doc.fields.remove("estado");
        let complaint = from_document("Baches", 0, &doc).unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Pending);
    }

    #[test]
    fn test_from_document_rejects_missing_identity() {
        let mut doc = sample_document("abc123");
        doc.fields.remove("correo");
        assert!(from_document("Baches", 0, &doc).is_err());

        let mut doc = sample_document("abc123");
        doc.create_time = None;
        assert!(from_document("Baches", 0, &doc).is_err());
    }

    #[test]
    fn test_merge_keeps_successes_when_one_category_fails() {
        let results = vec![
            ("Alumbrado", Ok(vec![sample_complaint("a1")])),
            (
                "Alcantarillado",
                Err(CoreError::RemoteError {
                    status: 503,
                    message: "backend unavailable".to_string(),
                }),
            ),
            ("Baches", Ok(vec![sample_complaint("b1"), sample_complaint("b2")])),
        ];

        let listing = merge_listing(results);
        assert_eq!(listing.complaints.len(), 3);
        let error = listing.error.unwrap();
        assert!(error.contains("backend unavailable"));
    }

    #[test]
    fn test_merge_most_recent_failure_wins() {
        let results = vec![
            (
                "Alumbrado",
                Err(CoreError::RemoteError {
                    status: 500,
                    message: "first failure".to_string(),
                }),
            ),
            ("Baches", Ok(vec![])),
            (
                "Banquetas",
                Err(CoreError::RemoteError {
                    status: 500,
                    message: "second failure".to_string(),
                }),
            ),
        ];

        let listing = merge_listing(results);
        assert!(listing.complaints.is_empty());
        assert!(listing.error.unwrap().contains("second failure"));
    }

    #[test]
    fn test_merge_reindexes_positions() {
        let results = vec![
            ("Alumbrado", Ok(vec![sample_complaint("a1")])),
            ("Baches", Ok(vec![sample_complaint("b1"), sample_complaint("b2")])),
        ];

        let listing = merge_listing(results);
        assert!(listing.error.is_none());
        let positions: Vec<usize> = listing.complaints.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }
}
