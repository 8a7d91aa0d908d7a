//! Local complaint store API
//!
//! This module provides the primary interface for the on-device anonymous
//! complaint store. Reads come in two forms: one-shot queries, and live
//! watch handles that are pushed a fresh result set from inside every
//! write that changes the table. The store itself is single-threaded;
//! watch receivers may be handed to async tasks.

use std::path::Path;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::database::models::{AnonymousComplaint, NewAnonymousComplaint, StoreProperties};
use crate::database::{Database, queries};
use crate::error::{CoreError, Result};
use crate::status::ComplaintStatus;

/// Filter for complaint list queries and subscriptions
#[derive(Debug, Clone, PartialEq)]
pub enum ComplaintFilter {
    /// Every complaint
    All,
    /// Complaints in one category
    Category(String),
    /// Complaints in one neighborhood
    Neighborhood(String),
    /// Complaints in one lifecycle state
    Status(ComplaintStatus),
}

/// Scope of a live count subscription
#[derive(Debug, Clone, PartialEq)]
pub enum CountScope {
    /// Count every complaint
    All,
    /// Count complaints in one category
    Category(String),
}

struct ListWatcher {
    filter: ComplaintFilter,
    tx: watch::Sender<Vec<AnonymousComplaint>>,
}

struct CountWatcher {
    scope: CountScope,
    tx: watch::Sender<u64>,
}

/// On-device store for anonymous complaints
pub struct LocalComplaintStore {
    /// Database connection
    db: Database,
    /// Live list subscriptions, refreshed on every write
    list_watchers: Mutex<Vec<ListWatcher>>,
    /// Live count subscriptions, refreshed on every write
    count_watchers: Mutex<Vec<CountWatcher>>,
}

impl LocalComplaintStore {
    /// Open the store at the given database file, creating it on first use
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;

        Ok(Self {
            db,
            list_watchers: Mutex::new(Vec::new()),
            count_watchers: Mutex::new(Vec::new()),
        })
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;

        Ok(Self {
            db,
            list_watchers: Mutex::new(Vec::new()),
            count_watchers: Mutex::new(Vec::new()),
        })
    }

    /// Store identity and schema version
    pub fn properties(&self) -> Result<StoreProperties> {
        queries::get_properties(self.db.connection()?)?
            .ok_or_else(|| CoreError::DatabaseError("Store properties missing".to_string()))
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert a complaint, upserting by id.
    ///
    /// A record without an id gets the next sequential one; a record
    /// without a filing time gets the current time. Returns the id of
    /// the written row.
    pub fn insert(&self, complaint: &NewAnonymousComplaint) -> Result<i64> {
        complaint.validate()?;
        let created_at = complaint.created_at.unwrap_or_else(queries::now_millis);
        let id = queries::insert_complaint(self.db.connection()?, complaint, created_at)?;
        debug!(id, category = %complaint.category, "inserted complaint");
        self.notify_watchers();
        Ok(id)
    }

    /// Insert several complaints in one transaction, upserting each by id.
    ///
    /// Validation runs for the whole batch before anything is written;
    /// a failing insert rolls the whole batch back.
    pub fn insert_batch(&self, complaints: &[NewAnonymousComplaint]) -> Result<Vec<i64>> {
        for complaint in complaints {
            complaint.validate()?;
        }

        let conn = self.db.connection()?;
        self.db.begin_transaction()?;

        let mut ids = Vec::with_capacity(complaints.len());
        for complaint in complaints {
            let created_at = complaint.created_at.unwrap_or_else(queries::now_millis);
            match queries::insert_complaint(conn, complaint, created_at) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    let _ = self.db.rollback_transaction();
                    return Err(e);
                }
            }
        }

        self.db.commit_transaction()?;
        debug!(count = ids.len(), "inserted complaint batch");
        if !ids.is_empty() {
            self.notify_watchers();
        }
        Ok(ids)
    }

    /// Replace the stored row matching the record's id
    pub fn update(&self, complaint: &AnonymousComplaint) -> Result<()> {
        queries::update_complaint(self.db.connection()?, complaint)?;
        debug!(id = complaint.id, "updated complaint");
        self.notify_watchers();
        Ok(())
    }

    /// Delete the complaint with the given id. Returns true if a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let removed = queries::delete_complaint(self.db.connection()?, id)?;
        if removed {
            debug!(id, "deleted complaint");
            self.notify_watchers();
        }
        Ok(removed)
    }

    /// Delete every complaint. Returns the number of rows removed.
    pub fn delete_all(&self) -> Result<u32> {
        let removed = queries::delete_all_complaints(self.db.connection()?)?;
        if removed > 0 {
            debug!(removed, "cleared complaint store");
            self.notify_watchers();
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // One-shot reads
    // ------------------------------------------------------------------

    /// Get a single complaint by id
    pub fn get_by_id(&self, id: i64) -> Result<Option<AnonymousComplaint>> {
        queries::get_complaint_by_id(self.db.connection()?, id)
    }

    /// All complaints, newest filing time first
    pub fn query_all(&self) -> Result<Vec<AnonymousComplaint>> {
        queries::get_all_complaints(self.db.connection()?)
    }

    /// Complaints in one category, newest filing time first
    pub fn query_by_category(&self, category: &str) -> Result<Vec<AnonymousComplaint>> {
        queries::get_complaints_by_category(self.db.connection()?, category)
    }

    /// Complaints in one neighborhood, newest filing time first
    pub fn query_by_neighborhood(&self, neighborhood: &str) -> Result<Vec<AnonymousComplaint>> {
        queries::get_complaints_by_neighborhood(self.db.connection()?, neighborhood)
    }

    /// Complaints in one lifecycle state, newest filing time first
    pub fn query_by_status(&self, status: ComplaintStatus) -> Result<Vec<AnonymousComplaint>> {
        queries::get_complaints_by_status(self.db.connection()?, status)
    }

    /// Number of stored complaints
    pub fn count_all(&self) -> Result<u64> {
        queries::count_complaints(self.db.connection()?)
    }

    /// Number of stored complaints in one category
    pub fn count_by_category(&self, category: &str) -> Result<u64> {
        queries::count_complaints_by_category(self.db.connection()?, category)
    }

    // ------------------------------------------------------------------
    // Live queries
    // ------------------------------------------------------------------

    /// Subscribe to a filtered complaint list.
    ///
    /// The receiver starts out holding the current result set and is sent
    /// a fresh one from inside every write that changes the table. The
    /// subscription lives until the receiver is dropped.
    pub fn watch(&self, filter: ComplaintFilter) -> Result<watch::Receiver<Vec<AnonymousComplaint>>> {
        let initial = self.run_filter(&filter)?;
        let (tx, rx) = watch::channel(initial);
        self.lock_list_watchers().push(ListWatcher { filter, tx });
        Ok(rx)
    }

    /// Subscribe to a live complaint count
    pub fn watch_count(&self, scope: CountScope) -> Result<watch::Receiver<u64>> {
        let initial = self.run_count(&scope)?;
        let (tx, rx) = watch::channel(initial);
        self.lock_count_watchers().push(CountWatcher { scope, tx });
        Ok(rx)
    }

    fn run_filter(&self, filter: &ComplaintFilter) -> Result<Vec<AnonymousComplaint>> {
        match filter {
            ComplaintFilter::All => self.query_all(),
            ComplaintFilter::Category(category) => self.query_by_category(category),
            ComplaintFilter::Neighborhood(neighborhood) => {
                self.query_by_neighborhood(neighborhood)
            }
            ComplaintFilter::Status(status) => self.query_by_status(*status),
        }
    }

    fn run_count(&self, scope: &CountScope) -> Result<u64> {
        match scope {
            CountScope::All => self.count_all(),
            CountScope::Category(category) => self.count_by_category(category),
        }
    }

    /// Re-run every live subscription and push the fresh results.
    /// Called from inside each completed write; subscriptions whose
    /// receivers are gone get pruned here.
    fn notify_watchers(&self) {
        let mut list_watchers = self.lock_list_watchers();
        list_watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in list_watchers.iter() {
            match self.run_filter(&watcher.filter) {
                Ok(rows) => {
                    watcher.tx.send_replace(rows);
                }
                Err(e) => warn!(error = %e, "failed to refresh live complaint list"),
            }
        }
        drop(list_watchers);

        let mut count_watchers = self.lock_count_watchers();
        count_watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in count_watchers.iter() {
            match self.run_count(&watcher.scope) {
                Ok(count) => {
                    watcher.tx.send_replace(count);
                }
                Err(e) => warn!(error = %e, "failed to refresh live complaint count"),
            }
        }
    }

    fn lock_list_watchers(&self) -> std::sync::MutexGuard<'_, Vec<ListWatcher>> {
        self.list_watchers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_count_watchers(&self) -> std::sync::MutexGuard<'_, Vec<CountWatcher>> {
        self.count_watchers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flush and close the store
    pub fn close(&mut self) {
        if self.db.is_open() {
            if let Err(e) = self.db.checkpoint() {
                warn!(error = %e, "checkpoint on close failed");
            }
        }
        self.db.close();
    }
}
