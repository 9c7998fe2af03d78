//! Ordered record store: the single source of truth for the session.

use crate::error::StoreError;
use crate::types::{PredictionResult, Record, RecordDraft, RecordField, RecordId, Snapshot};
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Store handle shared between the controller and an in-flight submission.
pub type SharedStore = Arc<Mutex<RecordStore>>;

/// Wrap a store for sharing.
pub fn shared_store(store: RecordStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Ordered sequence of records plus their attached prediction results.
///
/// Insertion order is display order, marker order, and CSV row order.
/// All derived views (markers, table rows, CSV text) are computed from
/// snapshots of this store rather than maintained as separate mirrors.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    results: HashMap<RecordId, PredictionResult>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the end, returning its id. Never fails.
    pub fn append(&mut self, record: Record) -> RecordId {
        let id = record.id;
        debug!("append record (id={id})");
        self.records.push(record);
        id
    }

    /// Replace one field of one record. Values are not validated here;
    /// validation is deferred to the submission gate.
    pub fn update(
        &mut self,
        id: RecordId,
        field: RecordField,
        value: String,
    ) -> Result<(), StoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        match field {
            RecordField::Latitude => record.latitude = value,
            RecordField::Longitude => record.longitude = value,
            RecordField::Date => record.date = value,
        }
        Ok(())
    }

    /// Remove a record and its attached result, if any. Other ids are
    /// unaffected.
    pub fn remove(&mut self, id: RecordId) -> Result<(), StoreError> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.records.remove(index);
        self.results.remove(&id);
        debug!("removed record (id={id})");
        Ok(())
    }

    /// Atomically discard the current sequence and install new rows with
    /// freshly minted ids, in the given order. Attached results are
    /// discarded with the old rows.
    pub fn replace_all(&mut self, rows: Vec<RecordDraft>) {
        info!("replacing all records (count={})", rows.len());
        self.records = rows
            .into_iter()
            .map(|row| Record::new(row.latitude, row.longitude, row.date))
            .collect();
        self.results.clear();
    }

    /// Read-only ordered copy, decoupled from subsequent mutation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.records.clone())
    }

    /// Set or overwrite the result for a record.
    pub fn attach_result(
        &mut self,
        id: RecordId,
        result: PredictionResult,
    ) -> Result<(), StoreError> {
        if !self.records.iter().any(|record| record.id == id) {
            return Err(StoreError::NotFound(id));
        }
        self.results.insert(id, result);
        Ok(())
    }

    /// Records in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.records
    }

    /// Attached result for a record, if any.
    pub fn result(&self, id: RecordId) -> Option<&PredictionResult> {
        self.results.get(&id)
    }

    /// All attached results, keyed by record id.
    pub fn results(&self) -> &HashMap<RecordId, PredictionResult> {
        &self.results
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
