//! Session controller: applies user intents and derives the display view.

use crate::csv;
use crate::error::{CsvError, StoreError, SubmitError};
use crate::map::{self, ClickIntent, ClickMode};
use crate::predictor::Predictor;
use crate::store::{RecordStore, SharedStore, shared_store};
use crate::submit::{BatchSubmitter, MergeReport};
use crate::types::{
    GeoPoint, Marker, Record, RecordField, RecordId, format_coordinate,
};
use bloomwatch_config::BloomwatchConfig;
use bloomwatch_protocol::UploadResponse;
use log::info;
use serde_json::Value;
use std::sync::Arc;

/// Validation banner text, matching the original client.
const VALIDATION_MESSAGE: &str = "Please enter valid coordinates and date.";
/// Busy banner text.
const BUSY_MESSAGE: &str = "A prediction is already in progress.";

/// Summary of the last CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows installed into the store.
    pub accepted: usize,
    /// Rows dropped by the tolerant parser.
    pub rejected: usize,
}

/// One table row joined with its result, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    /// Record identity.
    pub id: RecordId,
    /// Latitude input text.
    pub latitude: String,
    /// Longitude input text.
    pub longitude: String,
    /// Date input text.
    pub date: String,
    /// Predicted chlorophyll-a at display precision, when available.
    pub chlorophyll: Option<String>,
    /// Resolved imagery date, when a result is attached.
    pub resolved_date: Option<String>,
    /// Failure message attached to the row, when the last batch failed.
    pub error: Option<String>,
}

/// Upload outcome kept for display only.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Per-row result objects, shape left to the server.
    Rows(Vec<Value>),
    /// Server-side results file to download.
    Download(String),
}

/// Exported CSV text plus the file name to offer for download.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    /// Suggested download file name.
    pub file_name: String,
    /// CSV text.
    pub text: String,
}

/// Everything the front-end needs to render the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayView {
    /// Table rows joined with results, in store order.
    pub rows: Vec<RowView>,
    /// Ordered marker list for the map widget.
    pub markers: Vec<Marker>,
    /// Point the map should center on.
    pub center: GeoPoint,
    /// Error banner, if the last action failed.
    pub banner: Option<String>,
    /// Summary of the last CSV import, if any.
    pub import: Option<ImportSummary>,
    /// Outcome of the last file upload, if any.
    pub upload: Option<UploadOutcome>,
}

/// Orchestrates user actions against the record store and exposes the
/// derived view.
///
/// The session owns the store exclusively; map clicks and row edits are
/// applied here, and submissions go through the batch submitter, which
/// refuses overlap. The store stays editable while a submission is in
/// flight (front-ends hold a [`SharedStore`] handle); stale outcomes are
/// reconciled per id at merge time.
pub struct Session {
    config: BloomwatchConfig,
    store: SharedStore,
    submitter: Arc<BatchSubmitter>,
    mode: ClickMode,
    banner: Option<String>,
    last_import: Option<ImportSummary>,
    last_upload: Option<UploadOutcome>,
}

impl Session {
    /// Create an empty session.
    pub fn new(config: BloomwatchConfig, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            config,
            store: shared_store(RecordStore::new()),
            submitter: Arc::new(BatchSubmitter::new(predictor)),
            mode: ClickMode::Batch,
            banner: None,
            last_import: None,
            last_upload: None,
        }
    }

    /// Handle to the live store, for edits while a submission is in flight.
    pub fn store_handle(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Change how map clicks are interpreted.
    pub fn set_mode(&mut self, mode: ClickMode) {
        self.mode = mode;
    }

    /// Append an empty row for editing.
    pub fn add_row(&mut self) -> RecordId {
        self.store.lock().append(Record::blank())
    }

    /// Edit one field of one row.
    pub fn edit(&mut self, id: RecordId, field: RecordField, value: String) -> Result<(), StoreError> {
        self.store.lock().update(id, field, value)
    }

    /// Remove a row and its result.
    pub fn remove_row(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.store.lock().remove(id)
    }

    /// Apply a map click according to the current mode.
    pub fn map_click(&mut self, point: GeoPoint) {
        match map::click_intent(point, self.mode) {
            ClickIntent::ReplaceSole { point } => {
                let mut store = self.store.lock();
                let id = match store.rows().first() {
                    Some(record) => record.id,
                    None => store.append(Record::blank()),
                };
                // The sole record exists; these updates cannot miss.
                let _ = store.update(
                    id,
                    RecordField::Latitude,
                    map::click_coordinate_text(point.latitude),
                );
                let _ = store.update(
                    id,
                    RecordField::Longitude,
                    map::click_coordinate_text(point.longitude),
                );
                let _ = store.update(id, RecordField::Date, String::new());
            }
            ClickIntent::Append { point } => {
                self.store.lock().append(Record::new(
                    map::click_coordinate_text(point.latitude),
                    map::click_coordinate_text(point.longitude),
                    String::new(),
                ));
            }
        }
    }

    /// Replace the store contents from CSV text, reporting the summary.
    ///
    /// If a submission is in flight, its merge targets all disappear with
    /// the replaced ids and are discarded on arrival; that is the designed
    /// cancellation path.
    pub fn import_csv(&mut self, text: &str) -> ImportSummary {
        let import = csv::parse(text);
        let summary = ImportSummary {
            accepted: import.accepted.len(),
            rejected: import.rejected,
        };
        self.store.lock().replace_all(import.accepted);
        info!(
            "csv import applied (accepted={}, rejected={})",
            summary.accepted, summary.rejected
        );
        self.last_import = Some(summary);
        self.banner = None;
        summary
    }

    /// Export the current records and results as CSV.
    pub fn export_csv(&self) -> Result<CsvExport, CsvError> {
        let store = self.store.lock();
        let text = csv::serialize(store.rows(), store.results())?;
        Ok(CsvExport {
            file_name: self.config.export.file_name.clone(),
            text,
        })
    }

    /// Submit the current records and merge the results back.
    pub async fn predict(&mut self) -> Result<MergeReport, SubmitError> {
        let outcome = self.submitter.submit(&self.store).await;
        self.banner = match &outcome {
            Ok(_) => None,
            Err(SubmitError::Busy) => Some(BUSY_MESSAGE.to_string()),
            Err(SubmitError::Validation { .. }) => Some(VALIDATION_MESSAGE.to_string()),
            Err(error) => Some(error.to_string()),
        };
        outcome
    }

    /// Whether a submission is currently unresolved.
    pub fn in_flight(&self) -> bool {
        self.submitter.is_in_flight()
    }

    /// Keep an upload outcome for display.
    pub fn record_upload(&mut self, response: UploadResponse) {
        self.last_upload = Some(match response {
            UploadResponse::Rows(rows) => UploadOutcome::Rows(rows),
            UploadResponse::Download { download_url } => UploadOutcome::Download(download_url),
        });
    }

    /// Derive the current display view: records joined with results and
    /// markers, all computed from the same store lock.
    pub fn view(&self) -> DisplayView {
        let store = self.store.lock();
        let snapshot = store.snapshot();
        let rows = snapshot
            .records()
            .iter()
            .map(|record| {
                let result = store.result(record.id);
                RowView {
                    id: record.id,
                    latitude: record.latitude.clone(),
                    longitude: record.longitude.clone(),
                    date: record.date.clone(),
                    chlorophyll: result
                        .and_then(|result| result.chlorophyll_a)
                        .map(format_coordinate),
                    resolved_date: result
                        .filter(|result| result.error.is_none())
                        .map(|result| result.resolved_date.clone()),
                    error: result
                        .and_then(|result| result.error.as_ref())
                        .map(|error| error.to_string()),
                }
            })
            .collect();
        let markers = map::markers_for(&snapshot);
        let center = markers
            .first()
            .map(|marker: &Marker| GeoPoint {
                latitude: marker.latitude,
                longitude: marker.longitude,
            })
            .unwrap_or(GeoPoint {
                latitude: self.config.map.center_lat,
                longitude: self.config.map.center_lon,
            });
        DisplayView {
            rows,
            markers,
            center,
            banner: self.banner.clone(),
            import: self.last_import,
            upload: self.last_upload.clone(),
        }
    }
}
