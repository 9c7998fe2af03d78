//! Record synchronization and batch submission for chlorophyll-a queries.
//!
//! This crate owns the record store, the CSV round-trip codec, the map
//! marker projection, and the batch submitter used by every front-end.

pub mod csv;
pub mod error;
pub mod map;
pub mod predictor;
pub mod session;
pub mod store;
pub mod submit;
pub mod types;

pub use csv::CsvImport;
pub use error::{CsvError, PredictorError, StoreError, SubmitError};
pub use map::{ClickIntent, ClickMode};
pub use predictor::Predictor;
pub use session::{CsvExport, DisplayView, ImportSummary, RowView, Session, UploadOutcome};
pub use store::{RecordStore, SharedStore, shared_store};
pub use submit::{BatchSubmitter, MergeReport, validate_snapshot};
pub use types::{
    GeoPoint, Marker, PredictionResult, Record, RecordDraft, RecordField, RecordId, Snapshot,
};
