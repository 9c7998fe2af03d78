//! Marker projection and map click intents.

use crate::types::{GeoPoint, Marker, Snapshot, format_coordinate};
use serde::{Deserialize, Serialize};

/// How the session interprets map clicks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClickMode {
    /// The session works on a single record; clicks reposition it.
    Single,
    /// The session grows a batch; clicks append records.
    Batch,
}

/// Mutation intent produced by a map click. Intents are applied by the
/// session controller, never directly against the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickIntent {
    /// Replace the sole record's coordinates and clear its date.
    ReplaceSole {
        /// Clicked point.
        point: GeoPoint,
    },
    /// Append a new record seeded with the point and an empty date.
    Append {
        /// Clicked point.
        point: GeoPoint,
    },
}

/// Derive the ordered marker list from a snapshot.
///
/// One marker per record whose latitude and longitude both parse as finite
/// numbers; rows with incomplete input are omitted, not errors. Order
/// matches store order so the widget stays aligned with the results table.
pub fn markers_for(snapshot: &Snapshot) -> Vec<Marker> {
    snapshot
        .records()
        .iter()
        .filter_map(|record| {
            let latitude = record.latitude_value()?;
            let longitude = record.longitude_value()?;
            Some(Marker {
                record_id: record.id,
                latitude,
                longitude,
            })
        })
        .collect()
}

/// Turn a map click into a mutation intent for the current mode.
pub fn click_intent(point: GeoPoint, mode: ClickMode) -> ClickIntent {
    match mode {
        ClickMode::Single => ClickIntent::ReplaceSole { point },
        ClickMode::Batch => ClickIntent::Append { point },
    }
}

/// Coordinate text seeded into a record from a click, at the display
/// precision the widget reports.
pub fn click_coordinate_text(value: f64) -> String {
    format_coordinate(value)
}
