//! Session controller integration tests: view derivation, map intents,
//! CSV import/export, banner behavior.

use bloomwatch_config::BloomwatchConfig;
use bloomwatch_core::{ClickMode, GeoPoint, RecordField, Session, SubmitError};
use bloomwatch_protocol::UploadResponse;
use bloomwatch_test_utils::{ScriptedPredictor, payload};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn session_with(predictor: Arc<ScriptedPredictor>) -> Session {
    Session::new(BloomwatchConfig::default(), predictor)
}

#[tokio::test]
async fn single_record_prediction_is_displayed_at_fixed_precision() {
    let predictor = Arc::new(ScriptedPredictor::without_batch());
    predictor.push_single(payload(2.345678, "2023-04-29"));
    let mut session = session_with(predictor);

    let id = session.add_row();
    session
        .edit(id, RecordField::Latitude, "16.1".to_string())
        .expect("edit lat");
    session
        .edit(id, RecordField::Longitude, "81.5".to_string())
        .expect("edit lon");
    session
        .edit(id, RecordField::Date, "2023-05-01".to_string())
        .expect("edit date");

    let report = session.predict().await.expect("predict");
    assert_eq!(report.attached, 1);

    let view = session.view();
    assert_eq!(view.banner, None);
    assert_eq!(view.rows[0].chlorophyll, Some("2.345678".to_string()));
    assert_eq!(view.rows[0].resolved_date, Some("2023-04-29".to_string()));
}

#[tokio::test]
async fn batch_clicks_append_seeded_rows_and_markers() {
    let mut session = session_with(Arc::new(ScriptedPredictor::new()));
    session.set_mode(ClickMode::Batch);

    session.map_click(GeoPoint {
        latitude: 16.123456789,
        longitude: 81.5,
    });
    session.map_click(GeoPoint {
        latitude: 17.0,
        longitude: 82.0,
    });

    let view = session.view();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].latitude, "16.123457".to_string());
    assert_eq!(view.rows[0].date, String::new());
    assert_eq!(view.markers.len(), 2);
    assert_eq!(view.markers[1].longitude, 82.0);
    // The map centers on the first marker once one exists.
    assert_eq!(view.center.longitude, 81.5);
}

#[tokio::test]
async fn single_mode_click_replaces_the_sole_record_and_clears_its_date() {
    let mut session = session_with(Arc::new(ScriptedPredictor::new()));
    session.set_mode(ClickMode::Single);

    session.map_click(GeoPoint {
        latitude: 16.1,
        longitude: 81.5,
    });
    let first = session.view().rows[0].id;
    session
        .edit(first, RecordField::Date, "2023-05-01".to_string())
        .expect("edit date");

    session.map_click(GeoPoint {
        latitude: 17.5,
        longitude: 82.5,
    });

    let view = session.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].id, first);
    assert_eq!(view.rows[0].latitude, "17.500000".to_string());
    assert_eq!(view.rows[0].date, String::new());
}

#[tokio::test]
async fn empty_session_centers_on_the_configured_default() {
    let session = session_with(Arc::new(ScriptedPredictor::new()));
    let view = session.view();
    assert_eq!(view.rows.len(), 0);
    assert_eq!(view.center.latitude, 16.1);
    assert_eq!(view.center.longitude, 81.5);
}

#[tokio::test]
async fn csv_import_replaces_rows_and_reports_the_summary() {
    let mut session = session_with(Arc::new(ScriptedPredictor::new()));
    session.add_row();

    let summary =
        session.import_csv("lat,lon,date\n16.1,81.5,2023-05-01\nbad,row,\n16.2,81.6,2023-05-02");
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected, 1);

    let view = session.view();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[1].date, "2023-05-02".to_string());
    assert_eq!(view.import, Some(summary));
}

#[tokio::test]
async fn export_joins_results_and_uses_the_configured_file_name() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![payload(2.345678, "2023-04-29"), payload(0.5, "2023-04-30")]);
    let mut session = session_with(predictor);
    session.import_csv("lat,lon,date\n16.1,81.5,2023-05-01\n16.2,81.6,2023-05-01");
    session.predict().await.expect("predict");

    let export = session.export_csv().expect("export");
    assert_eq!(export.file_name, "prediction_results.csv".to_string());
    let mut lines = export.text.lines();
    assert_eq!(
        lines.next(),
        Some("latitude,longitude,date,chlorophyll_a,resolved_date")
    );
    assert_eq!(
        lines.next(),
        Some("16.100000,81.500000,2023-05-01,2.345678,2023-04-29")
    );
    assert_eq!(
        lines.next(),
        Some("16.200000,81.600000,2023-05-01,0.500000,2023-04-30")
    );
}

#[tokio::test]
async fn validation_failure_raises_the_banner_and_sends_nothing() {
    let predictor = Arc::new(ScriptedPredictor::new());
    let mut session = session_with(predictor.clone());
    let id = session.add_row();
    session
        .edit(id, RecordField::Latitude, "16.1".to_string())
        .expect("edit lat");
    // Longitude and date left empty.

    let err = session.predict().await.expect_err("validation");
    assert_eq!(err, SubmitError::Validation { indices: vec![0] });

    let view = session.view();
    assert_eq!(
        view.banner,
        Some("Please enter valid coordinates and date.".to_string())
    );
    assert!(predictor.batch_requests().is_empty());
    assert!(predictor.single_requests().is_empty());
}

#[tokio::test]
async fn transport_failure_surfaces_the_server_message_then_clears_on_success() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch_error("no imagery for region");
    predictor.push_batch(vec![payload(1.0, "2023-04-29")]);
    let mut session = session_with(predictor);
    session.import_csv("lat,lon,date\n16.1,81.5,2023-05-01");

    let err = session.predict().await.expect_err("transport");
    assert_eq!(
        err,
        SubmitError::Transport("no imagery for region".to_string())
    );
    let view = session.view();
    assert_eq!(
        view.banner,
        Some("transport error: no imagery for region".to_string())
    );
    assert_eq!(view.rows[0].chlorophyll, None);
    assert!(view.rows[0].error.is_some());

    // Each click is a fresh idempotent attempt; success clears the banner.
    session.predict().await.expect("retry");
    let view = session.view();
    assert_eq!(view.banner, None);
    assert_eq!(view.rows[0].chlorophyll, Some("1.000000".to_string()));
}

#[tokio::test]
async fn upload_outcome_is_kept_for_display() {
    let mut session = session_with(Arc::new(ScriptedPredictor::new()));
    session.record_upload(UploadResponse::Download {
        download_url: "https://example.com/out.csv".to_string(),
    });

    let view = session.view();
    assert_eq!(
        view.upload,
        Some(bloomwatch_core::UploadOutcome::Download(
            "https://example.com/out.csv".to_string()
        ))
    );
}
