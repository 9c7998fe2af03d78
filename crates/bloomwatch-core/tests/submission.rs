//! Batch submission integration tests: positional merge, alignment,
//! stale-id discard, busy rejection.

use bloomwatch_core::{
    BatchSubmitter, Record, RecordDraft, RecordField, RecordStore, SharedStore, SubmitError,
    shared_store,
};
use bloomwatch_test_utils::{ScriptedPredictor, payload};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn record(lat: &str, lon: &str, date: &str) -> Record {
    Record::new(lat.to_string(), lon.to_string(), date.to_string())
}

fn seeded_store(rows: &[(&str, &str, &str)]) -> SharedStore {
    let mut store = RecordStore::new();
    for (lat, lon, date) in rows {
        store.append(record(lat, lon, date));
    }
    shared_store(store)
}

/// Wait until the scripted predictor has captured the batch request, i.e.
/// the submission snapshot is taken and the call is held at the gate.
async fn wait_for_capture(predictor: &ScriptedPredictor) {
    for _ in 0..1000 {
        if !predictor.batch_requests().is_empty() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("submission never reached the predictor");
}

#[tokio::test]
async fn batch_of_three_merges_distinct_results_in_order() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![
        payload(1.1, "2023-04-27"),
        payload(1.2, "2023-04-28"),
        payload(1.3, "2023-04-29"),
    ]);
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
        ("16.3", "81.7", "2023-05-01"),
    ]);
    let submitter = BatchSubmitter::new(predictor.clone());

    let report = submitter.submit(&store).await.expect("submit");
    assert_eq!(report.attached, 3);
    assert_eq!(report.discarded, 0);

    let store = store.lock();
    let values: Vec<Option<f64>> = store
        .rows()
        .iter()
        .map(|row| store.result(row.id).and_then(|result| result.chlorophyll_a))
        .collect();
    assert_eq!(values, vec![Some(1.1), Some(1.2), Some(1.3)]);

    let request = &predictor.batch_requests()[0];
    assert_eq!(request.coordinates.len(), 3);
    assert_eq!(request.coordinates[2].lat, 16.3);
    assert_eq!(request.date, Some("2023-05-01".to_string()));
}

#[tokio::test]
async fn merge_is_positional_despite_interleaved_edits() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![
        payload(1.1, "2023-04-27"),
        payload(1.2, "2023-04-28"),
        payload(1.3, "2023-04-29"),
    ]);
    let gate = predictor.hold();
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
        ("16.3", "81.7", "2023-05-01"),
    ]);
    let ids: Vec<_> = store.lock().rows().iter().map(|row| row.id).collect();
    let submitter = Arc::new(BatchSubmitter::new(predictor.clone()));

    let task = tokio::spawn({
        let submitter = Arc::clone(&submitter);
        let store = Arc::clone(&store);
        async move { submitter.submit(&store).await }
    });
    wait_for_capture(&predictor).await;

    // Edits while in flight touch only the live store, never the snapshot.
    store
        .lock()
        .update(ids[1], RecordField::Latitude, "99.9".to_string())
        .expect("edit");

    gate.notify_one();
    let report = task.await.expect("join").expect("submit");
    assert_eq!(report.attached, 3);

    let store = store.lock();
    for (index, id) in ids.iter().enumerate() {
        let result = store.result(*id).expect("result");
        assert_eq!(result.chlorophyll_a, Some(1.1 + index as f64 * 0.1));
    }
}

#[tokio::test]
async fn alignment_mismatch_attaches_nothing() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![payload(1.1, "2023-04-27"), payload(1.2, "2023-04-28")]);
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
        ("16.3", "81.7", "2023-05-01"),
    ]);
    let submitter = BatchSubmitter::new(predictor);

    let err = submitter.submit(&store).await.expect_err("misaligned");
    assert_eq!(
        err,
        SubmitError::Alignment {
            expected: 3,
            actual: 2,
        }
    );

    let store = store.lock();
    assert!(store.results().is_empty());
}

#[tokio::test]
async fn stale_id_outcome_is_discarded_silently() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![
        payload(1.1, "2023-04-27"),
        payload(1.2, "2023-04-28"),
        payload(1.3, "2023-04-29"),
    ]);
    let gate = predictor.hold();
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
        ("16.3", "81.7", "2023-05-01"),
    ]);
    let ids: Vec<_> = store.lock().rows().iter().map(|row| row.id).collect();
    let submitter = Arc::new(BatchSubmitter::new(predictor.clone()));

    let task = tokio::spawn({
        let submitter = Arc::clone(&submitter);
        let store = Arc::clone(&store);
        async move { submitter.submit(&store).await }
    });
    wait_for_capture(&predictor).await;

    store.lock().remove(ids[1]).expect("remove mid-flight");

    gate.notify_one();
    let report = task.await.expect("join").expect("submit");
    assert_eq!(report.attached, 2);
    assert_eq!(report.discarded, 1);

    let store = store.lock();
    // The removed record's outcome reattaches nowhere.
    let first = store.result(ids[0]).expect("first result");
    let third = store.result(ids[2]).expect("third result");
    assert_eq!(first.chlorophyll_a, Some(1.1));
    assert_eq!(third.chlorophyll_a, Some(1.3));
    assert_eq!(store.results().len(), 2);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_refused() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![payload(1.1, "2023-04-27")]);
    let gate = predictor.hold();
    let store = seeded_store(&[("16.1", "81.5", "2023-05-01")]);
    let submitter = Arc::new(BatchSubmitter::new(predictor.clone()));

    let task = tokio::spawn({
        let submitter = Arc::clone(&submitter);
        let store = Arc::clone(&store);
        async move { submitter.submit(&store).await }
    });
    wait_for_capture(&predictor).await;
    assert!(submitter.is_in_flight());

    let err = submitter.submit(&store).await.expect_err("busy");
    assert_eq!(err, SubmitError::Busy);
    // The refused attempt changed nothing.
    {
        let store = store.lock();
        assert_eq!(store.len(), 1);
        assert!(store.results().is_empty());
    }

    gate.notify_one();
    let report = task.await.expect("join").expect("first submit");
    assert_eq!(report.attached, 1);
    assert!(!submitter.is_in_flight());
}

#[tokio::test]
async fn transport_failure_marks_every_record_with_the_same_error() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch_error("service down");
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
    ]);
    let submitter = BatchSubmitter::new(predictor);

    let err = submitter.submit(&store).await.expect_err("transport");
    assert_eq!(err, SubmitError::Transport("service down".to_string()));

    let store = store.lock();
    for row in store.rows() {
        let result = store.result(row.id).expect("error result");
        assert_eq!(result.chlorophyll_a, None);
        assert!(result.error.is_some());
    }
}

#[tokio::test]
async fn validation_failure_blocks_the_whole_batch() {
    let predictor = Arc::new(ScriptedPredictor::new());
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("91.5", "81.6", "2023-05-01"),
        ("16.3", "81.7", ""),
    ]);
    let submitter = BatchSubmitter::new(predictor.clone());

    let err = submitter.submit(&store).await.expect_err("validation");
    assert_eq!(
        err,
        SubmitError::Validation {
            indices: vec![1, 2],
        }
    );
    // Nothing was sent.
    assert!(predictor.batch_requests().is_empty());
    assert!(predictor.single_requests().is_empty());
    assert!(store.lock().results().is_empty());
}

#[tokio::test]
async fn empty_store_is_refused_at_the_gate() {
    let predictor = Arc::new(ScriptedPredictor::new());
    let store = shared_store(RecordStore::new());
    let submitter = BatchSubmitter::new(predictor);

    let err = submitter.submit(&store).await.expect_err("empty");
    assert_eq!(err, SubmitError::Validation { indices: vec![] });
}

#[tokio::test]
async fn fan_out_preserves_order_without_batch_support() {
    let predictor = Arc::new(ScriptedPredictor::without_batch());
    predictor.push_single(payload(1.1, "2023-04-27"));
    predictor.push_single(payload(1.2, "2023-04-28"));
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
    ]);
    let submitter = BatchSubmitter::new(predictor.clone());

    let report = submitter.submit(&store).await.expect("submit");
    assert_eq!(report.attached, 2);

    let singles = predictor.single_requests();
    assert_eq!(singles.len(), 2);
    assert_eq!(singles[0].lat, 16.1);
    assert_eq!(singles[1].lat, 16.2);
    assert!(predictor.batch_requests().is_empty());
}

#[tokio::test]
async fn differing_dates_fan_out_even_with_batch_support() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_single(payload(1.1, "2023-04-27"));
    predictor.push_single(payload(1.2, "2023-05-28"));
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-06-01"),
    ]);
    let submitter = BatchSubmitter::new(predictor.clone());

    let report = submitter.submit(&store).await.expect("submit");
    assert_eq!(report.attached, 2);
    assert!(predictor.batch_requests().is_empty());
    assert_eq!(predictor.single_requests().len(), 2);
}

#[tokio::test]
async fn replace_all_during_flight_discards_the_whole_merge() {
    let predictor = Arc::new(ScriptedPredictor::new());
    predictor.push_batch(vec![payload(1.1, "2023-04-27"), payload(1.2, "2023-04-28")]);
    let gate = predictor.hold();
    let store = seeded_store(&[
        ("16.1", "81.5", "2023-05-01"),
        ("16.2", "81.6", "2023-05-01"),
    ]);
    let submitter = Arc::new(BatchSubmitter::new(predictor.clone()));

    let task = tokio::spawn({
        let submitter = Arc::clone(&submitter);
        let store = Arc::clone(&store);
        async move { submitter.submit(&store).await }
    });
    wait_for_capture(&predictor).await;

    // A bulk import mid-flight mints fresh ids; that is the designed
    // cancellation path for the submission.
    store.lock().replace_all(vec![
        RecordDraft::new("10.0", "20.0", "2024-01-01"),
        RecordDraft::new("11.0", "21.0", "2024-01-02"),
    ]);

    gate.notify_one();
    let report = task.await.expect("join").expect("submit");
    assert_eq!(report.attached, 0);
    assert_eq!(report.discarded, 2);
    assert!(store.lock().results().is_empty());
}
