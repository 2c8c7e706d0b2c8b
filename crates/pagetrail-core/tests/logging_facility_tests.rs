//! Logging facility tests: events emitted by the canonical macros.

use pagetrail_core::errors::{ExError, ExErrorKind};
use pagetrail_core::logging_facility::init_test_capture;
use pagetrail_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_start_and_end_events() {
    let capture = init_test_capture();
    log_op_start!("lf_start_end", page_id = "p-lf");
    log_op_end!("lf_start_end", duration_ms = 7u64);

    let events = capture.events_for("lf_start_end");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some("start"));
    assert_eq!(events[0].field("page_id"), Some("p-lf"));
    assert_eq!(events[1].event.as_deref(), Some("end"));
    assert_eq!(events[1].field("duration_ms"), Some("7"));
}

#[test]
fn test_error_event_carries_code() {
    let capture = init_test_capture();
    let err = ExError::new(ExErrorKind::CorruptedSnapshot).with_message("missing settings");
    log_op_error!("lf_error", err, duration_ms = 1u64);

    capture.assert_event_exists("lf_error", "end_error");
    let events = capture.events_for("lf_error");
    assert_eq!(events[0].field("err_code"), Some("ERR_CORRUPTED_SNAPSHOT"));
    assert_eq!(events[0].level, tracing::Level::ERROR);
}
