//! Voice capture driven through the recognizer and the pump.

use std::time::Duration;

use besto::capture::machine::{ENGINE_UNAVAILABLE, LISTENING_PROMPT};
use besto::capture::{spawn_recognition_pump, CaptureStatus};
use besto::models::classification::ClassificationType;
use besto::speech::RecognitionErrorCode;
use besto::AppError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{classification, count, task_item, FakeAssistant, Harness};

struct Running {
    harness: Harness,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

impl Running {
    fn start(assistant: FakeAssistant) -> Self {
        let mut harness = Harness::new(assistant);
        let events = harness.recognition.take().expect("receiver");
        let cancel = CancellationToken::new();
        let pump = spawn_recognition_pump(harness.state.capture.clone(), events, cancel.clone());
        Self {
            harness,
            cancel,
            pump,
        }
    }

    async fn listen(&self) {
        let snapshot = self.harness.state.capture.toggle().await.expect("toggle");
        assert_eq!(snapshot.status, CaptureStatus::Listening);
        assert_eq!(snapshot.feedback, LISTENING_PROMPT);
        assert!(self.harness.state.recognizer.is_listening());
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.pump.await.expect("pump exits");
    }
}

fn task_capture() -> FakeAssistant {
    FakeAssistant::classifying(classification(
        ClassificationType::Task,
        "Call mom",
        vec![task_item("call mom")],
    ))
}

#[tokio::test]
async fn spoken_task_runs_the_pipeline() {
    let running = Running::start(task_capture());
    running.listen().await;

    // Starting to listen does not debit.
    assert_eq!(
        running.harness.state.ledger.remaining().await.expect("ledger"),
        1000
    );

    running
        .harness
        .state
        .recognizer
        .submit_transcript("call mom tonight")
        .expect("transcript");
    running.harness.wait_for(CaptureStatus::Idle).await;

    let tasks = running.harness.state.tasks.list().await.expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].content, "call mom");
    assert_eq!(
        running.harness.state.ledger.remaining().await.expect("ledger"),
        890
    );
    running.stop().await;
}

#[tokio::test]
async fn permission_error_shows_then_resets() {
    let running = Running::start(task_capture());
    running.listen().await;

    running
        .harness
        .state
        .recognizer
        .report_error(RecognitionErrorCode::NotAllowed)
        .expect("report");
    running.harness.wait_for(CaptureStatus::Error).await;
    assert_eq!(
        running.harness.state.capture.snapshot().await.feedback,
        "Error: Permission denied"
    );

    running.harness.wait_for(CaptureStatus::Idle).await;
    assert_eq!(count(&running.harness.assistant.classify_calls), 0);
    running.stop().await;
}

#[tokio::test]
async fn no_speech_goes_straight_back_to_idle() {
    let running = Running::start(task_capture());
    running.listen().await;

    running
        .harness
        .state
        .recognizer
        .report_error(RecognitionErrorCode::from("no-speech".to_owned()))
        .expect("report");
    running.harness.wait_for(CaptureStatus::Idle).await;

    assert_eq!(count(&running.harness.assistant.classify_calls), 0);
    assert_eq!(
        running.harness.state.ledger.remaining().await.expect("ledger"),
        1000
    );
    running.stop().await;
}

#[tokio::test]
async fn empty_transcript_returns_to_idle() {
    let running = Running::start(task_capture());
    running.listen().await;

    running
        .harness
        .state
        .recognizer
        .submit_transcript("  ")
        .expect("transcript");
    running.harness.wait_for(CaptureStatus::Idle).await;
    assert_eq!(count(&running.harness.assistant.classify_calls), 0);
    running.stop().await;
}

#[tokio::test]
async fn second_toggle_stops_listening() {
    let running = Running::start(task_capture());
    running.listen().await;

    running.harness.state.capture.toggle().await.expect("stop");
    assert!(!running.harness.state.recognizer.is_listening());
    running.harness.wait_for(CaptureStatus::Idle).await;

    let err = running
        .harness
        .state
        .recognizer
        .submit_transcript("too late")
        .expect_err("not listening");
    assert!(matches!(err, AppError::InvalidState(_)));
    running.stop().await;
}

#[tokio::test]
async fn missing_engine_reports_unavailable() {
    let harness = Harness::without_recognizer(task_capture());

    let err = harness.state.capture.toggle().await.expect_err("no engine");
    assert!(matches!(err, AppError::EngineUnavailable(_)));

    let snapshot = harness.state.capture.snapshot().await;
    assert_eq!(snapshot.status, CaptureStatus::Error);
    assert_eq!(snapshot.feedback, ENGINE_UNAVAILABLE);

    // Typed capture still works without a recognizer.
    let snapshot = harness
        .state
        .capture
        .capture_text("call mom")
        .await
        .expect("typed capture");
    assert_eq!(snapshot.status, CaptureStatus::Success);
}

#[tokio::test]
async fn missing_engine_leaves_a_running_capture_alone() {
    let harness = Harness::without_recognizer(task_capture().slow(Duration::from_millis(300)));

    let capture = harness.state.capture.clone();
    let first = tokio::spawn(async move { capture.capture_text("call mom").await });
    harness.wait_for(CaptureStatus::Processing).await;

    let err = harness.state.capture.toggle().await.expect_err("no engine");
    assert!(matches!(err, AppError::EngineUnavailable(_)));
    assert_eq!(
        harness.state.capture.snapshot().await.status,
        CaptureStatus::Processing
    );

    // The in-flight capture still owns the controller.
    let err = harness
        .state
        .capture
        .capture_text("call dad")
        .await
        .expect_err("busy");
    assert!(matches!(err, AppError::InvalidState(_)));

    let snapshot = first.await.expect("join").expect("first capture");
    assert_eq!(snapshot.status, CaptureStatus::Success);
    assert_eq!(count(&harness.assistant.classify_calls), 1);
    assert_eq!(harness.state.tasks.list().await.expect("tasks").len(), 1);
}

#[tokio::test]
async fn pump_stops_on_cancel() {
    let running = Running::start(task_capture());
    running.cancel.cancel();
    running.pump.await.expect("pump exits");
}
