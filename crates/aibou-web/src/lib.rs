//! One-button web form for triggering a training run.
//!
//! The page shows a single button and a status panel that polls the
//! orchestrator's messages. All training logic lives in
//! `aibou-trainer`; this surface only relays status strings. A run in
//! flight is guarded per process; the filesystem gate handles runs
//! that already finished.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aibou_core::config::TrainingConfig;
use aibou_trainer::orchestrator::{CandleBackend, Orchestrator};
use aibou_trainer::status::{MemorySink, StatusEvent, StatusSink};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Aibou Trainer</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; }
    button { font-size: 1.2rem; padding: 0.6rem 1.4rem; }
    #status { margin-top: 1.5rem; color: #333; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>Aibou Trainer</h1>
  <p>Fine-tune the chatbot on your prompt/response data.</p>
  <button id="train">Start Training</button>
  <div id="status">Ready to train.</div>
  <script>
    const status = document.getElementById("status");
    document.getElementById("train").addEventListener("click", async () => {
      const res = await fetch("/train", { method: "POST" });
      status.textContent = await res.text();
    });
    setInterval(async () => {
      const res = await fetch("/status");
      const body = await res.json();
      if (body.messages.length > 0) {
        status.textContent = body.messages[body.messages.length - 1];
      }
    }, 1000);
  </script>
</body>
</html>
"#;

/// Shared state behind the three routes.
pub struct AppState {
    pub data_file: PathBuf,
    pub model_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: TrainingConfig,
    pub sink: MemorySink,
    running: AtomicBool,
}

impl AppState {
    pub fn new(
        data_file: PathBuf,
        model_dir: PathBuf,
        output_dir: PathBuf,
        config: TrainingConfig,
    ) -> Self {
        Self {
            data_file,
            model_dir,
            output_dir,
            config,
            sink: MemorySink::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Claim the single in-process run slot. Returns false when a run
    /// is already in flight.
    pub fn try_begin(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/train", post(start_training))
        .route("/status", get(status))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub messages: Vec<String>,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: state.is_running(),
        messages: state.sink.messages(),
    })
}

async fn start_training(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if !state.try_begin() {
        return (StatusCode::CONFLICT, "a training run is already in flight");
    }

    let task_state = state.clone();
    tokio::task::spawn_blocking(move || {
        let orchestrator = Orchestrator::new(
            task_state.data_file.clone(),
            task_state.model_dir.clone(),
            task_state.output_dir.clone(),
            task_state.config.clone(),
        );
        let result = CandleBackend::auto()
            .and_then(|backend| orchestrator.run(&backend, &task_state.sink));
        if let Err(e) = result {
            // The status stream itself just stops on failure; the panel
            // gets one relay line so the operator sees something.
            task_state
                .sink
                .emit(StatusEvent::Message(format!("training failed: {e}")));
            tracing::error!("training run failed: {e}");
        }
        task_state.finish();
    });

    (StatusCode::ACCEPTED, "training started")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(temp: &tempfile::TempDir) -> Arc<AppState> {
        Arc::new(AppState::new(
            temp.path().join("training_data.jsonl"),
            temp.path().join("model"),
            temp.path().join("trained"),
            TrainingConfig::default(),
        ))
    }

    #[test]
    fn run_slot_rejects_second_claim() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp);

        assert!(state.try_begin());
        assert!(!state.try_begin());
        state.finish();
        assert!(state.try_begin());
    }

    #[tokio::test]
    async fn index_serves_the_button_page() {
        let temp = tempfile::TempDir::new().unwrap();
        let app = router(test_state(&temp));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Start Training"));
        assert!(html.contains("/status"));
    }

    #[tokio::test]
    async fn status_reports_messages_and_run_flag() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp);
        state.sink.emit(StatusEvent::Message("hello".into()));

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["running"], false);
        assert_eq!(parsed["messages"][0], "hello");
    }

    #[tokio::test]
    async fn train_conflicts_while_a_run_is_in_flight() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp);
        assert!(state.try_begin());

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/train")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn train_against_existing_artifacts_short_circuits() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp);
        std::fs::create_dir_all(&state.output_dir).unwrap();

        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/train")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // The gated run finishes almost immediately; poll briefly.
        for _ in 0..100 {
            if !state.is_running() && !state.sink.messages().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let messages = state.sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("already trained"));
    }
}
