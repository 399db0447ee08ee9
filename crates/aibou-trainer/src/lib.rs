//! # Aibou Trainer
//!
//! Fine-tunes a pretrained seq2seq model on prompt/response pairs and
//! saves the result as a reloadable artifact directory. The
//! [`orchestrator::Orchestrator`] sequences the run and streams
//! human-readable status messages through a [`status::StatusSink`];
//! the artifact directory's existence marks a run as done.

pub mod device;
pub mod fetch;
pub mod model;
pub mod orchestrator;
pub mod status;
pub mod trainer;

// Re-export primary API
pub use orchestrator::{CandleBackend, Orchestrator, Outcome, PreparedRun, TrainBackend};
pub use status::{LogSink, MemorySink, StatusEvent, StatusSink};
pub use trainer::{FineTuner, TrainReport};
