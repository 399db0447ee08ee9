//! # Aibou
//!
//! Umbrella crate for the Aibou fine-tuning pipeline. Re-exports the
//! core data types and the trainer so downstream users depend on one
//! crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aibou::{CandleBackend, LogSink, Orchestrator, TrainingConfig};
//! use std::path::PathBuf;
//!
//! let orchestrator = Orchestrator::new(
//!     PathBuf::from("training_data.jsonl"),
//!     PathBuf::from("models/flan-t5-base"),
//!     PathBuf::from("pal-chatbot-trained"),
//!     TrainingConfig::default(),
//! );
//! let backend = CandleBackend::auto().unwrap();
//! orchestrator.run(&backend, &LogSink).unwrap();
//! ```

pub use aibou_core::{
    AibouError, EncodedExample, Encoder, Result, TrainingConfig, TrainingExample, fit_to_len,
    load_jsonl, validate_examples,
};
pub use aibou_trainer::{
    CandleBackend, FineTuner, LogSink, MemorySink, Orchestrator, Outcome, StatusEvent, StatusSink,
    TrainBackend, TrainReport,
};
