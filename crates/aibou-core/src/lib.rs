//! # Aibou Core
//!
//! Shared building blocks for the Aibou fine-tuning pipeline: dataset
//! records, fixed-length tokenization, hyperparameter configuration,
//! and the pipeline error type.
//!
//! ## Quick Start
//!
//! ```rust
//! use aibou_core::encoder::fit_to_len;
//!
//! let ids = fit_to_len(vec![5, 6, 7], 5, 0);
//! assert_eq!(ids, vec![5, 6, 7, 0, 0]);
//! ```
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;

// Re-export primary API
pub use config::TrainingConfig;
pub use dataset::{TrainingExample, load_jsonl, validate_examples};
pub use encoder::{EncodedExample, Encoder, fit_to_len};
pub use error::{AibouError, Result};
