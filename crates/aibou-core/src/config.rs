//! Hyperparameters for a fine-tuning run.

use serde::{Deserialize, Serialize};

use crate::error::{AibouError, Result};

/// The full hyperparameter set for one training run.
///
/// Fixed at process start; no environment variables are consulted and
/// nothing mutates the config once a run is underway. The defaults are
/// the values the pipeline ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Examples per optimizer step.
    pub batch_size: usize,
    /// Full passes over the dataset.
    pub epochs: usize,
    /// Peak learning rate after warmup.
    pub learning_rate: f64,
    /// AdamW weight decay.
    pub weight_decay: f64,
    /// Steps of linear learning-rate warmup.
    pub warmup_steps: usize,
    /// Train in bf16 when an accelerator is available.
    pub mixed_precision: bool,
    /// Data loader worker count. Reserved; the in-process candle loop
    /// is single-threaded.
    pub num_workers: usize,
    /// How many checkpoints to retain in the artifact directory.
    pub save_total_limit: usize,
    /// Emit a progress event every this many steps.
    pub logging_steps: usize,
    /// Fixed token length prompts are padded/truncated to.
    pub prompt_len: usize,
    /// Fixed token length responses are padded/truncated to.
    pub response_len: usize,
    /// Shuffle seed, fixed so epochs are reproducible.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            epochs: 8,
            learning_rate: 5e-4,
            weight_decay: 0.01,
            warmup_steps: 50,
            mixed_precision: true,
            num_workers: 2,
            save_total_limit: 1,
            logging_steps: 10,
            prompt_len: 64,
            response_len: 128,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Reject values the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AibouError::InvalidConfig("batch_size must be >= 1".into()));
        }
        if self.epochs == 0 {
            return Err(AibouError::InvalidConfig("epochs must be >= 1".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(AibouError::InvalidConfig(
                "learning_rate must be > 0".into(),
            ));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(AibouError::InvalidConfig(
                "weight_decay must be >= 0".into(),
            ));
        }
        if self.logging_steps == 0 {
            return Err(AibouError::InvalidConfig(
                "logging_steps must be >= 1".into(),
            ));
        }
        if self.prompt_len == 0 || self.response_len == 0 {
            return Err(AibouError::InvalidConfig(
                "sequence lengths must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
