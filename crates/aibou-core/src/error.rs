use thiserror::Error;

/// Errors that can occur across the Aibou training pipeline.
#[derive(Debug, Error)]
pub enum AibouError {
    /// The dataset file contained no usable records.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A JSONL line could not be decoded into a training example.
    #[error("malformed training record at line {line}: {msg}")]
    Dataset {
        /// 1-based line number in the dataset file.
        line: usize,
        /// What went wrong with the record.
        msg: String,
    },

    /// The tokenizer could not be loaded or an encode call failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Model weights or config could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Candle ML framework error.
    #[error("ML framework error: {0}")]
    Candle(String),

    /// A hyperparameter failed validation.
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Aibou operations.
pub type Result<T> = std::result::Result<T, AibouError>;
