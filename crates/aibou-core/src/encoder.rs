//! Fixed-length tokenization of training records.
//!
//! Prompts and responses are tokenized independently, then fitted to
//! fixed lengths: truncated when over, padded with the tokenizer's pad
//! id when under. Labels mirror the fitted response ids.

use std::path::Path;

use tokenizers::Tokenizer as HfTokenizer;

use crate::config::TrainingConfig;
use crate::dataset::TrainingExample;
use crate::error::{AibouError, Result};

/// A training record after tokenization into fixed-length id arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedExample {
    /// Prompt token ids, exactly `prompt_len` long.
    pub input_ids: Vec<u32>,
    /// 1 over real prompt tokens, 0 over padding. The candle T5
    /// encoder takes token ids only and applies no padding mask, so
    /// the training path carries this field without consuming it.
    pub attention_mask: Vec<u32>,
    /// Response token ids, exactly `response_len` long.
    pub labels: Vec<u32>,
}

/// Truncate or pad `ids` to exactly `len`.
pub fn fit_to_len(mut ids: Vec<u32>, len: usize, pad_id: u32) -> Vec<u32> {
    ids.truncate(len);
    ids.resize(len, pad_id);
    ids
}

/// Tokenizes prompt/response pairs under a fixed length policy.
pub struct Encoder {
    tokenizer: HfTokenizer,
    pad_id: u32,
    prompt_len: usize,
    response_len: usize,
}

impl Encoder {
    /// Wrap a tokenizer with the length policy from `config`.
    ///
    /// The pad id is resolved from the `<pad>` token when the
    /// vocabulary has one, otherwise id 0 (the T5 convention).
    pub fn new(tokenizer: HfTokenizer, config: &TrainingConfig) -> Self {
        let pad_id = tokenizer.token_to_id("<pad>").unwrap_or(0);
        Self {
            tokenizer,
            pad_id,
            prompt_len: config.prompt_len,
            response_len: config.response_len,
        }
    }

    /// Load a `tokenizer.json` file and wrap it.
    pub fn from_file<P: AsRef<Path>>(path: P, config: &TrainingConfig) -> Result<Self> {
        let tokenizer = HfTokenizer::from_file(path.as_ref())
            .map_err(|e| AibouError::Tokenizer(e.to_string()))?;
        Ok(Self::new(tokenizer, config))
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    fn encode_text(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| AibouError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Encode one record into fixed-length id arrays.
    pub fn encode_example(&self, example: &TrainingExample) -> Result<EncodedExample> {
        let prompt_ids = self.encode_text(&example.prompt)?;
        let response_ids = self.encode_text(&example.response)?;

        let real = prompt_ids.len().min(self.prompt_len);
        let mut attention_mask = vec![1u32; real];
        attention_mask.resize(self.prompt_len, 0);

        let input_ids = fit_to_len(prompt_ids, self.prompt_len, self.pad_id);
        let labels = fit_to_len(response_ids, self.response_len, self.pad_id);

        Ok(EncodedExample {
            input_ids,
            attention_mask,
            labels,
        })
    }

    /// Encode every record. Total over well-formed records; the first
    /// failing record aborts the pass.
    pub fn encode_all(&self, examples: &[TrainingExample]) -> Result<Vec<EncodedExample>> {
        examples.iter().map(|ex| self.encode_example(ex)).collect()
    }
}
