//! JSONL dataset loading for prompt/response fine-tuning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AibouError, Result};

/// A single prompt/response training record, immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub prompt: String,
    pub response: String,
}

/// Load training examples from a line-delimited JSON file.
///
/// Blank lines are skipped. A line missing `prompt` or `response` is
/// an error with its line number, never a silent skip.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut examples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let example: TrainingExample =
            serde_json::from_str(line).map_err(|e| AibouError::Dataset {
                line: idx + 1,
                msg: e.to_string(),
            })?;
        examples.push(example);
    }

    if examples.is_empty() {
        return Err(AibouError::EmptyDataset);
    }

    tracing::debug!(
        "loaded {} examples from {}",
        examples.len(),
        path.as_ref().display()
    );
    Ok(examples)
}

/// Reject records that would tokenize to nothing.
pub fn validate_examples(examples: &[TrainingExample]) -> Result<()> {
    for (idx, ex) in examples.iter().enumerate() {
        if ex.prompt.trim().is_empty() {
            return Err(AibouError::Dataset {
                line: idx + 1,
                msg: "prompt is empty".into(),
            });
        }
        if ex.response.trim().is_empty() {
            return Err(AibouError::Dataset {
                line: idx + 1,
                msg: "response is empty".into(),
            });
        }
    }
    Ok(())
}
