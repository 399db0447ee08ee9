//! The fine-tuning loop: epochs over shuffled batches with AdamW and
//! linear learning-rate warmup.

use aibou_core::config::TrainingConfig;
use aibou_core::encoder::EncodedExample;
use aibou_core::error::{AibouError, Result};
use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};

use crate::model::Seq2SeqModel;
use crate::status::{StatusEvent, StatusSink};

/// Summary of a completed fine-tuning pass.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Optimizer steps taken.
    pub steps: usize,
    /// Loss at the last step.
    pub final_loss: f64,
}

/// Learning rate at `step`: linear warmup, then the configured rate.
fn lr_at(step: usize, config: &TrainingConfig) -> f64 {
    if step < config.warmup_steps {
        config.learning_rate * (step + 1) as f64 / config.warmup_steps as f64
    } else {
        config.learning_rate
    }
}

/// Deterministic Fisher-Yates permutation of `0..len`.
fn shuffled_indices(len: usize, rng: &mut oorandom::Rand64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    for i in (1..len).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    order
}

/// Runs the blocking training procedure over encoded examples.
pub struct FineTuner<'a> {
    config: &'a TrainingConfig,
    device: &'a Device,
}

impl<'a> FineTuner<'a> {
    pub fn new(config: &'a TrainingConfig, device: &'a Device) -> Self {
        Self { config, device }
    }

    /// Run every epoch to completion. Blocks for the whole pass; there
    /// is no resume, early stopping, or cancellation.
    pub fn run(
        &self,
        model: &mut Seq2SeqModel,
        examples: &[EncodedExample],
        pad_id: u32,
        sink: &dyn StatusSink,
    ) -> Result<TrainReport> {
        if examples.is_empty() {
            return Err(AibouError::EmptyDataset);
        }

        let params = ParamsAdamW {
            lr: self.config.learning_rate,
            weight_decay: self.config.weight_decay,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(model.trainable_vars(), params)
            .map_err(|e| AibouError::Candle(e.to_string()))?;

        let batches_per_epoch = examples.len().div_ceil(self.config.batch_size);
        let total_steps = batches_per_epoch * self.config.epochs;
        let mut rng = oorandom::Rand64::new(u128::from(self.config.seed));

        let mut step = 0;
        let mut last_loss = 0.0f64;
        for epoch in 0..self.config.epochs {
            let order = shuffled_indices(examples.len(), &mut rng);
            for chunk in order.chunks(self.config.batch_size) {
                let (input_ids, labels) = self.stack_batch(examples, chunk)?;

                optimizer.set_learning_rate(lr_at(step, self.config));
                let logits = model.forward_train(&input_ids, &labels)?;
                let loss = Seq2SeqModel::loss(&logits, &labels, pad_id)?;
                optimizer
                    .backward_step(&loss)
                    .map_err(|e| AibouError::Candle(e.to_string()))?;

                last_loss = f64::from(
                    loss.to_scalar::<f32>()
                        .map_err(|e| AibouError::Candle(e.to_string()))?,
                );
                step += 1;

                if step % self.config.logging_steps == 0 || step == total_steps {
                    sink.emit(StatusEvent::Step {
                        epoch: epoch + 1,
                        step,
                        total_steps,
                        loss: last_loss,
                    });
                }
            }
        }

        Ok(TrainReport {
            steps: step,
            final_loss: last_loss,
        })
    }

    /// Stack a batch of encoded examples into `[batch, len]` tensors.
    fn stack_batch(&self, examples: &[EncodedExample], idx: &[usize]) -> Result<(Tensor, Tensor)> {
        let mut inputs = Vec::with_capacity(idx.len() * self.config.prompt_len);
        let mut labels = Vec::with_capacity(idx.len() * self.config.response_len);
        for &i in idx {
            inputs.extend_from_slice(&examples[i].input_ids);
            labels.extend_from_slice(&examples[i].labels);
        }

        let rows = idx.len();
        let input_ids = Tensor::from_vec(inputs, (rows, self.config.prompt_len), self.device)
            .map_err(|e| AibouError::Candle(e.to_string()))?;
        let labels = Tensor::from_vec(labels, (rows, self.config.response_len), self.device)
            .map_err(|e| AibouError::Candle(e.to_string()))?;
        Ok((input_ids, labels))
    }
}
