//! Candle wrapper around a pretrained T5-style seq2seq model.
//!
//! Weights are loaded into a trainable `VarMap` so the optimizer can
//! update them in place, then saved back to safetensors once the
//! fine-tuning pass is done.

use std::path::Path;

use aibou_core::error::{AibouError, Result};
use candle_core::{D, DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};

/// A pretrained seq2seq model with trainable variables.
pub struct Seq2SeqModel {
    model: T5ForConditionalGeneration,
    varmap: VarMap,
    start_id: u32,
}

impl Seq2SeqModel {
    /// Load a pretrained snapshot directory (`config.json` +
    /// `model.safetensors`) into trainable variables on `device`.
    pub fn load<P: AsRef<Path>>(dir: P, device: &Device, dtype: DType) -> Result<Self> {
        let dir = dir.as_ref();
        let config_path = dir.join("config.json");
        let weights_path = dir.join("model.safetensors");

        let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
            AibouError::ModelLoad(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let mut config: t5::Config = serde_json::from_str(&config_str)
            .map_err(|e| AibouError::ModelLoad(format!("failed to parse config.json: {e}")))?;
        // `forward_train` drives the decoder one position at a time and
        // needs the kv cache regardless of what the snapshot says.
        config.use_cache = true;

        if !weights_path.exists() {
            return Err(AibouError::ModelLoad(format!(
                "weights not found at {}",
                weights_path.display()
            )));
        }

        let start_id = config
            .decoder_start_token_id
            .unwrap_or(config.pad_token_id) as u32;

        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);
        let model = T5ForConditionalGeneration::load(vb, &config)
            .map_err(|e| AibouError::Candle(e.to_string()))?;
        varmap
            .load(&weights_path)
            .map_err(|e| AibouError::ModelLoad(e.to_string()))?;

        tracing::debug!("loaded model from {}", dir.display());
        Ok(Self {
            model,
            varmap,
            start_id,
        })
    }

    /// Every trainable variable, for the optimizer.
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Teacher-forced forward pass: `labels` shifted right form the
    /// decoder inputs. Returns logits of shape `[batch, seq, vocab]`.
    pub fn forward_train(&mut self, input_ids: &Tensor, labels: &Tensor) -> Result<Tensor> {
        let decoder_input_ids = shift_right(labels, self.start_id)?;
        self.forward_train_inner(input_ids, &decoder_input_ids)
            .map_err(|e| AibouError::Candle(e.to_string()))
    }

    fn forward_train_inner(
        &mut self,
        input_ids: &Tensor,
        decoder_input_ids: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let seq_len = decoder_input_ids.dim(1)?;
        let encoder_output = self.model.encode(input_ids)?;

        // `decode` projects only the newest decoder position to vocab
        // logits, so feed one position per step through the kv cache
        // and stack the per-step `[batch, vocab]` outputs.
        self.model.clear_kv_cache();
        let mut steps = Vec::with_capacity(seq_len);
        for pos in 0..seq_len {
            let token = decoder_input_ids.narrow(1, pos, 1)?;
            steps.push(self.model.decode(&token, &encoder_output)?);
        }
        Tensor::stack(&steps, 1)
    }

    /// Mean cross-entropy over non-pad label positions.
    pub fn loss(logits: &Tensor, labels: &Tensor, pad_id: u32) -> Result<Tensor> {
        loss_inner(logits, labels, pad_id).map_err(|e| AibouError::Candle(e.to_string()))
    }

    /// Save the fine-tuned weights as `model.safetensors` in `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let path = dir.as_ref().join("model.safetensors");
        self.varmap
            .save(&path)
            .map_err(|e| AibouError::Candle(e.to_string()))
    }
}

/// Prepend the decoder start token, dropping the last label position.
pub fn shift_right(labels: &Tensor, start_id: u32) -> Result<Tensor> {
    shift_right_inner(labels, start_id).map_err(|e| AibouError::Candle(e.to_string()))
}

fn shift_right_inner(labels: &Tensor, start_id: u32) -> candle_core::Result<Tensor> {
    let (batch, seq_len) = labels.dims2()?;
    let start = Tensor::full(start_id, (batch, 1), labels.device())?;
    let body = labels.narrow(1, 0, seq_len - 1)?;
    Tensor::cat(&[&start, &body], 1)
}

fn loss_inner(logits: &Tensor, labels: &Tensor, pad_id: u32) -> candle_core::Result<Tensor> {
    let (batch, seq_len, vocab) = logits.dims3()?;
    let logits = logits.reshape((batch * seq_len, vocab))?;
    let labels = labels.reshape((batch * seq_len,))?;

    let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
    let nll = log_probs
        .gather(&labels.unsqueeze(1)?, 1)?
        .squeeze(1)?
        .neg()?
        .to_dtype(DType::F32)?;

    // Pad positions carry no signal.
    let mask = labels.ne(pad_id)?.to_dtype(DType::F32)?;
    let total = (nll * &mask)?.sum_all()?;
    let count = mask.sum_all()?.clamp(1f32, f32::MAX)?;
    total.broadcast_div(&count)
}

#[cfg(test)]
impl Seq2SeqModel {
    /// Build a randomly initialized model straight from a config.
    pub(crate) fn from_config(config: &t5::Config, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = T5ForConditionalGeneration::load(vb, config)
            .map_err(|e| AibouError::Candle(e.to_string()))?;
        let start_id = config
            .decoder_start_token_id
            .unwrap_or(config.pad_token_id) as u32;
        Ok(Self {
            model,
            varmap,
            start_id,
        })
    }
}

/// A T5 small enough to train on CPU in unit tests.
#[cfg(test)]
pub(crate) fn tiny_t5_config() -> t5::Config {
    t5::Config {
        vocab_size: 32,
        d_model: 16,
        d_kv: 4,
        d_ff: 32,
        num_layers: 1,
        num_decoder_layers: Some(1),
        num_heads: 4,
        relative_attention_num_buckets: 8,
        relative_attention_max_distance: 16,
        dropout_rate: 0.0,
        layer_norm_epsilon: 1e-6,
        initializer_factor: 1.0,
        feed_forward_proj: t5::ActivationWithOptionalGating {
            gated: false,
            activation: candle_nn::Activation::Relu,
        },
        tie_word_embeddings: true,
        is_decoder: false,
        is_encoder_decoder: true,
        use_cache: true,
        pad_token_id: 0,
        eos_token_id: 1,
        decoder_start_token_id: Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_right_prepends_start_token() {
        let device = Device::Cpu;
        let labels = Tensor::from_vec(vec![5u32, 6, 7, 8, 9, 10], (2, 3), &device).unwrap();

        let shifted = shift_right(&labels, 0).unwrap();
        let rows: Vec<Vec<u32>> = shifted.to_vec2().unwrap();
        assert_eq!(rows, vec![vec![0, 5, 6], vec![0, 8, 9]]);
    }

    #[test]
    fn loss_ignores_pad_positions() {
        let device = Device::Cpu;
        // Two positions over a 3-word vocab; the second position is pad.
        let logits = Tensor::from_vec(
            vec![2.0f32, 0.0, 0.0, 0.0, 5.0, 0.0],
            (1, 2, 3),
            &device,
        )
        .unwrap();
        let labels = Tensor::from_vec(vec![1u32, 0], (1, 2), &device).unwrap();

        let loss = Seq2SeqModel::loss(&logits, &labels, 0).unwrap();
        let value = loss.to_scalar::<f32>().unwrap();

        // Only the first position counts: -log_softmax([2,0,0])[1].
        let denom = (2.0f32.exp() + 1.0 + 1.0).ln();
        let expected = denom - 0.0;
        assert!((value - expected).abs() < 1e-4, "got {value}, want {expected}");
    }

    #[test]
    fn loss_is_scalar_shaped() {
        let device = Device::Cpu;
        let logits = Tensor::zeros((2, 4, 8), DType::F32, &device).unwrap();
        let labels = Tensor::ones((2, 4), DType::U32, &device).unwrap();

        let loss = Seq2SeqModel::loss(&logits, &labels, 0).unwrap();
        assert_eq!(loss.dims().len(), 0);
    }

    #[test]
    fn forward_train_emits_per_position_logits() {
        let device = Device::Cpu;
        let mut model = Seq2SeqModel::from_config(&tiny_t5_config(), &device).unwrap();

        let input_ids = Tensor::from_vec(vec![3u32, 4, 5, 0], (1, 4), &device).unwrap();
        let labels = Tensor::from_vec(vec![6u32, 7, 1, 0, 0], (1, 5), &device).unwrap();

        let logits = model.forward_train(&input_ids, &labels).unwrap();
        assert_eq!(logits.dims(), &[1, 5, 32]);

        let loss = Seq2SeqModel::loss(&logits, &labels, 0).unwrap();
        assert!(loss.to_scalar::<f32>().unwrap().is_finite());
    }

    #[test]
    fn forward_train_resets_the_cache_between_calls() {
        let device = Device::Cpu;
        let mut model = Seq2SeqModel::from_config(&tiny_t5_config(), &device).unwrap();

        let input_ids = Tensor::from_vec(vec![3u32, 4, 5, 0], (1, 4), &device).unwrap();
        let labels = Tensor::from_vec(vec![6u32, 7, 1, 0, 0], (1, 5), &device).unwrap();

        let first = model.forward_train(&input_ids, &labels).unwrap();
        let second = model.forward_train(&input_ids, &labels).unwrap();
        assert_eq!(first.dims(), second.dims());
    }

    #[test]
    fn loading_missing_directory_fails_cleanly() {
        let result = Seq2SeqModel::load("no/such/model", &Device::Cpu, DType::F32);
        match result {
            Err(err) => assert!(err.to_string().contains("failed to load model")),
            Ok(_) => panic!("load should fail for a missing directory"),
        }
    }
}
