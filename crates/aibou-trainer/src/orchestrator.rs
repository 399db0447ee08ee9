//! Sequences a fine-tuning run: idempotency gate, dataset load,
//! tokenization, training, artifact save.
//!
//! The artifact directory's existence is the only persisted state the
//! pipeline consults: a present directory means a finished run and
//! short-circuits everything else.

use std::path::{Path, PathBuf};
use std::time::Instant;

use aibou_core::config::TrainingConfig;
use aibou_core::dataset::{self, TrainingExample};
use aibou_core::encoder::{EncodedExample, Encoder};
use aibou_core::error::Result;
use candle_core::Device;

use crate::device::{auto_device, device_name, select_dtype};
use crate::model::Seq2SeqModel;
use crate::status::{StatusEvent, StatusSink};
use crate::trainer::{FineTuner, TrainReport};

/// How a run ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The artifact directory already existed; nothing ran.
    AlreadyTrained,
    /// Training ran to completion and the artifacts were saved.
    Trained {
        elapsed_secs: f64,
        report: TrainReport,
    },
}

/// Owns the expensive half of a run: model and tokenizer loading plus
/// dataset encoding. Returns a [`PreparedRun`] that trains and saves.
pub trait TrainBackend {
    /// Short label for status messages, e.g. "candle on cuda".
    fn describe(&self) -> String;

    /// Load the model/tokenizer pair and encode the dataset.
    fn prepare(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
        model_dir: &Path,
    ) -> Result<Box<dyn PreparedRun>>;
}

/// A prepared run, ready to train and persist its artifacts.
pub trait PreparedRun {
    fn train_and_save(
        &mut self,
        config: &TrainingConfig,
        output_dir: &Path,
        sink: &dyn StatusSink,
    ) -> Result<TrainReport>;
}

/// Drives one training run from gate to artifact save.
pub struct Orchestrator {
    data_file: PathBuf,
    model_dir: PathBuf,
    output_dir: PathBuf,
    config: TrainingConfig,
}

impl Orchestrator {
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
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Drive a run to completion, streaming status through `sink`.
    ///
    /// If the output directory already exists, exactly one "already
    /// trained" message is emitted and nothing else runs. Errors from
    /// any later step propagate to the caller; the stream simply stops
    /// without a terminal message.
    pub fn run(&self, backend: &dyn TrainBackend, sink: &dyn StatusSink) -> Result<Outcome> {
        if self.output_dir.exists() {
            sink.emit(StatusEvent::Message(format!(
                "model is already trained, artifacts in {}",
                self.output_dir.display()
            )));
            return Ok(Outcome::AlreadyTrained);
        }

        self.config.validate()?;
        let started = Instant::now();

        sink.emit(StatusEvent::Message("initializing training run".into()));
        sink.emit(StatusEvent::Message(format!(
            "using model {} ({})",
            self.model_dir.display(),
            backend.describe()
        )));

        sink.emit(StatusEvent::Message(format!(
            "loading dataset from {}",
            self.data_file.display()
        )));
        let examples = dataset::load_jsonl(&self.data_file)?;
        dataset::validate_examples(&examples)?;
        sink.emit(StatusEvent::Message(format!(
            "loaded {} training examples",
            examples.len()
        )));

        sink.emit(StatusEvent::Message("tokenizing data".into()));
        let mut prepared = backend.prepare(&examples, &self.config, &self.model_dir)?;

        sink.emit(StatusEvent::Message("starting training".into()));
        let report = prepared.train_and_save(&self.config, &self.output_dir, sink)?;

        let elapsed_secs = started.elapsed().as_secs_f64();
        sink.emit(StatusEvent::Message(format!(
            "training complete in {elapsed_secs:.2}s"
        )));
        sink.emit(StatusEvent::Message(format!(
            "model saved to {}",
            self.output_dir.display()
        )));

        Ok(Outcome::Trained {
            elapsed_secs,
            report,
        })
    }
}

/// The production backend: candle model, HF tokenizer, safetensors
/// artifacts.
pub struct CandleBackend {
    device: Device,
}

impl CandleBackend {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Detect the device once: CUDA when present, CPU otherwise.
    pub fn auto() -> Result<Self> {
        Ok(Self::new(auto_device()?))
    }
}

impl TrainBackend for CandleBackend {
    fn describe(&self) -> String {
        format!("candle on {}", device_name(&self.device))
    }

    fn prepare(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
        model_dir: &Path,
    ) -> Result<Box<dyn PreparedRun>> {
        let encoder = Encoder::from_file(model_dir.join("tokenizer.json"), config)?;
        let encoded = encoder.encode_all(examples)?;

        let dtype = select_dtype(&self.device, config.mixed_precision);
        let model = Seq2SeqModel::load(model_dir, &self.device, dtype)?;

        Ok(Box::new(CandleRun {
            device: self.device.clone(),
            encoded,
            pad_id: encoder.pad_id(),
            model,
            tokenizer_src: model_dir.join("tokenizer.json"),
            config_src: model_dir.join("config.json"),
        }))
    }
}

struct CandleRun {
    device: Device,
    encoded: Vec<EncodedExample>,
    pad_id: u32,
    model: Seq2SeqModel,
    tokenizer_src: PathBuf,
    config_src: PathBuf,
}

impl PreparedRun for CandleRun {
    fn train_and_save(
        &mut self,
        config: &TrainingConfig,
        output_dir: &Path,
        sink: &dyn StatusSink,
    ) -> Result<TrainReport> {
        let tuner = FineTuner::new(config, &self.device);
        let report = tuner.run(&mut self.model, &self.encoded, self.pad_id, sink)?;

        // The artifact directory appears only after training finished,
        // so a partial run never satisfies the idempotency gate.
        std::fs::create_dir_all(output_dir)?;
        self.model.save(output_dir)?;
        std::fs::copy(&self.tokenizer_src, output_dir.join("tokenizer.json"))?;
        std::fs::copy(&self.config_src, output_dir.join("config.json"))?;

        Ok(report)
    }
}
