// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the `generate` subcommand and all its flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, PathBuf, etc.)
//
// Pipeline settings start from the defaults (or --config file)
// and individual flags override single fields.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::application::generate_use_case::{GenerateRequest, ModelLocations};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate question/answer pairs from a .txt/.docx file or directory
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source file or directory of .txt/.md/.docx files
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Maximum number of questions per document (at least 1)
    #[arg(
        long,
        short = 'n',
        default_value_t = 10,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub num_questions: usize,

    /// One of: all, sentences, multiple_choice
    #[arg(long, default_value = "all")]
    pub answer_style: String,

    /// Skip the QA evaluation model (results keep extraction order)
    #[arg(long)]
    pub no_evaluator: bool,

    /// Question-generation model: directory or name under --model-home
    #[arg(long, default_value = "qg")]
    pub qg_model: String,

    /// QA evaluation model: directory or name under --model-home
    #[arg(long, default_value = "qa-eval")]
    pub qa_eval_model: String,

    /// Directory holding named models
    #[arg(long, env = "QG_MODEL_HOME", default_value = "models")]
    pub model_home: PathBuf,

    /// JSON file with pipeline settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Neighbouring sentences on each side of an answer
    #[arg(long)]
    pub context_sentences: Option<usize>,

    #[arg(long)]
    pub beam_width: Option<usize>,

    /// Inference threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for distractor sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print JSON instead of Q:/A: lines
    #[arg(long)]
    pub json: bool,

    /// Write results to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Append per-document run metrics to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<PathBuf>,
}

impl GenerateArgs {
    /// Apply flag overrides on top of a base configuration
    pub fn apply_overrides(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(n) = self.context_sentences {
            config.context_sentences = n;
        }
        if let Some(w) = self.beam_width {
            config.beam_width = w;
        }
        if let Some(w) = self.workers {
            config.workers = w;
        }
        if let Some(s) = self.seed {
            config.distractor_seed = s;
        }
        config
    }

    pub fn model_locations(&self) -> ModelLocations {
        ModelLocations {
            qg_model:      self.qg_model.clone(),
            qa_eval_model: self.qa_eval_model.clone(),
            model_home:    self.model_home.clone(),
        }
    }

    pub fn request(&self) -> GenerateRequest {
        GenerateRequest {
            input:         self.input.clone(),
            num_questions: self.num_questions,
            answer_style:  self.answer_style.clone(),
            use_evaluator: !self.no_evaluator,
            metrics_csv:   self.metrics_csv.clone(),
        }
    }
}
