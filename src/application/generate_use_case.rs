// ============================================================
// Layer 2 - GenerateUseCase
// ============================================================
// The batch caller: file in, question/answer records out.
//
//   Step 1: Resolve and load both checkpoints   (Layer 6 + 5)
//   Step 2: Load the source file(s)             (Layer 4 - data)
//   Step 3: Clean each document's text          (Layer 4 - data)
//   Step 4: Run the question pipeline per doc   (Layer 2)
//   Step 5: Append run metrics to CSV, if asked (Layer 6 - infra)
//
// Models are loaded once in `load` and reused for every
// document. A missing or incompatible checkpoint stops the run
// here, before any text is read.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};

use crate::application::config::PipelineConfig;
use crate::application::pipeline::QuestionPipeline;
use crate::data::{FileLoader, Preprocessor};
use crate::domain::{DocumentSource, PipelineError, QaRecord, QaScorer, TextToText};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{evaluator::BurnQaEvaluator, generator::BurnQuestionGenerator};

/// Where the two checkpoints live
#[derive(Debug, Clone)]
pub struct ModelLocations {
    /// Path or registry name of the question-generation model
    pub qg_model:      String,
    /// Path or registry name of the QA evaluation model
    pub qa_eval_model: String,
    pub model_home:    PathBuf,
}

/// One batch run over a file or directory
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub input:         PathBuf,
    pub num_questions: usize,
    pub answer_style:  String,
    pub use_evaluator: bool,
    pub metrics_csv:   Option<PathBuf>,
}

/// Records generated for one source document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentQuestions {
    pub source:  String,
    pub records: Vec<QaRecord>,
}

pub struct GenerateUseCase {
    pipeline:     QuestionPipeline,
    preprocessor: Preprocessor,
}

impl GenerateUseCase {
    /// Load the generator (and the evaluator when `with_evaluator`).
    pub fn load(
        config:         PipelineConfig,
        models:         &ModelLocations,
        with_evaluator: bool,
    ) -> Result<Self> {
        config.validate()?;

        let qg_ckpt = CheckpointManager::resolve(&models.qg_model, &models.model_home);
        tracing::info!("Loading question generator from '{}'", qg_ckpt.dir().display());
        let generator = BurnQuestionGenerator::from_checkpoint(&qg_ckpt, &config.decode_settings())
            .map_err(|e| PipelineError::ModelLoad(format!("{e:#}")))?;
        let generator: Arc<dyn TextToText> = Arc::new(generator);

        let evaluator: Option<Arc<dyn QaScorer>> = if with_evaluator {
            let eval_ckpt = CheckpointManager::resolve(&models.qa_eval_model, &models.model_home);
            tracing::info!("Loading QA evaluator from '{}'", eval_ckpt.dir().display());
            let evaluator = BurnQaEvaluator::from_checkpoint(&eval_ckpt, config.max_eval_tokens, config.workers)
                .map_err(|e| PipelineError::ModelLoad(format!("{e:#}")))?;
            Some(Arc::new(evaluator) as Arc<dyn QaScorer>)
        } else {
            None
        };

        Ok(Self::from_pipeline(QuestionPipeline::new(config, generator, evaluator)?))
    }

    pub fn from_pipeline(pipeline: QuestionPipeline) -> Self {
        Self { pipeline, preprocessor: Preprocessor::default() }
    }

    pub fn execute(&self, request: &GenerateRequest) -> Result<Vec<DocumentQuestions>> {
        let docs = FileLoader::new(&request.input).load_all()?;
        if docs.is_empty() {
            tracing::warn!("No supported documents found in '{}'", request.input.display());
            return Ok(Vec::new());
        }

        let metrics = request
            .metrics_csv
            .as_ref()
            .map(MetricsLogger::new)
            .transpose()?;
        if let Some(logger) = &metrics {
            tracing::debug!("Appending run metrics to '{}'", logger.csv_path().display());
        }

        let mut results = Vec::with_capacity(docs.len());
        for doc in docs {
            let text = self.preprocessor.clean(&doc.text);
            tracing::info!("Generating questions for '{}' ({} words)", doc.source, doc.word_count());

            let run = self
                .pipeline
                .run(&text, request.num_questions, &request.answer_style, request.use_evaluator)
                .with_context(|| format!("Question generation failed for '{}'", doc.source))?;

            if let Some(logger) = &metrics {
                logger.log(&run.metrics)?;
            }

            results.push(DocumentQuestions {
                source:  doc.source,
                records: run.result.into_records(),
            });
        }
        Ok(results)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnswerCandidate;
    use std::fs;

    struct EchoGenerator;

    impl TextToText for EchoGenerator {
        fn generate_question(&self, candidate: &AnswerCandidate) -> std::result::Result<String, PipelineError> {
            Ok(format!("Which sentence says: {}?", candidate.answer_span))
        }
    }

    fn use_case() -> GenerateUseCase {
        let pipeline = QuestionPipeline::new(PipelineConfig::default(), Arc::new(EchoGenerator), None).unwrap();
        GenerateUseCase::from_pipeline(pipeline)
    }

    #[test]
    fn test_execute_on_text_file_writes_metrics() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, "Paris is the capital of France.\r\nIt is known for the Eiffel Tower.\r\n").unwrap();
        let csv = dir.path().join("metrics.csv");

        let request = GenerateRequest {
            input,
            num_questions: 5,
            answer_style:  "sentences".into(),
            use_evaluator: false,
            metrics_csv:   Some(csv.clone()),
        };
        let results = use_case().execute(&request).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "notes.txt");
        assert_eq!(results[0].records.len(), 2);
        assert_eq!(results[0].records[1].answer, "It is known for the Eiffel Tower.");

        let rows = fs::read_to_string(&csv).unwrap();
        assert_eq!(rows.lines().count(), 2);
        assert!(rows.lines().nth(1).unwrap().starts_with("2,2,0,2,"));
    }

    #[test]
    fn test_execute_on_directory_is_per_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Rust was released in 2015.").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("ignored.pdf"), "binary").unwrap();

        let request = GenerateRequest {
            input:         dir.path().to_path_buf(),
            num_questions: 3,
            answer_style:  "all".into(),
            use_evaluator: false,
            metrics_csv:   None,
        };
        let results = use_case().execute(&request).unwrap();

        let sources: Vec<&str> = results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a.txt", "b.txt"]);
        assert!(!results[0].records.is_empty());
        assert!(results[1].records.is_empty());
    }

    #[test]
    fn test_missing_model_is_a_load_error() {
        let home = tempfile::tempdir().unwrap();
        let models = ModelLocations {
            qg_model:      "qg".into(),
            qa_eval_model: "qa-eval".into(),
            model_home:    home.path().to_path_buf(),
        };
        let err = GenerateUseCase::load(PipelineConfig::default(), &models, false)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ModelLoad(_))
        ));
    }
}
