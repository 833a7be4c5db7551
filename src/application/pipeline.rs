// ============================================================
// Layer 2 - Question Pipeline
// ============================================================
// The single entry point external callers use:
//
//   generate(text, num_questions, answer_style, use_evaluator)
//
// Flow of one call:
//
//   validate request ──► fail fast, before any inference
//        │
//        ▼
//   AnswerExtractor  (single thread)
//        │  Vec<AnswerCandidate>, extraction order
//        ▼
//   worker pool      (scoped threads, one contiguous chunk of
//        │            candidates each; results land in a
//        │            pre-sized slot per candidate)
//        │  generate question, then score it when enabled
//        ▼
//   Selector         (single thread) dedup, order, truncate,
//        │            attach distractors
//        ▼
//   Vec<QaRecord>
//
// A candidate whose generation or scoring fails is logged and
// dropped. Only when every candidate fails does the caller get
// an error.
//
// The models are injected as shared trait objects, loaded once
// by the caller and never mutated here.

use std::sync::Arc;
use std::time::Instant;

use crate::application::config::PipelineConfig;
use crate::data::AnswerExtractor;
use crate::domain::{
    AnswerCandidate, AnswerStyle, GeneratedQuestion, PipelineError, QaRecord, QaScorer,
    RankedResult, TextToText,
};
use crate::infra::metrics::RunMetrics;
use crate::ranking::Selector;

type Outcome = Result<GeneratedQuestion, PipelineError>;

/// The selected questions of one call plus its counters
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result:  RankedResult,
    pub metrics: RunMetrics,
}

pub struct QuestionPipeline {
    config:    PipelineConfig,
    extractor: AnswerExtractor,
    selector:  Selector,
    generator: Arc<dyn TextToText>,
    evaluator: Option<Arc<dyn QaScorer>>,
}

impl QuestionPipeline {
    pub fn new(
        config:    PipelineConfig,
        generator: Arc<dyn TextToText>,
        evaluator: Option<Arc<dyn QaScorer>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            extractor: AnswerExtractor::new(config.extractor_config()),
            selector:  Selector::new(config.distractor_sampler()),
            config,
            generator,
            evaluator,
        })
    }

    /// Generate up to `num_questions` question/answer records for `text`.
    ///
    /// `answer_style` is one of `"all"`, `"sentences"` or
    /// `"multiple_choice"`. Empty text yields an empty Vec.
    pub fn generate(
        &self,
        text:          &str,
        num_questions: usize,
        answer_style:  &str,
        use_evaluator: bool,
    ) -> Result<Vec<QaRecord>, PipelineError> {
        let run = self.run(text, num_questions, answer_style, use_evaluator)?;
        Ok(run.result.into_records())
    }

    /// Same as `generate`, keeping the ranked result and run metrics.
    pub fn run(
        &self,
        text:          &str,
        num_questions: usize,
        answer_style:  &str,
        use_evaluator: bool,
    ) -> Result<PipelineRun, PipelineError> {
        let started = Instant::now();
        let style   = self.validate_request(num_questions, answer_style, use_evaluator)?;

        let candidates = self.extractor.extract(text, style);
        tracing::info!("Extracted {} candidates (style={})", candidates.len(), style);

        if candidates.is_empty() {
            return Ok(PipelineRun {
                result:  RankedResult::default(),
                metrics: RunMetrics { elapsed_ms: started.elapsed().as_millis(), ..Default::default() },
            });
        }

        let scorer  = if use_evaluator { self.evaluator.as_deref() } else { None };
        let outcomes = self.infer_all(&candidates, scorer);

        let mut generated  = Vec::with_capacity(candidates.len());
        let mut failed     = 0usize;
        let mut last_error = String::new();
        for (position, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok(question)) => generated.push(question),
                Some(Err(err)) if !err.is_candidate_local() => return Err(err),
                Some(Err(err)) => {
                    tracing::warn!("Dropping candidate {}: {}", position, err);
                    failed += 1;
                    last_error = err.to_string();
                }
                None => {
                    tracing::warn!("Dropping candidate {}: worker did not finish", position);
                    failed += 1;
                    last_error = format!("worker for candidate {position} did not finish");
                }
            }
        }

        if generated.is_empty() {
            return Err(PipelineError::AllCandidatesFailed {
                attempted: candidates.len(),
                last_error,
            });
        }

        let generated_count = generated.len();
        let result = self.selector.select_with_pool(generated, num_questions, style, &candidates);

        if result.len() < num_questions {
            tracing::warn!(
                "Only {} of {} requested questions could be generated",
                result.len(),
                num_questions
            );
        }

        let metrics = RunMetrics {
            candidates: candidates.len(),
            generated:  generated_count,
            failed,
            returned:   result.len(),
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "Returned {} questions ({} generated, {} failed, {:.0}% success) in {} ms",
            metrics.returned,
            metrics.generated,
            metrics.failed,
            metrics.success_rate() * 100.0,
            metrics.elapsed_ms
        );

        Ok(PipelineRun { result, metrics })
    }

    fn validate_request(
        &self,
        num_questions: usize,
        answer_style:  &str,
        use_evaluator: bool,
    ) -> Result<AnswerStyle, PipelineError> {
        if num_questions == 0 {
            return Err(PipelineError::Configuration(
                "num_questions must be at least 1".into(),
            ));
        }
        let style: AnswerStyle = answer_style.parse()?;
        if use_evaluator && self.evaluator.is_none() {
            return Err(PipelineError::Configuration(
                "use_evaluator is set but no QA evaluation model is loaded".into(),
            ));
        }
        Ok(style)
    }

    /// Run generation (and scoring) for every candidate.
    /// Slot `i` holds the outcome for `candidates[i]`; a slot stays
    /// None only if its worker panicked.
    fn infer_all(
        &self,
        candidates: &[AnswerCandidate],
        scorer:     Option<&dyn QaScorer>,
    ) -> Vec<Option<Outcome>> {
        let mut slots: Vec<Option<Outcome>> = (0..candidates.len()).map(|_| None).collect();
        let workers    = self.config.workers.clamp(1, candidates.len().max(1));
        let chunk_size = candidates.len().div_ceil(workers).max(1);
        let generator  = self.generator.as_ref();

        tracing::debug!("Running inference on {} workers", workers);

        std::thread::scope(|scope| {
            let handles: Vec<_> = slots
                .chunks_mut(chunk_size)
                .zip(candidates.chunks(chunk_size))
                .enumerate()
                .map(|(chunk_idx, (slot_chunk, candidate_chunk))| {
                    scope.spawn(move || {
                        let first = chunk_idx * chunk_size;
                        for (offset, (slot, candidate)) in
                            slot_chunk.iter_mut().zip(candidate_chunk).enumerate()
                        {
                            *slot = Some(infer_one(generator, scorer, candidate, first + offset));
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    tracing::warn!("An inference worker panicked");
                }
            }
        });

        slots
    }
}

fn infer_one(
    generator: &dyn TextToText,
    scorer:    Option<&dyn QaScorer>,
    candidate: &AnswerCandidate,
    position:  usize,
) -> Outcome {
    let text     = generator.generate_question(candidate)?;
    let question = GeneratedQuestion::new(text, candidate.clone(), position);

    match scorer {
        Some(scorer) => {
            let score = scorer.score(&question.question_text, &candidate.answer_span, &candidate.context)?;
            Ok(question.with_score(score))
        }
        None => Ok(question),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PARIS: &str = "Paris is the capital of France. It is known for the Eiffel Tower.";

    /// Asks about the answer itself; fails on answers containing `fail_on`
    struct EchoGenerator {
        fail_on: Option<&'static str>,
        calls:   AtomicUsize,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self { fail_on: None, calls: AtomicUsize::new(0) }
        }

        fn failing_on(word: &'static str) -> Self {
            Self { fail_on: Some(word), calls: AtomicUsize::new(0) }
        }
    }

    impl TextToText for EchoGenerator {
        fn generate_question(&self, candidate: &AnswerCandidate) -> Result<String, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_on {
                Some(word) if candidate.answer_span.contains(word) => {
                    Err(PipelineError::Inference(format!("out of memory on '{word}'")))
                }
                _ => Ok(format!("What about {}?", candidate.answer_span)),
            }
        }
    }

    /// Same question for every candidate
    struct ConstantGenerator;

    impl TextToText for ConstantGenerator {
        fn generate_question(&self, _candidate: &AnswerCandidate) -> Result<String, PipelineError> {
            Ok("What is this text about?".into())
        }
    }

    /// Prefers answers mentioning the Eiffel Tower
    struct KeywordScorer;

    impl QaScorer for KeywordScorer {
        fn score(&self, _question: &str, answer: &str, _context: &str) -> Result<f32, PipelineError> {
            Ok(if answer.contains("Eiffel") { 0.9 } else { 0.2 })
        }
    }

    fn pipeline(generator: Arc<dyn TextToText>, evaluator: Option<Arc<dyn QaScorer>>) -> QuestionPipeline {
        QuestionPipeline::new(PipelineConfig::default(), generator, evaluator).unwrap()
    }

    #[test]
    fn test_sentences_scenario() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        let records = p.generate(PARIS, 2, "sentences", false).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].answer, "Paris is the capital of France.");
        assert_eq!(records[1].answer, "It is known for the Eiffel Tower.");
        for r in &records {
            assert!(r.question.contains(&r.answer));
            assert!(r.distractors.is_none());
        }
    }

    #[test]
    fn test_empty_text_gives_empty_result() {
        let generator = Arc::new(EchoGenerator::new());
        let p = pipeline(generator.clone(), Some(Arc::new(KeywordScorer)));

        for style in ["all", "sentences", "multiple_choice"] {
            assert!(p.generate("", 3, style, true).unwrap().is_empty());
            assert!(p.generate("", 3, style, false).unwrap().is_empty());
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fewer_candidates_than_requested() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        let records = p.generate(PARIS, 5, "sentences", false).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_without_evaluator_keeps_extraction_order() {
        let p   = pipeline(Arc::new(EchoGenerator::new()), Some(Arc::new(KeywordScorer)));
        let run = p.run(PARIS, 10, "all", false).unwrap();

        assert!(run.result.iter().all(|item| item.question.model_score.is_none()));
        let positions: Vec<usize> = run.result.iter().map(|item| item.question.position).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_evaluator_orders_by_score() {
        let p   = pipeline(Arc::new(EchoGenerator::new()), Some(Arc::new(KeywordScorer)));
        let run = p.run(PARIS, 2, "sentences", true).unwrap();

        let items: Vec<_> = run.result.iter().collect();
        assert_eq!(items[0].question.answer.answer_span, "It is known for the Eiffel Tower.");
        assert_eq!(items[0].question.model_score, Some(0.9));
        assert_eq!(items[1].question.model_score, Some(0.2));
    }

    #[test]
    fn test_result_never_exceeds_request() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        for n in 1..=6 {
            for style in ["all", "sentences", "multiple_choice"] {
                assert!(p.generate(PARIS, n, style, false).unwrap().len() <= n);
            }
        }
    }

    #[test]
    fn test_answers_come_from_text() {
        let text = "Mount Everest is 8849 metres tall. Climbers often use the South Col route, \
                    which was first climbed by Edmund Hillary and Tenzing Norgay in 1953 after \
                    several failed expeditions. Sherpas guide most expeditions.";
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        for style in ["all", "sentences", "multiple_choice"] {
            for record in p.generate(text, 50, style, false).unwrap() {
                assert!(text.contains(&record.answer), "'{}' not in text", record.answer);
            }
        }
    }

    #[test]
    fn test_unicode_spaces_in_raw_text() {
        let text = "Paris is the\u{00A0}capital. It is big.\u{3000}Lyon\u{3000}is. Rivers flow.";
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        for style in ["all", "sentences", "multiple_choice"] {
            let records = p.generate(text, 10, style, false).unwrap();
            assert!(!records.is_empty());
            for record in records {
                assert!(text.contains(&record.answer), "'{}' not in text", record.answer);
            }
        }
    }

    #[test]
    fn test_multiple_choice_fragment() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        let records = p.generate("photosynthesis in green plants", 3, "multiple_choice", false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "photosynthesis in green plants");
    }

    #[test]
    fn test_multiple_choice_distractors() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        let records = p.generate(PARIS, 10, "multiple_choice", false).unwrap();

        // Paris, capital, France, Eiffel Tower
        assert_eq!(records.len(), 4);
        for r in &records {
            let options = r.distractors.as_ref().unwrap();
            assert_eq!(options.len(), 3);

            let mut seen = HashSet::new();
            seen.insert(r.answer.to_lowercase());
            for option in options {
                assert!(seen.insert(option.to_lowercase()), "duplicate option '{option}'");
            }
        }
    }

    #[test]
    fn test_all_style_gives_distractors_only_to_spans() {
        let p = pipeline(Arc::new(EchoGenerator::new()), None);
        let records = p.generate(PARIS, 10, "all", false).unwrap();

        for r in &records {
            let is_sentence = r.answer.ends_with('.');
            assert_eq!(r.distractors.is_none(), is_sentence, "record {r:?}");
        }
    }

    #[test]
    fn test_failed_candidates_are_dropped() {
        let p   = pipeline(Arc::new(EchoGenerator::failing_on("Paris")), None);
        let run = p.run(PARIS, 5, "sentences", false).unwrap();

        assert_eq!(run.result.len(), 1);
        assert_eq!(run.metrics.candidates, 2);
        assert_eq!(run.metrics.generated, 1);
        assert_eq!(run.metrics.failed, 1);
        assert_eq!(run.metrics.returned, 1);
    }

    #[test]
    fn test_all_candidates_failing_is_an_error() {
        let p   = pipeline(Arc::new(EchoGenerator::failing_on("is")), None);
        let err = p.generate(PARIS, 5, "sentences", false).unwrap_err();

        match err {
            PipelineError::AllCandidatesFailed { attempted, last_error } => {
                assert_eq!(attempted, 2);
                assert!(last_error.contains("out of memory"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_questions_keep_first() {
        let p = pipeline(Arc::new(ConstantGenerator), None);
        let records = p.generate(PARIS, 5, "sentences", false).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "Paris is the capital of France.");
    }

    #[test]
    fn test_invalid_requests_fail_before_inference() {
        let generator = Arc::new(EchoGenerator::new());
        let p = pipeline(generator.clone(), None);

        let zero = p.generate(PARIS, 0, "sentences", false).unwrap_err();
        assert!(matches!(zero, PipelineError::Configuration(_)));

        let style = p.generate(PARIS, 2, "essay", false).unwrap_err();
        assert!(matches!(style, PipelineError::Configuration(ref m) if m.contains("essay")));

        let no_eval = p.generate(PARIS, 2, "sentences", true).unwrap_err();
        assert!(matches!(no_eval, PipelineError::Configuration(_)));

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = PipelineConfig { workers: 0, ..Default::default() };
        let result = QuestionPipeline::new(cfg, Arc::new(ConstantGenerator), None);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let text = "Rust was first released in 2015. Graydon Hoare started it at Mozilla. \
                    Cargo builds Rust projects. The borrow checker enforces memory safety. \
                    Ferris is the unofficial mascot.";
        let run_with = |workers: usize| {
            let cfg = PipelineConfig { workers, ..Default::default() };
            QuestionPipeline::new(cfg, Arc::new(EchoGenerator::new()), None)
                .unwrap()
                .generate(text, 20, "all", false)
                .unwrap()
        };
        let single = run_with(1);
        assert!(!single.is_empty());
        assert_eq!(single, run_with(3));
        assert_eq!(single, run_with(8));
    }
}
