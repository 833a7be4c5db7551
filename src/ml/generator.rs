// ============================================================
// Layer 5 - Question Generator
// ============================================================
// Burn-backed `TextToText`: loads a seq2seq checkpoint once and
// turns each AnswerCandidate into a question.
//
// Input layout (token ids):
//
//   <answer> {answer} <context> {context window} </s>
//   └──────── prefix ────────┘
//
// When the whole context does not fit in `max_input_tokens`,
// the window is cut from the end, sliding forward only as far
// as needed to keep the answer's sentence whole. If even the
// sentence is too long, only the answer is kept; an answer
// that cannot fit at all is a Truncation error for that
// candidate.
//
// Decoding is beam search (see beam.rs) starting from the
// decoder start token. The checkpoint is loaded once and
// cloned into one replica per worker (see replicas.rs).

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;
use std::ops::Range;

use crate::domain::{AnswerCandidate, PipelineError, TextToText};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::tokenizer_store::{TextCodec, TokenizerStore};
use crate::ml::beam::{beam_search, BeamConfig, StepScorer};
use crate::ml::model::{EncoderOutput, Seq2SeqConfig, Seq2SeqModel};
use crate::ml::replicas::ModelReplicas;
use crate::ml::InferBackend;

pub const ANSWER_MARKER:  &str = "<answer>";
pub const CONTEXT_MARKER: &str = "<context>";

/// Decoding limits taken from the pipeline configuration
#[derive(Debug, Clone)]
pub struct DecodeSettings {
    pub beam_width:          usize,
    pub max_question_tokens: usize,
    pub max_input_tokens:    usize,
    pub length_penalty:      f32,
    /// Model clones, one per concurrent caller
    pub replicas:            usize,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            beam_width:          4,
            max_question_tokens: 50,
            max_input_tokens:    512,
            length_penalty:      1.0,
            replicas:            1,
        }
    }
}

pub struct BurnQuestionGenerator {
    models:           ModelReplicas<Seq2SeqModel<InferBackend>>,
    codec:            TextCodec,
    device:           burn::backend::wgpu::WgpuDevice,
    beam:             BeamConfig,
    max_input_tokens: usize,
}

impl BurnQuestionGenerator {
    pub fn from_checkpoint(ckpt: &CheckpointManager, settings: &DecodeSettings) -> Result<Self> {
        ckpt.verify()?;
        let device = burn::backend::wgpu::WgpuDevice::default();

        let cfg: Seq2SeqConfig = ckpt.load_config()?;
        let cfg = cfg.with_dropout(0.0);
        ensure!(cfg.max_seq_len > 1, "max_seq_len must be at least 2, got {}", cfg.max_seq_len);

        let model = ckpt.load_model::<InferBackend, _>(cfg.init::<InferBackend>(&device), &device)?;
        let codec = TokenizerStore::new(ckpt.tokenizer_path()).load()?;

        // Decoder positions include the start token
        let max_len = settings.max_question_tokens.min(cfg.max_seq_len - 1).max(1);
        let beam = BeamConfig {
            beam_width:     settings.beam_width,
            max_len,
            length_penalty: settings.length_penalty,
            start_token:    cfg.decoder_start_token_id,
            eos_token:      cfg.eos_token_id,
        };
        let max_input_tokens = settings.max_input_tokens.min(cfg.max_seq_len);
        let models = ModelReplicas::new(model, settings.replicas);

        tracing::info!(
            "Question generator ready (beam_width={}, max_len={}, max_input_tokens={}, replicas={})",
            beam.beam_width,
            beam.max_len,
            max_input_tokens,
            models.count()
        );

        Ok(Self { models, codec, device, beam, max_input_tokens })
    }

    fn build_input(&self, candidate: &AnswerCandidate) -> std::result::Result<Vec<u32>, PipelineError> {
        let prefix     = format!("{ANSWER_MARKER} {} {CONTEXT_MARKER}", candidate.answer_span);
        let prefix_ids = self.codec.encode(&prefix)?;
        let (context_ids, offsets) = self.codec.encode_with_offsets(&candidate.context)?;

        let answer_tokens = answer_token_range(&offsets, candidate.answer_range_in_context())
            .ok_or_else(|| PipelineError::Inference(format!(
                "answer '{}' maps to no context tokens", candidate.answer_span
            )))?;
        let sentence_tokens = answer_token_range(&offsets, candidate.sentence_range_in_context())
            .map(|s| s.start.min(answer_tokens.start)..s.end.max(answer_tokens.end))
            .unwrap_or_else(|| answer_tokens.clone());

        let budget = self.max_input_tokens
            .checked_sub(prefix_ids.len() + 1)
            .ok_or_else(|| PipelineError::Truncation(format!(
                "answer prefix needs {} tokens, limit is {}",
                prefix_ids.len() + 1,
                self.max_input_tokens
            )))?;
        let window = fit_context_window(context_ids.len(), answer_tokens, sentence_tokens, budget)?;

        let mut ids = prefix_ids;
        ids.extend_from_slice(&context_ids[window]);
        ids.push(self.beam.eos_token);
        Ok(ids)
    }
}

impl TextToText for BurnQuestionGenerator {
    fn generate_question(&self, candidate: &AnswerCandidate) -> std::result::Result<String, PipelineError> {
        let ids = self.build_input(candidate)?;

        let model = self.models.acquire();

        let flat: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<InferBackend, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .unsqueeze::<2>();
        let encoded = model.encode(input);

        let step = DecodeStep { model: &model, encoded: &encoded, device: &self.device };
        let best = beam_search(&step, &self.beam)?;
        let question = self.codec.decode(&best.tokens)?;

        tracing::debug!("Beam score {:.4} question='{}'", best.score, question);

        if question.is_empty() {
            return Err(PipelineError::Inference(format!(
                "empty question for answer '{}'", candidate.answer_span
            )));
        }
        Ok(question)
    }
}

/// One decoder pass per beam-search step
struct DecodeStep<'a> {
    model:   &'a Seq2SeqModel<InferBackend>,
    encoded: &'a EncoderOutput<InferBackend>,
    device:  &'a burn::backend::wgpu::WgpuDevice,
}

impl StepScorer for DecodeStep<'_> {
    fn next_log_probs(&self, prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        let batch = prefixes.len();
        let len   = prefixes.first().map(Vec::len).unwrap_or(0);
        ensure!(batch > 0 && len > 0, "no prefixes to score");

        let flat: Vec<i32> = prefixes.iter().flatten().map(|&t| t as i32).collect();
        ensure!(flat.len() == batch * len, "prefixes differ in length");

        let ids = Tensor::<InferBackend, 1, Int>::from_ints(flat.as_slice(), self.device)
            .reshape([batch, len]);
        let encoded = if batch == 1 { self.encoded.clone() } else { self.encoded.repeat(batch) };

        let log_probs = self.model.next_token_log_probs(ids, &encoded);
        let [_, vocab] = log_probs.dims();
        let values = log_probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read log-probs: {e:?}"))?;

        Ok(values.chunks(vocab).map(<[f32]>::to_vec).collect())
    }
}

/// Token positions covering the byte range `answer`.
/// Tokens with empty offsets (specials) are ignored.
pub fn answer_token_range(offsets: &[(usize, usize)], answer: Range<usize>) -> Option<Range<usize>> {
    let mut hit = offsets
        .iter()
        .enumerate()
        .filter(|&(_, &(s, e))| e > s && s < answer.end && e > answer.start)
        .map(|(i, _)| i);

    let first = hit.next()?;
    let last  = hit.last().unwrap_or(first);
    Some(first..last + 1)
}

/// Pick `budget` context tokens that keep the whole answer.
///
/// The window starts at 0 and slides right only when the kept
/// range would otherwise be cut, so truncation happens at the end
/// first. The kept range is the answer's sentence when it fits in
/// `budget`, else the answer alone.
pub fn fit_context_window(
    context_len: usize,
    answer:      Range<usize>,
    sentence:    Range<usize>,
    budget:      usize,
) -> std::result::Result<Range<usize>, PipelineError> {
    if context_len <= budget {
        return Ok(0..context_len);
    }
    if answer.len() > budget {
        return Err(PipelineError::Truncation(format!(
            "answer needs {} tokens but only {} fit",
            answer.len(),
            budget
        )));
    }
    let covers_answer = sentence.start <= answer.start && sentence.end >= answer.end;
    let keep = if covers_answer && sentence.end <= context_len && sentence.len() <= budget {
        sentence
    } else {
        answer
    };
    let start = keep.end.saturating_sub(budget);
    Ok(start..start + budget)
}
