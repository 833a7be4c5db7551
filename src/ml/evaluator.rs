// ============================================================
// Layer 5 - QA Evaluator
// ============================================================
// Burn-backed `QaScorer`. Builds
//
//   [CLS] question [SEP] answer [SEP] context [SEP]
//
// trimmed to `max_tokens` (context shortened first, then the
// answer, then the question), runs the classifier and returns
// softmax(logits)[1], the probability that the question and
// answer belong together.

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::domain::{PipelineError, QaScorer};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::tokenizer_store::{TextCodec, TokenizerStore};
use crate::ml::classifier::{QaEvalConfig, QaEvalModel};
use crate::ml::replicas::ModelReplicas;
use crate::ml::InferBackend;

/// Four separator/classifier tokens wrap the three segments
const SPECIAL_TOKENS: usize = 4;

/// Token ids and segment ids ready for the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct EvalInput {
    pub ids:      Vec<u32>,
    pub segments: Vec<u32>,
}

pub struct BurnQaEvaluator {
    models:     ModelReplicas<QaEvalModel<InferBackend>>,
    codec:      TextCodec,
    device:     burn::backend::wgpu::WgpuDevice,
    cls_id:     u32,
    sep_id:     u32,
    max_tokens: usize,
}

impl BurnQaEvaluator {
    pub fn from_checkpoint(ckpt: &CheckpointManager, max_tokens: usize, replicas: usize) -> Result<Self> {
        ckpt.verify()?;
        let device = burn::backend::wgpu::WgpuDevice::default();

        let cfg: QaEvalConfig = ckpt.load_config()?;
        let cfg = cfg.with_dropout(0.0);
        ensure!(cfg.num_labels >= 2, "evaluator needs at least 2 labels, got {}", cfg.num_labels);

        let model = ckpt.load_model::<InferBackend, _>(cfg.init::<InferBackend>(&device), &device)?;
        let codec = TokenizerStore::new(ckpt.tokenizer_path()).load()?;

        // BERT vocabularies use [CLS]/[SEP], RoBERTa ones <s>/</s>
        let cls_id = codec.first_token_id(&["[CLS]", "<s>"])?;
        let sep_id = codec.first_token_id(&["[SEP]", "</s>"])?;
        let max_tokens = max_tokens.min(cfg.max_seq_len);

        let models = ModelReplicas::new(model, replicas);

        tracing::info!("QA evaluator ready (max_tokens={}, replicas={})", max_tokens, models.count());

        Ok(Self { models, codec, device, cls_id, sep_id, max_tokens })
    }
}

impl QaScorer for BurnQaEvaluator {
    fn score(&self, question: &str, answer: &str, context: &str) -> std::result::Result<f32, PipelineError> {
        let q = self.codec.encode(question)?;
        let a = self.codec.encode(answer)?;
        let c = self.codec.encode(context)?;
        let input = assemble_eval_input(self.cls_id, self.sep_id, &q, &a, &c, self.max_tokens)?;

        let to_i32 = |v: &[u32]| v.iter().map(|&x| x as i32).collect::<Vec<i32>>();
        let ids = Tensor::<InferBackend, 1, Int>::from_ints(to_i32(input.ids.as_slice()).as_slice(), &self.device)
            .unsqueeze::<2>();
        let segments = Tensor::<InferBackend, 1, Int>::from_ints(to_i32(input.segments.as_slice()).as_slice(), &self.device)
            .unsqueeze::<2>();

        let logits = self.models.acquire().forward(ids, segments);

        let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read evaluator output: {e:?}"))?;

        match probs.get(1) {
            Some(&p) if p.is_finite() => Ok(p),
            other => Err(PipelineError::Inference(format!("evaluator produced {other:?}"))),
        }
    }
}

/// Lay out `[CLS] q [SEP] a [SEP] c [SEP]` within `max_tokens`.
///
/// Question tokens get segment 0, everything after the first
/// [SEP] gets segment 1.
pub fn assemble_eval_input(
    cls_id:     u32,
    sep_id:     u32,
    question:   &[u32],
    answer:     &[u32],
    context:    &[u32],
    max_tokens: usize,
) -> Result<EvalInput> {
    ensure!(
        max_tokens > SPECIAL_TOKENS,
        "max_tokens must exceed {SPECIAL_TOKENS}, got {max_tokens}"
    );
    let room = max_tokens - SPECIAL_TOKENS;

    let q_len = question.len().min(room);
    let a_len = answer.len().min(room - q_len);
    let c_len = context.len().min(room - q_len - a_len);

    let mut ids = Vec::with_capacity(q_len + a_len + c_len + SPECIAL_TOKENS);
    ids.push(cls_id);
    ids.extend_from_slice(&question[..q_len]);
    ids.push(sep_id);
    let first_segment = ids.len();
    ids.extend_from_slice(&answer[..a_len]);
    ids.push(sep_id);
    ids.extend_from_slice(&context[..c_len]);
    ids.push(sep_id);

    let segments = (0..ids.len())
        .map(|i| u32::from(i >= first_segment))
        .collect();

    Ok(EvalInput { ids, segments })
}
