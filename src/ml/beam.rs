// ============================================================
// Layer 5 - Beam Search Decoder
// ============================================================
// Deterministic decoding shared by any seq2seq model. The
// model is reached through `StepScorer`, which returns the
// next-token log-probabilities for a batch of prefixes; the
// Burn generator implements it, tests implement it with a
// lookup table.
//
// Each step:
//   1. score every live beam
//   2. expand each beam with its top 2*width tokens
//   3. walk expansions best-first: an EOS expansion inside the
//      top `width` ranks becomes a finished hypothesis, other
//      expansions fill the next set of live beams
//
// Early stopping: decoding ends as soon as `width` hypotheses
// have finished, or after `max_len` tokens. Final scores are
// length-normalised: sum_logp / len^length_penalty.

use anyhow::{ensure, Result};

/// Anything that can score the next token for a batch of prefixes.
/// All prefixes in one call have the same length.
pub trait StepScorer {
    fn next_log_probs(&self, prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone)]
pub struct BeamConfig {
    pub beam_width:     usize,
    pub max_len:        usize,
    pub length_penalty: f32,
    pub start_token:    u32,
    pub eos_token:      u32,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            beam_width:     4,
            max_len:        50,
            length_penalty: 1.0,
            start_token:    0,
            eos_token:      1,
        }
    }
}

/// A decoded sequence without the start and EOS tokens
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub tokens: Vec<u32>,
    pub score:  f32,
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    logp:   f32,
}

pub fn beam_search<S: StepScorer + ?Sized>(scorer: &S, cfg: &BeamConfig) -> Result<Hypothesis> {
    ensure!(cfg.beam_width > 0, "beam width must be at least 1");
    ensure!(cfg.max_len > 0, "max decode length must be at least 1");

    let width = cfg.beam_width;
    let mut live: Vec<Beam> = vec![Beam { tokens: vec![cfg.start_token], logp: 0.0 }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    for _step in 0..cfg.max_len {
        let prefixes: Vec<Vec<u32>> = live.iter().map(|b| b.tokens.clone()).collect();
        let rows = scorer.next_log_probs(&prefixes)?;
        ensure!(
            rows.len() == live.len(),
            "scorer returned {} rows for {} beams", rows.len(), live.len()
        );

        // (cumulative logp, beam index, token)
        let mut expansions: Vec<(f32, usize, u32)> = Vec::new();
        for (b, row) in rows.iter().enumerate() {
            for token in top_k(row, 2 * width) {
                expansions.push((live[b].logp + row[token], b, token as u32));
            }
        }
        expansions.sort_by(|x, y| y.0.total_cmp(&x.0));

        let mut next: Vec<Beam> = Vec::with_capacity(width);
        for (rank, &(logp, b, token)) in expansions.iter().enumerate() {
            if token == cfg.eos_token {
                if rank < width {
                    let generated = live[b].tokens[1..].to_vec();
                    let len       = generated.len() + 1;
                    finished.push(Hypothesis {
                        tokens: generated,
                        score:  normalise(logp, len, cfg.length_penalty),
                    });
                }
            } else {
                let mut tokens = live[b].tokens.clone();
                tokens.push(token);
                next.push(Beam { tokens, logp });
            }
            if next.len() == width {
                break;
            }
        }

        if finished.len() >= width || next.is_empty() {
            live.clear();
            break;
        }
        live = next;
    }

    // Ran out of length: unfinished beams compete with finished ones
    for beam in live {
        let generated = beam.tokens[1..].to_vec();
        let len       = generated.len();
        finished.push(Hypothesis {
            tokens: generated,
            score:  normalise(beam.logp, len, cfg.length_penalty),
        });
    }

    finished
        .into_iter()
        .reduce(|best, h| if h.score > best.score { h } else { best })
        .ok_or_else(|| anyhow::anyhow!("beam search produced no hypotheses"))
}

fn normalise(logp: f32, len: usize, length_penalty: f32) -> f32 {
    logp / (len.max(1) as f32).powf(length_penalty)
}

/// Indices of the k largest values, best first; ties keep index order
fn top_k(row: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..row.len()).collect();
    idx.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
    idx.truncate(k);
    idx
}
