// ============================================================
// Layer 5 - Seq2Seq Question Generation Model
// ============================================================
// Encoder-decoder transformer that reads
//   "<answer> {answer} <context> {context}"
// and writes a question, one token at a time.
//
//   input_ids ──► token + position embedding
//                   │
//                   ▼
//             EncoderBlock x N     (self-attention, pad-masked)
//                   │ memory
//                   ▼
//   decoder_ids ─► DecoderBlock x M (causal self-attention,
//                                    cross-attention to memory)
//                   │
//                   ▼
//               lm_head ─► log-probs over the vocabulary
//
// Encoder and decoder share the token and position embedding
// tables, as T5-style checkpoints do. Only inference lives
// here; weights come from a checkpoint directory.

use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:         usize,
    pub max_seq_len:        usize,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    #[config(default = 0.1)]
    pub dropout:            f64,
    #[config(default = 0)]
    pub pad_token_id:       u32,
    #[config(default = 1)]
    pub eos_token_id:       u32,
    #[config(default = 0)]
    pub decoder_start_token_id: u32,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);

        let encoder_layers = (0..self.num_encoder_layers)
            .map(|_| build_encoder_block(self.d_model, self.num_heads, self.d_ff, self.dropout, device))
            .collect();
        let decoder_layers = (0..self.num_decoder_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();

        Seq2SeqModel {
            token_embedding,
            position_embedding,
            encoder_layers,
            decoder_layers,
            encoder_norm: LayerNormConfig::new(self.d_model).init(device),
            decoder_norm: LayerNormConfig::new(self.d_model).init(device),
            lm_head:      LinearConfig::new(self.d_model, self.vocab_size).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            max_seq_len:  self.max_seq_len,
            pad_token_id: self.pad_token_id,
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let attention = || {
            MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init::<B>(device)
        };
        DecoderBlock {
            self_attn:   attention(),
            cross_attn:  attention(),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            norm3:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Post-norm encoder block, also used by the QA evaluation classifier
pub fn build_encoder_block<B: Backend>(
    d_model:   usize,
    num_heads: usize,
    d_ff:      usize,
    dropout:   f64,
    device:    &B::Device,
) -> EncoderBlock<B> {
    EncoderBlock {
        self_attn: MultiHeadAttentionConfig::new(d_model, num_heads)
            .with_dropout(dropout)
            .init(device),
        ffn_linear1: LinearConfig::new(d_model, d_ff).init(device),
        ffn_linear2: LinearConfig::new(d_ff, d_model).init(device),
        norm1:       LayerNormConfig::new(d_model).init(device),
        norm2:       LayerNormConfig::new(d_model).init(device),
        dropout:     DropoutConfig::new(dropout).init(),
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, seq, d_model], pad_mask: [batch, seq] (true = padding)
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));
        let ffn = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(
        &self,
        x:           Tensor<B, 3>,
        memory:      Tensor<B, 3>,
        memory_mask: Tensor<B, 2, Bool>,
        causal_mask: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let attn = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(causal_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));

        let cross = self.cross_attn
            .forward(MhaInput::new(x.clone(), memory.clone(), memory).mask_pad(memory_mask))
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross));

        let ffn = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn))
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub encoder_layers:     Vec<EncoderBlock<B>>,
    pub decoder_layers:     Vec<DecoderBlock<B>>,
    pub encoder_norm:       LayerNorm<B>,
    pub decoder_norm:       LayerNorm<B>,
    pub lm_head:            Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
    pub pad_token_id:       u32,
}

/// Encoder states for one input, reused across decoding steps
#[derive(Debug, Clone)]
pub struct EncoderOutput<B: Backend> {
    /// [batch, src_len, d_model]
    pub memory:   Tensor<B, 3>,
    /// [batch, src_len], true where the input is padding
    pub pad_mask: Tensor<B, 2, Bool>,
}

impl<B: Backend> EncoderOutput<B> {
    /// Repeat a single-input encoding once per beam
    pub fn repeat(&self, times: usize) -> Self {
        Self {
            memory:   Tensor::cat(vec![self.memory.clone(); times], 0),
            pad_mask: Tensor::cat(vec![self.pad_mask.clone(); times], 0),
        }
    }
}

impl<B: Backend> Seq2SeqModel<B> {
    fn embed(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = self.token_embedding.forward(ids);

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        self.dropout.forward(tok_emb + pos_emb)
    }

    /// input_ids: [batch, src_len]
    pub fn encode(&self, input_ids: Tensor<B, 2, Int>) -> EncoderOutput<B> {
        let pad_mask = input_ids.clone().equal_elem(self.pad_token_id as i32);

        let mut x = self.embed(input_ids);
        for layer in &self.encoder_layers {
            x = layer.forward(x, pad_mask.clone());
        }

        EncoderOutput { memory: self.encoder_norm.forward(x), pad_mask }
    }

    /// Log-probabilities of the next token after each decoder prefix.
    /// decoder_ids: [batch, tgt_len] → [batch, vocab]
    pub fn next_token_log_probs(
        &self,
        decoder_ids: Tensor<B, 2, Int>,
        encoded:     &EncoderOutput<B>,
    ) -> Tensor<B, 2> {
        let [batch_size, tgt_len] = decoder_ids.dims();

        let mut x = self.embed(decoder_ids);
        let causal = generate_autoregressive_mask::<B>(batch_size, tgt_len, &x.device());
        for layer in &self.decoder_layers {
            x = layer.forward(x, encoded.memory.clone(), encoded.pad_mask.clone(), causal.clone());
        }
        let x = self.decoder_norm.forward(x);

        let [_, _, d_model] = x.dims();
        let last = x
            .slice([0..batch_size, tgt_len - 1..tgt_len, 0..d_model])
            .reshape([batch_size, d_model]);

        burn::tensor::activation::log_softmax(self.lm_head.forward(last), 1)
    }
}
