// ============================================================
// Layer 5 - QA Evaluation Classifier
// ============================================================
// BERT-style sequence classifier that judges whether a
// generated question fits its answer and context.
//
// Input:   [CLS] question [SEP] answer [SEP] context [SEP]
// Segment:   0     0...    0     1...    1     1...    1
//
// The [CLS] position (index 0) of the final layer feeds a
// linear head with `num_labels` outputs; label 1 means
// "question and answer match".

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::model::{build_encoder_block, EncoderBlock};

#[derive(Config, Debug)]
pub struct QaEvalConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
    #[config(default = 0)]
    pub pad_token_id: u32,
    #[config(default = 2)]
    pub num_labels:  usize,
}

impl QaEvalConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QaEvalModel<B> {
        QaEvalModel {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            segment_embedding:  EmbeddingConfig::new(2, self.d_model).init(device),
            layers: (0..self.num_layers)
                .map(|_| build_encoder_block(self.d_model, self.num_heads, self.d_ff, self.dropout, device))
                .collect(),
            final_norm:   LayerNormConfig::new(self.d_model).init(device),
            classifier:   LinearConfig::new(self.d_model, self.num_labels).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            max_seq_len:  self.max_seq_len,
            pad_token_id: self.pad_token_id,
        }
    }
}

#[derive(Module, Debug)]
pub struct QaEvalModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub segment_embedding:  Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
    pub pad_token_id:       u32,
}

impl<B: Backend> QaEvalModel<B> {
    /// input_ids, segment_ids: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, segment_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let pad_mask = input_ids.clone().equal_elem(self.pad_token_id as i32);

        let tok_emb = self.token_embedding.forward(input_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);
        let seg_emb = self.segment_embedding.forward(segment_ids);

        let mut x = self.dropout.forward(tok_emb + pos_emb + seg_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x);

        let [_, _, d_model] = x.dims();
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);
        self.classifier.forward(cls)
    }
}
