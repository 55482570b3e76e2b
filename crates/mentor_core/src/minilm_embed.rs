//! Candle encoder for `sentence-transformers/all-MiniLM-L6-v2`.
//!
//! Weights come from the upstream `model.safetensors` (BERT tensor names,
//! no `bert.` prefix) and `tokenizer.json`. Output is the mean-pooled last
//! hidden state, L2 normalised, 384 wide.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{Embedding, LayerNorm, Linear, VarBuilder};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};

use crate::embed::EmbeddingProvider;

struct EncoderShape {
    hidden: usize,
    intermediate: usize,
    heads: usize,
    layers: usize,
    vocab: usize,
    max_positions: usize,
    token_types: usize,
    eps: f64,
}

const MINILM_L6: EncoderShape = EncoderShape {
    hidden: 384,
    intermediate: 1536,
    heads: 12,
    layers: 6,
    vocab: 30522,
    max_positions: 512,
    token_types: 2,
    eps: 1e-12,
};

struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    out: Linear,
    norm: LayerNorm,
    heads: usize,
    head_dim: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, shape: &EncoderShape) -> Result<Self> {
        let h = shape.hidden;
        Ok(Self {
            query: candle_nn::linear(h, h, vb.pp("self.query"))?,
            key: candle_nn::linear(h, h, vb.pp("self.key"))?,
            value: candle_nn::linear(h, h, vb.pp("self.value"))?,
            out: candle_nn::linear(h, h, vb.pp("output.dense"))?,
            norm: candle_nn::layer_norm(h, shape.eps, vb.pp("output.LayerNorm"))?,
            heads: shape.heads,
            head_dim: h / shape.heads,
        })
    }

    fn split_heads(&self, x: Tensor, batch: usize, seq: usize) -> Result<Tensor> {
        Ok(x.reshape((batch, seq, self.heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()?)
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (batch, seq, hidden) = x.dims3()?;

        let q = self.split_heads(self.query.forward(x)?, batch, seq)?;
        let k = self.split_heads(self.key.forward(x)?, batch, seq)?;
        let v = self.split_heads(self.value.forward(x)?, batch, seq)?;

        let scores = (q.matmul(&k.t()?)? / (self.head_dim as f64).sqrt())?;
        let probs = candle_nn::ops::softmax_last_dim(&scores)?;
        let ctx = probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq, hidden))?;

        Ok(self.norm.forward(&(x + self.out.forward(&ctx)?)?)?)
    }
}

struct EncoderLayer {
    attention: SelfAttention,
    up: Linear,
    down: Linear,
    norm: LayerNorm,
}

impl EncoderLayer {
    fn load(vb: VarBuilder, shape: &EncoderShape) -> Result<Self> {
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attention"), shape)?,
            up: candle_nn::linear(shape.hidden, shape.intermediate, vb.pp("intermediate.dense"))?,
            down: candle_nn::linear(shape.intermediate, shape.hidden, vb.pp("output.dense"))?,
            norm: candle_nn::layer_norm(shape.hidden, shape.eps, vb.pp("output.LayerNorm"))?,
        })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.attention.forward(x)?;
        let h = self.down.forward(&self.up.forward(&x)?.gelu_erf()?)?;
        Ok(self.norm.forward(&(x + h)?)?)
    }
}

struct MiniLmEncoder {
    words: Embedding,
    positions: Embedding,
    token_types: Embedding,
    norm: LayerNorm,
    layers: Vec<EncoderLayer>,
    device: Device,
}

impl MiniLmEncoder {
    fn load(path: &Path, device: &Device) -> Result<Self> {
        let shape = &MINILM_L6;
        // SAFETY: the file is only read, and stays mapped for the lifetime of the tensors.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };

        let emb = vb.pp("embeddings");
        let layers = (0..shape.layers)
            .map(|i| EncoderLayer::load(vb.pp(format!("encoder.layer.{i}")), shape))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            words: candle_nn::embedding(shape.vocab, shape.hidden, emb.pp("word_embeddings"))?,
            positions: candle_nn::embedding(
                shape.max_positions,
                shape.hidden,
                emb.pp("position_embeddings"),
            )?,
            token_types: candle_nn::embedding(
                shape.token_types,
                shape.hidden,
                emb.pp("token_type_embeddings"),
            )?,
            norm: candle_nn::layer_norm(shape.hidden, shape.eps, emb.pp("LayerNorm"))?,
            layers,
            device: device.clone(),
        })
    }

    fn encode(&self, token_ids: &[u32]) -> Result<Vec<f32>> {
        let seq = token_ids.len();
        let ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let positions = Tensor::arange(0u32, seq as u32, &self.device)?.unsqueeze(0)?;
        let types = ids.zeros_like()?;

        let embedded = ((self.words.forward(&ids)? + self.positions.forward(&positions)?)?
            + self.token_types.forward(&types)?)?;
        let mut hidden = self.norm.forward(&embedded)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden)?;
        }

        let pooled = hidden.mean(1)?.squeeze(0)?;
        let norm = pooled.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?;
        let norm_val: f32 = norm.squeeze(0)?.to_scalar()?;
        let pooled = if norm_val > 0.0 {
            pooled.broadcast_div(&norm)?
        } else {
            pooled
        };

        Ok(pooled.to_vec1::<f32>()?)
    }
}

pub struct MiniLmEmbeddingProvider {
    encoder: MiniLmEncoder,
    tokenizer: Tokenizer,
}

impl MiniLmEmbeddingProvider {
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        let encoder = MiniLmEncoder::load(model_path, &Device::Cpu)
            .with_context(|| format!("load weights from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer {}: {e}", tokenizer_path.display()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MINILM_L6.max_positions,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("configure truncation: {e}"))?;

        tracing::info!(model = %model_path.display(), "loaded MiniLM encoder");
        Ok(Self { encoder, tokenizer })
    }
}

impl EmbeddingProvider for MiniLmEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        self.encoder.encode(encoding.get_ids())
    }

    fn dimension(&self) -> usize {
        MINILM_L6.hidden
    }

    fn name(&self) -> &str {
        crate::config::DEFAULT_MODEL_ID
    }
}
