// engine.rs — Candle BERT word embeddings with leading-token-excluded mean reduction.
//
// A word is tokenized with special tokens, trailing specials ([SEP], padding)
// are trimmed so the sequence is <leading special> + <content tokens>, and the
// final hidden states of the content tokens are averaged.
//
// Inference is deterministic: candle tensors loaded from safetensors carry no
// gradient tracking and the BERT dropout layers are identity at inference.

use std::path::Path;

use anyhow::{bail, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use super::EmbeddingSource;
use crate::config;

/// Holds the loaded model and tokenizer.
pub struct LocalModelSource {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_tokens: usize,
    hidden_size: usize,
    name: String,
}

impl LocalModelSource {
    /// Load the model from a local directory containing model.safetensors,
    /// tokenizer.json, and config.json.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let device = Device::Cpu;

        let config_path = model_dir.join(config::local::CONFIG_FILE);
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read {}", config_path.display()))?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)
            .with_context(|| format!("parse {}", config_path.display()))?;

        log::info!(
            "Loading embedding model: hidden_size={}, layers={}, max_positions={}",
            bert_config.hidden_size,
            bert_config.num_hidden_layers,
            bert_config.max_position_embeddings,
        );

        let weights_path = model_dir.join(config::local::MODEL_FILE);
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
                .with_context(|| format!("load weights from {}", weights_path.display()))?
        };
        let model = BertModel::load(vb, &bert_config).context("load BERT model")?;

        let tokenizer_path = model_dir.join(config::local::TOKENIZER_FILE);
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer {}: {e}", tokenizer_path.display()))?;

        let name = model_dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| config::local::MODEL_NAME.to_string());

        log::info!("Embedding model {} loaded (dims={})", name, bert_config.hidden_size);

        Ok(Self {
            model,
            tokenizer,
            device,
            max_tokens: bert_config.max_position_embeddings,
            hidden_size: bert_config.hidden_size,
            name,
        })
    }

    /// Final-layer hidden states for `word`, batch dimension dropped: [num_tokens, hidden_size].
    fn hidden_states(&self, word: &str) -> anyhow::Result<Tensor> {
        let encoding = self
            .tokenizer
            .encode(word, true)
            .map_err(|e| anyhow::anyhow!("tokenize {word:?}: {e}"))?;

        let len = leading_span(encoding.get_special_tokens_mask(), self.max_tokens);
        let token_ids = &encoding.get_ids()[..len];

        // [1, seq_len]
        let token_ids_t = Tensor::new(
            token_ids.iter().map(|&id| id as i64).collect::<Vec<_>>().as_slice(),
            &self.device,
        )?
        .unsqueeze(0)?;
        let attention_mask_t = token_ids_t.ones_like()?;
        let token_type_ids = token_ids_t.zeros_like()?;

        // Forward pass → [1, seq_len, hidden_size]
        let output = self
            .model
            .forward(&token_ids_t, &token_type_ids, Some(&attention_mask_t))?;

        Ok(output.squeeze(0)?)
    }
}

impl EmbeddingSource for LocalModelSource {
    type Component = f32;

    fn embed(&mut self, word: &str) -> anyhow::Result<Vec<f32>> {
        let hidden = self.hidden_states(word)?;
        let reduced = reduce_token_embeddings(&hidden).with_context(|| format!("reducing tokens of {word:?}"))?;
        let vector: Vec<f32> = reduced.to_vec1()?;

        if vector.len() != self.hidden_size {
            bail!(
                "unexpected embedding dims: got {}, expected {}",
                vector.len(),
                self.hidden_size
            );
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Number of tokens to feed the model: trailing special tokens removed, the
/// leading one kept, capped at `max_tokens`.
fn leading_span(special_tokens_mask: &[u32], max_tokens: usize) -> usize {
    let mut end = special_tokens_mask.len();
    while end > 1 && special_tokens_mask[end - 1] == 1 {
        end -= 1;
    }
    end.min(max_tokens)
}

/// Collapse a [num_tokens, hidden] matrix into one [hidden] vector.
///
/// Row 0 (the leading special token) is discarded. A single remaining row is
/// returned unchanged; otherwise the remaining rows are averaged elementwise.
pub fn reduce_token_embeddings(matrix: &Tensor) -> anyhow::Result<Tensor> {
    let (rows, _hidden) = matrix.dims2()?;
    match rows {
        0 | 1 => bail!("no content tokens: got {rows} token(s) including the leading special token"),
        2 => Ok(matrix.get(1)?),
        _ => Ok(matrix.narrow(0, 1, rows - 1)?.mean(0)?),
    }
}
