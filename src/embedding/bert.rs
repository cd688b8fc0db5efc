//! Sentence embeddings from a BERT-family model with candle.

use super::{l2_normalize, Embedder};
use crate::config::EmbeddingSettings;
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertEncoder {
    fn load(repo_id: &str, max_sequence_length: usize) -> Result<Self> {
        let device = Device::Cpu;
        info!(repo = repo_id, "Loading embedding model");

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| SamleError::ModelLoad(format!("hf-hub init: {e}")))?;
        let repo = api.model(repo_id.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| SamleError::ModelLoad(format!("config.json from {repo_id}: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| SamleError::ModelLoad(format!("tokenizer.json from {repo_id}: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| SamleError::ModelLoad(format!("model.safetensors from {repo_id}: {e}")))?;

        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| SamleError::ModelLoad(format!("tokenizer: {e}")))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| SamleError::ModelLoad(format!("tokenizer truncation: {e}")))?;

        // SAFETY: the weights file comes from the hf-hub cache and is not
        // modified while the mapping is alive
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = BertModel::load(vb, &config)?;

        info!("Embedding model loaded");
        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Mean-pool the last hidden layer under the attention mask.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| SamleError::Embedding(format!("tokenizer encode failed: {e}")))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?.squeeze(0)?;

        let mut vector = pooled.to_vec1::<f32>()?;
        l2_normalize(&mut vector)?;
        Ok(vector)
    }
}

/// Local sentence embedder.
///
/// Loads the model from the Hugging Face Hub on first use. Inputs longer
/// than the configured sequence length are truncated.
pub struct BertEmbedder {
    repo_id: String,
    max_sequence_length: usize,
    encoder: OnceCell<Arc<BertEncoder>>,
}

impl BertEmbedder {
    pub fn new(repo_id: impl Into<String>, max_sequence_length: usize) -> Self {
        Self {
            repo_id: repo_id.into(),
            max_sequence_length,
            encoder: OnceCell::new(),
        }
    }

    /// Create an embedder from the `[embedding]` settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(settings.model.clone(), settings.max_sequence_length)
    }

    async fn encoder(&self) -> Result<Arc<BertEncoder>> {
        let encoder = self
            .encoder
            .get_or_try_init(|| async {
                let repo_id = self.repo_id.clone();
                let max_len = self.max_sequence_length;
                let encoder =
                    tokio::task::spawn_blocking(move || BertEncoder::load(&repo_id, max_len))
                        .await
                        .map_err(|e| SamleError::ModelLoad(e.to_string()))??;
                Ok::<_, SamleError>(Arc::new(encoder))
            })
            .await?;
        Ok(Arc::clone(encoder))
    }
}

#[async_trait]
impl Embedder for BertEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SamleError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = self.encoder().await?;
        let texts = texts.to_vec();
        debug!("Generating embeddings for {} texts", texts.len());

        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| encoder.embed(text))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| SamleError::Embedding(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let embedder = BertEmbedder::from_settings(&EmbeddingSettings::default());
        assert_eq!(
            embedder.repo_id,
            "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
        );
        assert_eq!(embedder.max_sequence_length, 128);
        assert!(!embedder.encoder.initialized());
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_load_model() {
        let embedder = BertEmbedder::new("samle/does-not-exist", 128);
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
        assert!(!embedder.encoder.initialized());
    }
}
