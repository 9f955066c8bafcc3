use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

/// Sentence-transformer embeddings computed in-process with Candle: BERT
/// forward pass, attention-masked mean pooling, then L2 normalization.
pub struct LocalCandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

fn load_err(what: &str, e: impl std::fmt::Display) -> EmbedderError {
    EmbedderError::ModelLoadFailed(format!("{}: {}", what, e))
}

fn infer_err(e: impl std::fmt::Display) -> EmbedderError {
    EmbedderError::InferenceFailed(e.to_string())
}

impl LocalCandleEmbedder {
    /// Downloads (or reuses the cached copy of) `model_id` from the Hugging
    /// Face hub and loads it.
    pub fn new(model_id: &str) -> Result<Self, EmbedderError> {
        let device = Device::new_metal(0).unwrap_or(Device::Cpu);

        tracing::info!(
            device = ?device,
            model = model_id,
            "Loading sentence embedding model"
        );

        let api = Api::new().map_err(|e| load_err("hub", e))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let fetch = |file: &str| repo.get(file).map_err(|e| load_err(file, e));
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_contents =
            std::fs::read_to_string(&config_path).map_err(|e| load_err("read config", e))?;
        let config: BertConfig =
            serde_json::from_str(&config_contents).map_err(|e| load_err("parse config", e))?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| load_err("tokenizer", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| load_err("truncation", e))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let dtype = if device.is_cpu() { DType::F32 } else { DType::F16 };

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, &device)
                .map_err(|e| load_err("weights", e))?
        };
        let model = BertModel::load(vb, &config).map_err(|e| load_err("model", e))?;

        tracing::info!(model = model_id, "Sentence embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization: {}", e)))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        // Padding is enabled on the tokenizer, so every row has `seq_len` ids.
        let to_tensor = |select: fn(&Encoding) -> &[u32]| {
            let flat: Vec<u32> = encodings
                .iter()
                .flat_map(|e| select(e).iter().copied())
                .collect();
            Tensor::from_vec(flat, (batch_size, seq_len), &self.device).map_err(infer_err)
        };
        let input_ids = to_tensor(Encoding::get_ids)?;
        let token_type_ids = to_tensor(Encoding::get_type_ids)?;
        let attention_mask = to_tensor(Encoding::get_attention_mask)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .and_then(|t| t.to_dtype(DType::F32))
            .map_err(infer_err)?;

        let pooled = mean_pool(&hidden, &attention_mask).map_err(infer_err)?;

        (0..batch_size)
            .map(|i| {
                let mut values: Vec<f32> = pooled
                    .get(i)
                    .and_then(|t| t.to_vec1())
                    .map_err(infer_err)?;
                l2_normalize(&mut values);
                Ok(values)
            })
            .collect()
    }
}

/// Averages token embeddings over the positions the attention mask keeps.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = mask.sum(1)?.unsqueeze(1)?;
    summed.broadcast_div(&counts)
}

fn l2_normalize(v: &mut [f32]) {
    let length: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if length > 0.0 {
        v.iter_mut().for_each(|x| *x /= length);
    }
}

#[async_trait]
impl Embedder for LocalCandleEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.encode_texts(&[text])?
            .into_iter()
            .next()
            .map(Embedding::new)
            .ok_or_else(|| EmbedderError::InferenceFailed("empty result".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .encode_texts(texts)?
            .into_iter()
            .map(Embedding::new)
            .collect())
    }
}
