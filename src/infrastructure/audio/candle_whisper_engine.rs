use std::path::Path;
use std::sync::Mutex;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::audio_decoder::decode_audio_file;

const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";
const MAX_SEGMENT_TOKENS: usize = 224;

/// Whisper speech-to-text running locally through Candle.
///
/// The model is loaded once at startup and shared by every offloaded job;
/// decoding keeps a KV cache so jobs take turns on the model.
pub struct CandleWhisperEngine {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
    model_id: String,
}

fn load_err(what: &str, e: impl std::fmt::Display) -> TranscriptionError {
    TranscriptionError::ModelLoadFailed(format!("{}: {}", what, e))
}

fn infer_err(e: impl std::fmt::Display) -> TranscriptionError {
    TranscriptionError::TranscriptionFailed(e.to_string())
}

/// Maps a size name such as `small` to its Hugging Face repository. Values
/// that already name a repository are used as-is.
pub fn resolve_model_id(model_size: &str) -> String {
    if model_size.contains('/') {
        model_size.to_string()
    } else {
        format!("openai/whisper-{}", model_size)
    }
}

impl CandleWhisperEngine {
    pub fn new(model_size: &str) -> Result<Self, TranscriptionError> {
        let model_id = resolve_model_id(model_size);
        let device = Device::Cpu;

        tracing::info!(
            device = ?device,
            model = %model_id,
            "Initializing Candle Whisper transcription engine"
        );

        let api = Api::new().map_err(|e| load_err("hf-hub", e))?;
        let repo = api.repo(Repo::new(model_id.clone(), RepoType::Model));

        let config_path = repo.get("config.json").map_err(|e| load_err("config.json", e))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| load_err("tokenizer.json", e))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| load_err("model.safetensors", e))?;

        let config_contents =
            std::fs::read_to_string(&config_path).map_err(|e| load_err("read config", e))?;
        let config: Config =
            serde_json::from_str(&config_contents).map_err(|e| load_err("parse config", e))?;

        let mel_file = if config.num_mel_bins == 128 {
            "melfilters128.bytes"
        } else {
            "melfilters.bytes"
        };
        let mel_repo = api.repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model));
        let mel_bytes_path = mel_repo.get(mel_file).map_err(|e| load_err(mel_file, e))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| load_err("tokenizer", e))?;

        let mel_bytes = std::fs::read(&mel_bytes_path).map_err(|e| load_err("mel filters", e))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| load_err("weights", e))?
        };

        let model =
            m::model::Whisper::load(&vb, config.clone()).map_err(|e| load_err("model", e))?;

        tracing::info!(model = %model_id, "Candle Whisper engine loaded successfully");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            mel_filters,
            model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn mel_segments(&self, pcm: &[f32]) -> Result<Vec<Tensor>, TranscriptionError> {
        let n_mel = self.config.num_mel_bins;
        pcm.chunks(m::N_SAMPLES)
            .map(|chunk| {
                let mut samples = chunk.to_vec();
                samples.resize(m::N_SAMPLES, 0.0);

                let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
                let n_frames = mel_data.len() / n_mel;
                Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                    .map_err(|e| TranscriptionError::TranscriptionFailed(format!("mel tensor: {}", e)))
            })
            .collect()
    }
}

impl TranscriptionEngine for CandleWhisperEngine {
    fn transcribe(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError> {
        let pcm = decode_audio_file(audio_path)?;
        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled);
        }

        let mel_segments = self.mel_segments(&pcm)?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| TranscriptionError::TranscriptionFailed("model lock poisoned".to_string()))?;

        let mut segments: Vec<String> = Vec::new();
        for (i, mel) in mel_segments.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(segment = i, "Transcription cancelled between segments");
                return Err(TranscriptionError::Cancelled);
            }

            tracing::debug!(segment = i, "Transcribing audio segment");
            let result = decode_segment(&mut model, &self.tokenizer, &self.device, mel, cancel);
            model.reset_kv_cache();

            let text = result?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");

        tracing::info!(
            segments = segments.len(),
            chars = transcript.len(),
            "Audio transcription completed"
        );

        Ok(transcript)
    }
}

fn decode_segment(
    model: &mut m::model::Whisper,
    tokenizer: &Tokenizer,
    device: &Device,
    mel: &Tensor,
    cancel: &CancellationToken,
) -> Result<String, TranscriptionError> {
    let sot_token = token_id(tokenizer, m::SOT_TOKEN)?;
    let transcribe_token = token_id(tokenizer, m::TRANSCRIBE_TOKEN)?;
    let no_timestamps_token = token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?;
    let eot_token = token_id(tokenizer, m::EOT_TOKEN)?;

    let audio_features = model
        .encoder
        .forward(mel, true)
        .map_err(|e| TranscriptionError::TranscriptionFailed(format!("encoder: {}", e)))?;

    let prompt = [sot_token, transcribe_token, no_timestamps_token];
    let mut tokens = prompt.to_vec();

    for _ in 0..MAX_SEGMENT_TOKENS {
        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled);
        }

        let token_tensor = Tensor::new(tokens.as_slice(), device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(infer_err)?;

        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, tokens.len() == prompt.len())
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("decoder: {}", e)))?;

        let logits = decoder_output
            .squeeze(0)
            .and_then(|out| model.decoder.final_linear(&out))
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("linear: {}", e)))?;

        let seq_len = logits.dim(0).map_err(infer_err)?;
        let next_token = logits
            .get(seq_len - 1)
            .and_then(|last| last.argmax(0))
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(infer_err)?;

        if next_token == eot_token {
            break;
        }

        tokens.push(next_token);
    }

    let text = tokenizer
        .decode(&tokens[prompt.len()..], true)
        .map_err(|e| TranscriptionError::TranscriptionFailed(format!("detokenize: {}", e)))?;

    Ok(text.trim().to_string())
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, TranscriptionError> {
    tokenizer.token_to_id(token).ok_or_else(|| {
        TranscriptionError::TranscriptionFailed(format!("token not found: {}", token))
    })
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    let filters: Vec<f32> = bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(filters)
}
