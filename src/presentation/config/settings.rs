use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub transcription: TranscriptionSettings,
    pub chat: ChatSettings,
    pub vector_store: VectorStoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    /// Whisper size (`tiny`, `base`, `small`, ...) or a full model repository.
    pub model_size: String,
    pub worker_threads: usize,
    pub max_pending: usize,
    /// Zero disables the deadline.
    pub timeout_secs: u64,
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreSettings {
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separator: String,
    pub persist_directory: PathBuf,
    pub max_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Layers built-in defaults, the optional `appsettings.<profile>` file and
    /// `APP_`-prefixed environment variables (`__` separates nested keys).
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::builder(profile)?.build()?.try_deserialize()
    }

    fn builder(
        profile: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000_i64)?
            .set_default("server.max_upload_bytes", 25_i64 * 1024 * 1024)?
            .set_default("transcription.model_size", "small")?
            .set_default("transcription.worker_threads", 2_i64)?
            .set_default("transcription.max_pending", 16_i64)?
            .set_default("transcription.timeout_secs", 600_i64)?
            .set_default("chat.model", "llama3")?
            .set_default("chat.base_url", "http://ollama:11434")?
            .set_default("chat.timeout_secs", 120_i64)?
            .set_default(
                "vector_store.embedding_model",
                "sentence-transformers/all-MiniLM-L6-v2",
            )?
            .set_default("vector_store.chunk_size", 60_i64)?
            .set_default("vector_store.chunk_overlap", 0_i64)?
            .set_default("vector_store.separator", "\n")?
            .set_default("vector_store.persist_directory", "./vector_db")?
            .set_default("vector_store.max_k", 50_i64)?
            .set_default("logging.level", "info,voxrag=debug,tower_http=debug")?
            .set_default("logging.json", false)?;

        Ok(builder
            .add_source(File::with_name(&format!("appsettings.{}", profile)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ))
    }
}
