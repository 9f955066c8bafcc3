mod audio_staging;
mod chat_model;
mod embedder;
mod search_result;
mod text_splitter;
mod transcription_engine;
mod vector_store;
mod vector_store_error;

pub use audio_staging::{AudioStaging, StagedAudio, StagingError};
pub use chat_model::{ChatModel, ChatModelError};
pub use embedder::{Embedder, EmbedderError};
pub use search_result::SearchResult;
pub use text_splitter::{TextSplitter, TextSplitterError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
pub use vector_store::VectorStore;
pub use vector_store_error::VectorStoreError;
