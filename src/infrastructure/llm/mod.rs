mod local_candle_embedder;
mod ollama_chat_model;

pub use local_candle_embedder::LocalCandleEmbedder;
pub use ollama_chat_model::OllamaChatModel;
