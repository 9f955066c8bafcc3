use std::sync::Arc;

use crate::application::ports::{ChatModel, VectorStore};
use crate::application::services::{DocumentStore, TranscriptionService};
use crate::presentation::config::Settings;

pub struct AppState<C, V>
where
    C: ChatModel,
    V: VectorStore,
{
    pub transcription_service: Arc<TranscriptionService>,
    pub chat_model: Arc<C>,
    pub document_store: Arc<DocumentStore<V>>,
    pub settings: Settings,
}

impl<C, V> Clone for AppState<C, V>
where
    C: ChatModel,
    V: VectorStore,
{
    fn clone(&self) -> Self {
        Self {
            transcription_service: Arc::clone(&self.transcription_service),
            chat_model: Arc::clone(&self.chat_model),
            document_store: Arc::clone(&self.document_store),
            settings: self.settings.clone(),
        }
    }
}
