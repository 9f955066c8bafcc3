use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use voxrag::application::services::{DocumentStore, OffloadPool, TranscriptionService};
use voxrag::infrastructure::audio::CandleWhisperEngine;
use voxrag::infrastructure::llm::{LocalCandleEmbedder, OllamaChatModel};
use voxrag::infrastructure::observability::{TracingConfig, init_tracing};
use voxrag::infrastructure::persistence::LocalVectorStore;
use voxrag::infrastructure::storage::TempAudioStaging;
use voxrag::infrastructure::text_processing::CharacterTextSplitter;
use voxrag::presentation::{AppState, Cli, Command, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.profile)
        .with_context(|| format!("Failed to load settings for profile '{}'", cli.profile))?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    init_tracing(&TracingConfig {
        default_filter: settings.logging.level.clone(),
        json_format: settings.logging.json,
        profile: cli.profile.clone(),
    });

    let document_store = Arc::new(build_document_store(&settings).await?);

    match cli.command {
        Some(Command::Ingest { paths }) => ingest(&document_store, &paths).await,
        None | Some(Command::Serve) => serve(settings, document_store).await,
    }
}

async fn build_document_store(
    settings: &Settings,
) -> anyhow::Result<DocumentStore<LocalVectorStore>> {
    let vs = &settings.vector_store;

    let embedder = LocalCandleEmbedder::new(&vs.embedding_model)
        .with_context(|| format!("Failed to load embedding model '{}'", vs.embedding_model))?;
    let vector_store = LocalVectorStore::open(&vs.persist_directory, &vs.embedding_model)
        .await
        .with_context(|| {
            format!(
                "Failed to open vector store at {}",
                vs.persist_directory.display()
            )
        })?;
    let text_splitter = CharacterTextSplitter::new(&vs.separator, vs.chunk_size, vs.chunk_overlap)
        .context("Invalid text splitter settings")?;

    Ok(DocumentStore::new(
        Arc::new(embedder),
        Arc::new(vector_store),
        Arc::new(text_splitter),
    ))
}

async fn ingest(
    document_store: &DocumentStore<LocalVectorStore>,
    paths: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    let mut total = 0;
    for path in paths {
        let added = document_store
            .load_documents(path)
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        tracing::info!(path = %path.display(), chunks = added, "Ingested document");
        total += added;
    }

    document_store
        .persist()
        .await
        .context("Failed to persist vector store")?;

    tracing::info!(
        files = paths.len(),
        chunks = total,
        indexed = document_store.chunk_count().await?,
        "Ingestion complete"
    );

    Ok(())
}

async fn serve(
    settings: Settings,
    document_store: Arc<DocumentStore<LocalVectorStore>>,
) -> anyhow::Result<()> {
    let ts = &settings.transcription;

    let engine = CandleWhisperEngine::new(&ts.model_size)
        .with_context(|| format!("Failed to load whisper model '{}'", ts.model_size))?;
    let whisper_model = engine.model_id().to_string();
    let staging = TempAudioStaging::new(ts.staging_dir.clone())
        .context("Failed to prepare audio staging directory")?;
    let timeout = (ts.timeout_secs > 0).then(|| Duration::from_secs(ts.timeout_secs));
    let offload_pool = OffloadPool::new(ts.worker_threads, ts.max_pending, timeout);

    let transcription_service = Arc::new(TranscriptionService::new(
        Arc::new(engine),
        Arc::new(staging),
        offload_pool,
    ));

    let chat_model = Arc::new(
        OllamaChatModel::new(
            &settings.chat.base_url,
            settings.chat.model.clone(),
            Duration::from_secs(settings.chat.timeout_secs),
        )
        .context("Failed to build chat client")?,
    );

    let bind_host = settings.server.host.clone();
    let bind_port = settings.server.port;

    tracing::info!(
        indexed_chunks = document_store.chunk_count().await?,
        chat_model = %chat_model.model(),
        whisper_model = %whisper_model,
        "Engines ready"
    );

    let state = AppState {
        transcription_service,
        chat_model,
        document_store,
        settings,
    };

    let router = create_router(state);

    let listener = TcpListener::bind((bind_host.as_str(), bind_port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind_host, bind_port))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
