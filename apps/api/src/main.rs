mod config;
mod errors;
mod ingest;
mod matching;
mod models;
mod nlp;
mod routes;
mod state;

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::matching::ensemble::EnsembleConfig;
use crate::nlp::embedding::{Embedder, HashEmbedder, RemoteEmbedder};
use crate::nlp::ner::{Annotator, EntityRecognizer, HttpEntityRecognizer, VocabularyRuler};
use crate::nlp::vocabulary::SkillVocabulary;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shortlist API v{}", env!("CARGO_PKG_VERSION"));

    // Load the skill vocabulary. Scoring cannot degrade without it, so a
    // missing or empty file aborts startup.
    let vocabulary = Arc::new(
        SkillVocabulary::load(Path::new(&config.skills_csv_path))
            .context("Skill vocabulary is unavailable")?,
    );

    // Build the entity source: vocabulary ruler plus the optional HTTP
    // provider, probed before we accept traffic.
    let ruler = VocabularyRuler::new(&vocabulary);
    let provider: Option<Arc<dyn EntityRecognizer>> = config
        .ner_url
        .clone()
        .map(|url| Arc::new(HttpEntityRecognizer::new(url)) as Arc<dyn EntityRecognizer>);
    let annotator = Arc::new(Annotator::new(ruler, provider));
    annotator
        .ready()
        .await
        .context("Entity provider is unavailable")?;
    info!("Entity provider: {}", annotator.provider_name());

    // Build the embedding backend, also probed at startup.
    let embedder = build_embedder(&config)?;
    embedder
        .ready()
        .await
        .context("Embedding provider is unavailable")?;
    info!(
        "Embedding backend: {} ({} dimensions)",
        embedder.name(),
        embedder.dimension()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        vocabulary,
        annotator,
        embedder,
        ensemble: EnsembleConfig::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the embedding backend selected by EMBEDDING_BACKEND.
fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding_backend.as_str() {
        "hash" => Ok(Arc::new(HashEmbedder::new(config.embedding_dimension))),
        "remote" => {
            let url = config
                .embedding_url
                .clone()
                .context("EMBEDDING_URL is required when EMBEDDING_BACKEND=remote")?;
            Ok(Arc::new(RemoteEmbedder::new(
                url,
                config.embedding_dimension,
            )))
        }
        other => bail!("Unknown EMBEDDING_BACKEND '{other}' (expected 'hash' or 'remote')"),
    }
}
