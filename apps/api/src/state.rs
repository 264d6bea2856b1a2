use std::sync::Arc;

use crate::config::Config;
use crate::matching::ensemble::EnsembleConfig;
use crate::nlp::embedding::Embedder;
use crate::nlp::ner::Annotator;
use crate::nlp::vocabulary::SkillVocabulary;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything here is built once in `main` and read-only
/// afterwards: scoring calls share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Skill vocabulary, loaded once per process lifetime.
    pub vocabulary: Arc<SkillVocabulary>,
    /// Entity source for the field extractor: vocabulary ruler plus the
    /// optional HTTP provider.
    pub annotator: Arc<Annotator>,
    /// Pluggable embedding backend. Default: HashEmbedder. Swap via
    /// EMBEDDING_BACKEND env.
    pub embedder: Arc<dyn Embedder>,
    /// Fixed ensemble weights; named so they can be tuned without touching
    /// scoring logic.
    pub ensemble: EnsembleConfig,
}
