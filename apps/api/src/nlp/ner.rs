//! Named-entity recognition seam.
//!
//! Two layers feed the field extractor:
//! - `VocabularyRuler`: in-process rule matcher seeded from the skill
//!   vocabulary, always active, emits SKILL entities.
//! - an optional `EntityRecognizer` provider (HTTP service) contributing
//!   PERSON/ORG/PRODUCT/GPE spans.
//!
//! The `Annotator` merges the two. Ruler spans win on overlap, matching the
//! original pipeline where the rule matcher ran ahead of the statistical
//! model and its spans were not overwritten.

use aho_corasick::{AhoCorasick, MatchKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::nlp::vocabulary::SkillVocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Skill,
    Org,
    Product,
    Gpe,
    Other,
}

impl EntityLabel {
    fn from_provider(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PERSON" => Self::Person,
            "SKILL" => Self::Skill,
            "ORG" => Self::Org,
            "PRODUCT" => Self::Product,
            "GPE" => Self::Gpe,
            _ => Self::Other,
        }
    }
}

/// A labeled text span. `start` is the byte offset into the annotated text,
/// used for document-order decisions and overlap checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
}

impl Entity {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }

    fn overlaps(&self, other: &Entity) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[derive(Debug, Error)]
pub enum NerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NER API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// External entity-recognition provider. Carried in `AppState` behind an
/// `Arc`, selected at startup.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, NerError>;

    /// Startup readiness probe. An unreachable provider aborts initialization.
    async fn ready(&self) -> Result<(), NerError> {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// VocabularyRuler
// ────────────────────────────────────────────────────────────────────────────

/// Rule-based skill matcher seeded from the vocabulary. Case-insensitive,
/// leftmost-longest, word-boundary checked.
pub struct VocabularyRuler {
    matcher: AhoCorasick,
}

impl VocabularyRuler {
    pub fn new(vocabulary: &SkillVocabulary) -> Self {
        let patterns: Vec<&str> = vocabulary.iter().collect();
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .expect("Failed to build vocabulary matcher");
        Self { matcher }
    }

    /// All vocabulary hits in `text` as SKILL entities, in document order.
    pub fn matches(&self, text: &str) -> Vec<Entity> {
        self.matcher
            .find_iter(text)
            .filter(|m| on_word_boundary(text, m.start(), m.end()))
            .map(|m| Entity {
                text: text[m.range()].to_string(),
                label: EntityLabel::Skill,
                start: m.start(),
            })
            .collect()
    }
}

/// True when the span at `start..end` is not embedded inside a longer
/// alphanumeric token ("java" inside "javascript" must not match).
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

// ────────────────────────────────────────────────────────────────────────────
// HttpEntityRecognizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    entities: Vec<WireEntity>,
}

#[derive(Debug, Deserialize)]
struct WireEntity {
    text: String,
    label: String,
    start: usize,
}

/// Client for an HTTP NER service exposing
/// `POST {base}/entities {"text": ...} -> {"entities": [{text,label,start}]}`.
pub struct HttpEntityRecognizer {
    client: Client,
    base_url: String,
}

impl HttpEntityRecognizer {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }
}

#[async_trait]
impl EntityRecognizer for HttpEntityRecognizer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, NerError> {
        let response = self
            .client
            .post(format!("{}/entities", self.base_url))
            .json(&RecognizeRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: RecognizeResponse = response.json().await?;
        Ok(body
            .entities
            .into_iter()
            .map(|e| Entity {
                label: EntityLabel::from_provider(&e.label),
                text: e.text,
                start: e.start,
            })
            .collect())
    }

    async fn ready(&self) -> Result<(), NerError> {
        self.recognize("readiness probe").await.map(|_| ())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Annotator
// ────────────────────────────────────────────────────────────────────────────

/// The single entity source handed to the field extractor: vocabulary ruler
/// plus optional provider, merged with ruler-wins-on-overlap semantics.
pub struct Annotator {
    ruler: VocabularyRuler,
    provider: Option<Arc<dyn EntityRecognizer>>,
}

impl Annotator {
    pub fn new(ruler: VocabularyRuler, provider: Option<Arc<dyn EntityRecognizer>>) -> Self {
        Self { ruler, provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.as_ref().map_or("none", |p| p.name())
    }

    /// Merged entities in document order. A provider transport failure
    /// degrades to ruler-only output; extraction never fails on it.
    pub async fn entities(&self, text: &str) -> Vec<Entity> {
        let mut entities = self.ruler.matches(text);

        if let Some(provider) = &self.provider {
            match provider.recognize(text).await {
                Ok(found) => {
                    for entity in found {
                        if !entities.iter().any(|e| e.overlaps(&entity)) {
                            entities.push(entity);
                        }
                    }
                }
                Err(e) => {
                    warn!("Entity provider failed, continuing with ruler only: {e}");
                }
            }
        }

        entities.sort_by_key(|e| e.start);
        entities
    }

    pub async fn ready(&self) -> Result<(), NerError> {
        match &self.provider {
            Some(provider) => provider.ready().await,
            None => Ok(()),
        }
    }
}
