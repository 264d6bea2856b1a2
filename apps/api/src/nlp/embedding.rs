//! Phrase embedding providers.
//!
//! The similarity engine only needs `phrase -> fixed-length vector` plus
//! cosine. Two backends implement the seam:
//! - `HashEmbedder`: character-trigram feature hashing. Deterministic,
//!   dependency-free, loaded instantly; the default.
//! - `RemoteEmbedder`: an HTTP embedding service, selected via
//!   `EMBEDDING_BACKEND=remote` and probed at startup.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

/// Embedding provider seam. Carried in `AppState` as `Arc<dyn Embedder>`,
/// swapped at startup via config.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Implementation name, reported by /health.
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    async fn embed(&self, phrase: &str) -> Result<Vec<f32>, EmbedError>;

    /// Startup readiness probe. A failing provider aborts initialization.
    async fn ready(&self) -> Result<(), EmbedError> {
        Ok(())
    }
}

/// Cosine similarity with zero-norm and dimension-mismatch guards.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ────────────────────────────────────────────────────────────────────────────
// HashEmbedder
// ────────────────────────────────────────────────────────────────────────────

const DEFAULT_HASH_DIMENSION: usize = 256;

/// Feature-hashing embedder: character trigrams of the lowercased phrase are
/// hashed into a fixed-length vector, l2-normalized. No training, no model
/// files, identical output across processes and platforms.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, phrase: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in phrase.to_lowercase().split_whitespace() {
            // Pad so leading/trailing bigrams contribute distinct features.
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            for trigram in padded.windows(3) {
                let idx = (fnv1a(trigram) as usize) % self.dimension;
                vector[idx] += 1.0;
            }
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

/// FNV-1a over the trigram's UTF-8 bytes. Fixed offsets keep the hash stable
/// across runs, which the deterministic-scoring property depends on.
fn fnv1a(chars: &[char]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    let mut buf = [0u8; 4];
    for &c in chars {
        for byte in c.encode_utf8(&mut buf).as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RemoteEmbedder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for an HTTP embedding service exposing
/// `POST {base}/embed {"texts": [...]} -> {"embeddings": [[...]]}`.
pub struct RemoteEmbedder {
    client: Client,
    base_url: String,
    dimension: usize,
}

impl RemoteEmbedder {
    pub fn new(base_url: String, dimension: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            dimension,
        }
    }

    async fn call(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>, EmbedError> {
        let expected = texts.len();
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != expected {
            return Err(EmbedError::CountMismatch {
                expected,
                got: body.embeddings.len(),
            });
        }
        Ok(body.embeddings)
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, phrase: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.call(vec![phrase]).await?;
        Ok(vectors.remove(0))
    }

    async fn ready(&self) -> Result<(), EmbedError> {
        self.call(vec!["readiness probe"]).await.map(|_| ())
    }
}
