//! The four skill-similarity signals. Each returns a value in [0, 1].
//!
//! Signal order and argument convention are fixed per call: resume first,
//! job second.

use std::collections::{HashMap, HashSet};

use crate::matching::normalize::word_tokens;
use crate::nlp::embedding::{cosine_similarity, EmbedError, Embedder};
use crate::nlp::vocabulary::SkillVocabulary;

/// Pair similarity below or at this value is discarded by the embedding
/// signal.
pub const EMBEDDING_PAIR_THRESHOLD: f32 = 0.6;

/// Character-ratio cutoff for the fuzzy token signal.
pub const FUZZY_TOKEN_THRESHOLD: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Signal 1: lexical TF-IDF cosine
// ────────────────────────────────────────────────────────────────────────────

/// Cosine similarity between the two normalized skill blobs under a
/// two-document TF-IDF weighting: unigrams + bigrams, English stop words
/// removed, smoothed idf, l2-normalized vectors.
pub fn tfidf_cosine(normalized_r: &str, normalized_v: &str) -> f64 {
    let terms_r = tfidf_terms(normalized_r);
    let terms_v = tfidf_terms(normalized_v);
    if terms_r.is_empty() || terms_v.is_empty() {
        return 0.0;
    }

    let counts_r = count_terms(&terms_r);
    let counts_v = count_terms(&terms_v);

    // Smoothed idf over the 2-document corpus: ln((1+n)/(1+df)) + 1.
    let n = 2.0_f64;
    let idf = |term: &str| {
        let df = counts_r.contains_key(term) as u32 + counts_v.contains_key(term) as u32;
        ((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0
    };

    let weigh = |counts: &HashMap<String, u32>| -> HashMap<String, f64> {
        let mut vec: HashMap<String, f64> = counts
            .iter()
            .map(|(term, &tf)| (term.clone(), f64::from(tf) * idf(term)))
            .collect();
        let norm = vec.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in vec.values_mut() {
                *w /= norm;
            }
        }
        vec
    };

    let vec_r = weigh(&counts_r);
    let vec_v = weigh(&counts_v);

    vec_r
        .iter()
        .filter_map(|(term, w)| vec_v.get(term).map(|x| w * x))
        .sum()
}

/// Unigram + bigram terms after stop-word removal. Input is expected to be
/// normalized already (lowercase, punctuation-free).
fn tfidf_terms(normalized: &str) -> Vec<String> {
    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| w.chars().count() >= 2 && !is_stop_word(w))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|w| (*w).to_string()).collect();
    terms.extend(words.windows(2).map(|pair| pair.join(" ")));
    terms
}

fn count_terms(terms: &[String]) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term.clone()).or_insert(0) += 1;
    }
    counts
}

// ────────────────────────────────────────────────────────────────────────────
// Signal 2: per-pair embedding similarity
// ────────────────────────────────────────────────────────────────────────────

/// Mean cosine over all (resume-skill, job-skill) phrase pairs that clear
/// the 0.6 threshold; 0 when no pair does. Each distinct phrase is embedded
/// once per call; the nested pair loop is the dominant cost of a scoring
/// call and stays O(|R|·|V|) similarity checks.
pub async fn embedding_similarity(
    embedder: &dyn Embedder,
    skills_r: &[String],
    skills_v: &[String],
) -> Result<f64, EmbedError> {
    let mut cache: HashMap<&str, Vec<f32>> = HashMap::new();
    for phrase in skills_r.iter().chain(skills_v.iter()) {
        if !cache.contains_key(phrase.as_str()) {
            let vector = embedder.embed(phrase).await?;
            cache.insert(phrase.as_str(), vector);
        }
    }

    let mut kept: Vec<f64> = Vec::new();
    for sr in skills_r {
        for sv in skills_v {
            let sim = cosine_similarity(&cache[sr.as_str()], &cache[sv.as_str()]);
            if sim > EMBEDDING_PAIR_THRESHOLD {
                kept.push(f64::from(sim));
            }
        }
    }

    if kept.is_empty() {
        return Ok(0.0);
    }
    Ok(kept.iter().sum::<f64>() / kept.len() as f64)
}

// ────────────────────────────────────────────────────────────────────────────
// Signal 3: keyword overlap
// ────────────────────────────────────────────────────────────────────────────

/// Jaccard-style keyword overlap with a vocabulary boost:
/// `|∩|/|∪| × (1 + fraction of ∩ present in the vocabulary)`, clamped to 1.
///
/// Not BM25: no term-frequency or document-length normalization.
pub fn keyword_overlap(
    skills_r: &[String],
    skills_v: &[String],
    vocabulary: &SkillVocabulary,
) -> f64 {
    let set_r = phrase_set(skills_r);
    let set_v = phrase_set(skills_v);

    let intersection: HashSet<&String> = set_r.intersection(&set_v).collect();
    let union_len = set_r.union(&set_v).count();

    let base = intersection.len() as f64 / union_len.max(1) as f64;
    let in_vocab = intersection
        .iter()
        .filter(|s| vocabulary.contains(s.as_str()))
        .count();
    let boost = in_vocab as f64 / intersection.len().max(1) as f64;

    (base * (1.0 + boost)).min(1.0)
}

fn phrase_set(phrases: &[String]) -> HashSet<String> {
    phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Signal 4: fuzzy token overlap
// ────────────────────────────────────────────────────────────────────────────

/// Counts cross-set token pairs whose character-ratio exceeds 0.5, divided
/// by the larger set size. Many-to-many matching means the raw count can
/// exceed the divisor, so the result is clamped to 1 to keep the reported
/// breakdown bounded.
pub fn fuzzy_token_overlap(normalized_r: &str, normalized_v: &str) -> f64 {
    let words_r: HashSet<String> = word_tokens(normalized_r, 3).into_iter().collect();
    let words_v: HashSet<String> = word_tokens(normalized_v, 3).into_iter().collect();

    let matches = words_r
        .iter()
        .flat_map(|wr| words_v.iter().map(move |wv| (wr, wv)))
        .filter(|(wr, wv)| strsim::normalized_levenshtein(wr, wv) > FUZZY_TOKEN_THRESHOLD)
        .count();

    let denom = words_r.len().max(words_v.len()).max(1);
    (matches as f64 / denom as f64).min(1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Stop words
// ────────────────────────────────────────────────────────────────────────────

/// Sorted for binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}
