// Scoring engine: field extraction, skill tokenization, the four similarity
// signals, rule-based sub-scores, and the fixed-weight ensemble.
// Provider access goes through the nlp seams; nothing here talks HTTP
// directly.

pub mod ensemble;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod rules;
pub mod similarity;
pub mod tokenize;
