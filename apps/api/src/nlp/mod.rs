// NLP collaborators: skill vocabulary, entity recognition, embeddings.
// All provider construction happens at startup; everything here is read-only
// during scoring.

pub mod embedding;
pub mod ner;
pub mod vocabulary;
