use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only the optional provider settings may be absent; everything else has a
/// default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// CSV file with a `skill` column; loaded once at startup, fatal if
    /// missing.
    pub skills_csv_path: String,
    /// HTTP named-entity provider. When unset, extraction runs on the
    /// vocabulary ruler plus layout heuristics alone.
    pub ner_url: Option<String>,
    /// "hash" (default, deterministic, in-process) or "remote".
    pub embedding_backend: String,
    pub embedding_url: Option<String>,
    pub embedding_dimension: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            skills_csv_path: std::env::var("SKILLS_CSV_PATH")
                .unwrap_or_else(|_| "data/skills.csv".to_string()),
            ner_url: std::env::var("NER_URL").ok().filter(|v| !v.is_empty()),
            embedding_backend: std::env::var("EMBEDDING_BACKEND")
                .unwrap_or_else(|_| "hash".to_string()),
            embedding_url: std::env::var("EMBEDDING_URL").ok().filter(|v| !v.is_empty()),
            embedding_dimension: std::env::var("EMBEDDING_DIMENSION")
                .unwrap_or_else(|_| "256".to_string())
                .parse::<usize>()
                .context("EMBEDDING_DIMENSION must be a positive integer")?,
        })
    }
}
