//! Search-term database: the rotation of queries used to find artworks.
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Built-in rotation used when no term database is available.
pub const DEFAULT_TERMS: &[&str] = &[
    "Rembrandt",
    "Leonardo da Vinci",
    "Michelangelo",
    "Picasso",
    "Van Gogh",
    "Monet",
    "Vermeer",
    "Caravaggio",
    "Titian",
    "Renaissance painting",
    "Impressionism painting",
    "Baroque painting",
];

/// On-disk layout of the term database. All lists share one rotation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TermDatabase {
    search_queries: Vec<String>,
    movements: Vec<String>,
    themes: Vec<String>,
}

pub fn default_terms() -> Vec<String> {
    DEFAULT_TERMS.iter().map(|t| t.to_string()).collect()
}

/// Load the rotation from `path`. A missing, unreadable or empty database
/// falls back to [`DEFAULT_TERMS`].
pub async fn load(path: &Path) -> Vec<String> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), %err, "term database unavailable; using defaults");
            return default_terms();
        }
    };
    let db: TermDatabase = match serde_json::from_slice(&content) {
        Ok(db) => db,
        Err(err) => {
            warn!(path = %path.display(), %err, "term database unreadable; using defaults");
            return default_terms();
        }
    };

    let terms: Vec<String> = db
        .search_queries
        .into_iter()
        .chain(db.movements)
        .chain(db.themes)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        warn!(path = %path.display(), "term database is empty; using defaults");
        return default_terms();
    }
    info!(count = terms.len(), "loaded search terms");
    terms
}
