// LanceDB vector database module
// Stores one embedding per portfolio document and serves cosine
// nearest-neighbor queries for the search endpoints.

pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{VectorHit, VectorStore};

/// A document embedding ready to be written to the vector table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    /// Unique identifier for this embedding row.
    pub id: String,
    /// The embedding vector; length must match the store's dimension.
    pub vector: Vec<f32>,
    /// Metadata carried alongside the vector and returned with search hits.
    pub metadata: DocumentMetadata,
}

/// Scalar columns stored next to each vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Composite document key, e.g. "project_3".
    pub key: String,
    /// Document category: project, skill, experience or personal-info.
    pub category: String,
    /// Row id of the source record in SQLite.
    pub record_id: i64,
    /// Display title of the document.
    pub title: String,
    /// The text that was embedded.
    pub content: String,
    /// Timestamp when this embedding was created.
    pub created_at: String,
}
