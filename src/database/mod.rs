pub mod lancedb;
pub mod sqlite;

pub use lancedb::{EmbeddedDocument, VectorHit, VectorStore};
pub use sqlite::Database;
