use thiserror::Error;

pub type Result<T> = std::result::Result<T, FolioError>;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Generation provider unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Knowledge base load failed: {0}")]
    KnowledgeBaseLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod knowledge;
pub mod openai;
pub mod profile;
pub mod responder;
pub mod seeder;
pub mod server;
