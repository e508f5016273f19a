use super::*;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.openai.embedding_dimension, 1536);
    assert_eq!(config.search.default_limit, 5);
    assert!((config.search.similarity_threshold - 0.7).abs() < f32::EPSILON);
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config =
        Config::load(temp_dir.path().join("missing.toml")).expect("Failed to load config");
    assert_eq!(config, Config::default());
}

#[test]
fn save_and_load_roundtrip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("folio-kb.toml");

    let mut config = Config::default();
    config.openai.embedding_model = "text-embedding-3-large".to_string();
    config.openai.embedding_dimension = 3072;
    config.server.port = 9000;
    config.save(&path).expect("Failed to save config");

    let loaded = Config::load(&path).expect("Failed to load config");
    assert_eq!(loaded.openai.embedding_model, "text-embedding-3-large");
    assert_eq!(loaded.openai.embedding_dimension, 3072);
    assert_eq!(loaded.server.port, 9000);
}

#[test]
fn partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("folio-kb.toml");
    std::fs::write(&path, "[server]\nport = 1234\n").expect("Failed to write config");

    let config = Config::load(&path).expect("Failed to load config");
    assert_eq!(config.server.port, 1234);
    assert_eq!(config.openai, OpenAiConfig::default());
}

#[test]
fn rejects_invalid_embedding_dimension() {
    let mut config = Config::default();
    config.openai.embedding_dimension = 32;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(32))
    ));
}

#[test]
fn rejects_out_of_range_threshold() {
    let mut config = Config::default();
    config.search.similarity_threshold = 1.5;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidThreshold(_))
    ));
}

#[test]
fn rejects_zero_limit() {
    let mut config = Config::default();
    config.search.default_limit = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(0))));
}

#[test]
fn rejects_non_http_base_url() {
    let mut config = Config::default();
    config.openai.base_url = "ftp://api.example.com/v1".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn api_base_url_keeps_version_prefix_for_joins() {
    let config = OpenAiConfig::default();
    let base = config.api_base_url().expect("Failed to parse base URL");
    let joined = base.join("embeddings").expect("Failed to join URL");
    assert_eq!(joined.as_str(), "https://api.openai.com/v1/embeddings");
}
