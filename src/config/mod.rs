pub mod settings;

pub use settings::{
    Config, ConfigError, OpenAiConfig, SearchConfig, ServerConfig, StorageConfig,
    DEFAULT_CONFIG_FILE,
};
