// Configuration management module
// Loads the TOML settings file and applies command-line overrides

pub mod settings;


pub use settings::{
    Config, ConfigError, DEFAULT_CONFIG_FILE, DatasetConfig, EmbeddingConfig, ServerConfig,
    StoreConfig,
};
