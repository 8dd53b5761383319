//! Layered configuration loading: compiled-in defaults, an optional TOML
//! file pointed to by `DAGFORGE_CONFIG`, then `DAGFORGE_*` environment
//! variables, the last layer winning (defaults → files → env; this crate
//! stops at env since the engine has no CLI surface of its own).

use dagforge_engine::EngineConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::error::ConfigError;

/// Load an [`EngineConfig`], validating every value synchronously before
/// the engine starts — invalid or out-of-range values fail configuration
/// loading up front rather than surfacing later as a confusing runtime error.
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));

    if let Ok(path) = std::env::var("DAGFORGE_CONFIG") {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("DAGFORGE_"));

    let config: EngineConfig = figment.extract()?;
    validate(&config)?;
    Ok(config)
}

/// Load a config starting from an explicit TOML file, bypassing
/// `DAGFORGE_CONFIG` lookup — used by tests and by callers that already
/// know their config path.
pub fn load_engine_config_from(path: impl AsRef<std::path::Path>) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed("DAGFORGE_"))
        .extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_concurrency == 0 {
        return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
    }
    if config.default_retry_attempts == 0 {
        return Err(ConfigError::Invalid("default_retry_attempts must be at least 1".into()));
    }
    if config.retry_base_delay_ms > config.retry_max_delay_ms {
        return Err(ConfigError::Invalid("retry_base_delay_ms cannot exceed retry_max_delay_ms".into()));
    }
    if config.node_default_timeout_ms == 0 {
        return Err(ConfigError::Invalid("node_default_timeout_ms must be positive".into()));
    }
    if config.queue_backlog_limit == 0 {
        return Err(ConfigError::Invalid("queue_backlog_limit must be at least 1".into()));
    }
    Ok(())
}
