mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{load_engine_config, load_engine_config_from};
