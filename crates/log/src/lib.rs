mod logger;

pub use logger::{init_logging, LogConfig, LogError, LogFormat};
