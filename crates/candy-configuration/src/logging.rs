use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfiguration {
    pub log_dir: PathBuf,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// `EnvFilter` directive used when `TRACING_LEVEL` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_file_name() -> String {
    "candy.developer.log".to_string()
}

fn default_level() -> String {
    "info".to_string()
}
