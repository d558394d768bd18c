pub mod logging;
pub mod workers;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::ensure;
use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;

use self::logging::LoggingConfiguration;
use self::workers::WorkerConfiguration;

pub const CONFIGURATION_VARIABLE: &str = "CANDY_CONFIGURATION";
pub const DEFAULT_CONFIGURATION_PATH: &str = "./configuration/candy.toml";

/// Every setting of the dispatch service, loaded once at startup. The
/// `Orchestrator` holds it behind an `ArcSwap` so it can be replaced while
/// workers keep running.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SystemConfigurations {
    pub logging: LoggingConfiguration,
    #[serde(default)]
    pub workers: WorkerConfiguration,
}

impl SystemConfigurations {
    /// Reads the file named by `CANDY_CONFIGURATION` (looked up in the
    /// environment and in `.env`), or `./configuration/candy.toml`.
    pub fn read_all_configs() -> Result<Arc<ArcSwap<SystemConfigurations>>> {
        let path = dotenvy::var(CONFIGURATION_VARIABLE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIGURATION_PATH));

        let system_configurations = Self::from_path(&path)?;

        Ok(Arc::new(ArcSwap::new(Arc::new(system_configurations))))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration file {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid configuration file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let system_configurations: SystemConfigurations =
            toml::from_str(contents).context("configuration is not valid TOML")?;

        ensure!(
            system_configurations.workers.number_of_workers != Some(0),
            "number_of_workers has to be at least 1"
        );
        ensure!(
            !system_configurations.logging.file_name.is_empty(),
            "logging.file_name cannot be empty"
        );

        Ok(system_configurations)
    }
}
