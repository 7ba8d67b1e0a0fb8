use std::path::PathBuf;

use crate::adaptive::EngineConfig;
use crate::logging::LogSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LogSettings,
    pub snapshot_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let snapshot_path = std::env::var("SNAPSHOT_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self {
            logging: LogSettings::from_env(),
            snapshot_path,
            engine: EngineConfig::from_env(),
        }
    }
}
