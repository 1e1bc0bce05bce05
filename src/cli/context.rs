use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    /// Whether `config_path` existed when the configuration was loaded.
    from_file: bool,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, from_file: bool) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            from_file,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn from_file(&self) -> bool {
        self.from_file
    }
}
