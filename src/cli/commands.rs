use clap::Subcommand;

use super::config::ConfigArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run a focus session over a page fixture
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),
}
