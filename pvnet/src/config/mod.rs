
use std::path::Path;

use utils::{Serialize, Deserialize};
use utils::error::*;

pub use crate::neural::config::Config as NeuralConfig;

///
/// Represents a full configuration.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config 
{
    #[serde(default)]
    pub neural: NeuralConfig,

    #[serde(default = "log_path")]
    pub log_path: String
}

impl Default for Config 
{
    fn default () -> Config 
    {
        Config { neural: NeuralConfig::default(), log_path: log_path() }
    }
}

impl Config 
{
    ///
    /// Loads a configuration file. Missing fields take their defaults.
    ///
    pub fn load (path: & Path) -> Result<Config>
    {
        utils::read_toml(path)
    }

    ///
    /// Parses a configuration from a TOML string.
    ///
    pub fn parse (text: & str) -> Result<Config>
    {
        toml::from_str(text).context("Failed to parse the configuration.")
    }
}

///
/// Returns the default log path.
///
fn log_path () -> String 
{
    "logs".to_owned()
}
