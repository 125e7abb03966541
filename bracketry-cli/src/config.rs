use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! from_environment {
    ($config:expr, $($key:expr, $name:tt),*$(,)?) => {{
        $(
            {
                if let Ok(value) = env::var($key) {
                    match value.parse() {
                        Ok(value) => $config.$name = value,
                        Err(_) => log::warn!("Ignoring invalid value for {}: {:?}", $key, value),
                    }
                }
            }
        )*
    }};
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The JSON file holding all tournaments.
    pub store: PathBuf,
    pub loglevel: LevelFilter,
}

impl Config {
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let buf = fs::read(path)?;
        Ok(toml::from_slice(&buf)?)
    }

    /// Overrides all values that are set in the environment.
    pub fn with_environment(mut self) -> Self {
        from_environment!(self, "BRACKETRY_STORE", store, "BRACKETRY_LOGLEVEL", loglevel);

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: PathBuf::from("bracketry.json"),
            loglevel: LevelFilter::Warn,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
