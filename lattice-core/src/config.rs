//! Runtime configuration.
//!
//! Values are resolved from defaults, then `lattice/config.json` in the
//! XDG config directories, then the `LATTICE_DEBUG` and `LATTICE_PARALLEL`
//! environment variables.

use crate::error::LatticeError;
use nanoserde::DeJson;
use std::path::PathBuf;

/// Runtime configuration shared by all layers of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Run forward kernels on the rayon thread pool when compiled with it
    pub parallel: bool,
    /// Debug mask, bit 0 logs shapes, bit 1 logs timings
    pub debug: u32,
}

#[derive(DeJson, Debug, Default)]
struct ConfigFile {
    parallel: Option<bool>,
    debug: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Config { parallel: true, debug: 0 }
    }
}

impl Config {
    /// Sequential configuration with debugging disabled
    #[must_use]
    pub const fn sequential() -> Self {
        Config { parallel: false, debug: 0 }
    }

    /// Log shape derivation of every layer at construction
    #[must_use]
    pub const fn debug_shapes(&self) -> bool {
        self.debug % 2 == 1
    }

    /// Log wall time of every layer's forward and backward
    #[must_use]
    pub const fn debug_perf(&self) -> bool {
        (self.debug >> 1) % 2 == 1
    }

    /// Parse configuration document, missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Errors if the document is not valid config json.
    pub fn from_json(json: &str) -> Result<Self, LatticeError> {
        let file = ConfigFile::deserialize_json(json)
            .map_err(|e| LatticeError::parse_error(format!("failed to parse config, {e:?}")))?;
        let mut config = Config::default();
        config.merge(&file);
        Ok(config)
    }

    /// Load configuration from the config file and environment.
    ///
    /// Missing or invalid config files fall back to defaults.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Config::default();
        if let Some(file) = Self::find_config_file() {
            match std::fs::read_to_string(&file) {
                Ok(json) => match ConfigFile::deserialize_json(&json) {
                    Ok(parsed) => {
                        config.merge(&parsed);
                        tracing::debug!("config read from {}", file.display());
                    }
                    Err(e) => tracing::warn!("failed to parse {}, {e:?}, using defaults", file.display()),
                },
                Err(e) => tracing::warn!("failed to read {}, {e}, using defaults", file.display()),
            }
        }
        config.apply_env();
        config
    }

    fn merge(&mut self, file: &ConfigFile) {
        if let Some(parallel) = file.parallel {
            self.parallel = parallel;
        }
        if let Some(debug) = file.debug {
            self.debug = debug;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(x) = std::env::var("LATTICE_DEBUG") {
            match x.parse::<u32>() {
                Ok(x) => self.debug = x,
                Err(_) => tracing::warn!("ignoring LATTICE_DEBUG={x}, expected an integer mask"),
            }
        }
        if let Ok(x) = std::env::var("LATTICE_PARALLEL") {
            match parse_flag(&x) {
                Some(x) => self.parallel = x,
                None => tracing::warn!("ignoring LATTICE_PARALLEL={x}, expected 0, 1, true or false"),
            }
        }
    }

    // Search through config directories and find lattice/config.json
    fn find_config_file() -> Option<PathBuf> {
        let dirs = xdg::BaseDirectories::new()
            .map_err(|e| tracing::debug!("failed to find config directories, {e}"))
            .ok()?;
        let mut paths = dirs.get_config_dirs();
        paths.push(dirs.get_config_home());
        paths.into_iter().rev().find_map(|mut path| {
            path.push("lattice/config.json");
            path.is_file().then_some(path)
        })
    }
}

fn parse_flag(x: &str) -> Option<bool> {
    match x.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
