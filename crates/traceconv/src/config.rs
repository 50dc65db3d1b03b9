use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracecodec::{LockIds, ValuePolicy};

/// How lock names are numbered in canonical output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LockIdMode {
    /// Locks and variables have independent id spaces.
    #[default]
    Separate,
    /// Locks take ids from the variable id space.
    Shared,
}

impl From<LockIdMode> for LockIds {
    fn from(mode: LockIdMode) -> Self {
        match mode {
            LockIdMode::Separate => LockIds::Separate,
            LockIdMode::Shared => LockIds::SharedWithVariables,
        }
    }
}

/// Where Read/Write values come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Random values, tracked per variable.
    #[default]
    Synthesized,
    /// The data field of each raw line.
    Recorded,
}

impl From<ValueMode> for ValuePolicy {
    fn from(mode: ValueMode) -> Self {
        match mode {
            ValueMode::Synthesized => ValuePolicy::Synthesized,
            ValueMode::Recorded => ValuePolicy::Recorded,
        }
    }
}

/// Conversion settings, read from an optional JSON file and overridden by
/// command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub lock_ids: LockIdMode,
    pub values: ValueMode,
    /// Seed for synthesized values. Each file is converted with a fresh
    /// generator seeded with this value.
    pub seed: Option<u64>,
    pub raw_extension: String,
    pub canonical_extension: String,
    pub binary_extension: String,
    /// Walk input directories recursively instead of only their top level.
    pub recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_ids: LockIdMode::default(),
            values: ValueMode::default(),
            seed: None,
            raw_extension: "std".to_string(),
            canonical_extension: "txt".to_string(),
            binary_extension: "bin".to_string(),
            recursive: false,
        }
    }
}

/// Flags shared by all subcommands.
#[derive(Debug, Default, clap::Args)]
pub struct ConfigArgs {
    /// JSON file with conversion settings.
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub lock_ids: Option<LockIdMode>,

    #[arg(long, global = true, value_enum)]
    pub values: Option<ValueMode>,

    /// Seed for synthesized values.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Walk input directories recursively.
    #[arg(long, short = 'r', global = true)]
    pub recursive: bool,
}

impl Config {
    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| anyhow::anyhow!(e))
    }

    /// Build the effective config from the command line.
    pub fn load(args: &ConfigArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        log::debug!("effective config: {:?}", config);
        Ok(config)
    }

    fn apply(&mut self, args: &ConfigArgs) {
        if let Some(lock_ids) = args.lock_ids {
            self.lock_ids = lock_ids;
        }
        if let Some(values) = args.values {
            self.values = values;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if args.recursive {
            self.recursive = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_json() {
        let config = Config::from_json(
            r#"{"lock_ids": "shared", "values": "recorded", "seed": 7, "raw_extension": "log"}"#,
        )
        .unwrap();
        assert_eq!(config.lock_ids, LockIdMode::Shared);
        assert_eq!(config.values, ValueMode::Recorded);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.raw_extension, "log");
        assert_eq!(config.canonical_extension, "txt");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Config::from_json(r#"{"lockids": "shared"}"#).is_err());
        assert!(Config::from_json(r#"{"lock_ids": "merged"}"#).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = Config::from_json(r#"{"values": "recorded", "seed": 1}"#).unwrap();
        config.apply(&ConfigArgs {
            lock_ids: Some(LockIdMode::Shared),
            seed: Some(9),
            ..Default::default()
        });
        assert_eq!(config.lock_ids, LockIdMode::Shared);
        assert_eq!(config.values, ValueMode::Recorded);
        assert_eq!(config.seed, Some(9));
        assert!(!config.recursive);
    }
}
