use std::path::{Path, PathBuf};

use serde::Deserialize;
use std::fs;
use tracing::debug;

use crate::error::{Result, RosterError};

/// Run configuration for the reconciliation pipeline. Loaded from a TOML
/// file, then optionally overridden field by field from the command line;
/// the driver only ever sees the final struct.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Paths to the four input sources consumed whole on every run
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub placement: PathBuf,
    pub department: PathBuf,
    pub unit: PathBuf,
    pub registry: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Formats to emit, e.g. ["csv"] or ["csv", "json"]
    pub formats: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            placement: PathBuf::from("PrimusPlacement.xml"),
            department: PathBuf::from("PrimusDepartment.xml"),
            unit: PathBuf::from("PrimusUnit.xml"),
            registry: PathBuf::from("citizens.csv"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Output_files"),
            formats: vec!["csv".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file is not an error:
    /// the defaults (conventional Primus export names in the working
    /// directory) apply, and the CLI can override any of them.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            RosterError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_parses_sources_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[sources]
placement = "in/PrimusPlacement.xml"
department = "in/PrimusDepartment.xml"
unit = "in/PrimusUnit.xml"
registry = "in/citizens.csv"

[output]
directory = "out"
formats = ["csv", "json"]
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sources.placement, PathBuf::from("in/PrimusPlacement.xml"));
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.output.formats, vec!["csv", "json"]);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.sources.registry, PathBuf::from("citizens.csv"));
        assert_eq!(config.output.formats, vec!["csv"]);
    }
}
