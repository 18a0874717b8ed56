use super::{OutputFormat, ThemeArg};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        validate(&data)?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn source_column(&self) -> &str {
        &self.data.columns.source
    }

    pub fn destination_column(&self) -> &str {
        &self.data.columns.destination
    }

    pub fn time_column(&self) -> &str {
        &self.data.columns.time
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.data
            .output
            .format
            .as_deref()
            .and_then(|value| OutputFormat::from_str(value, true).ok())
    }

    pub fn theme(&self) -> Option<ThemeArg> {
        self.data
            .output
            .theme
            .as_deref()
            .and_then(|value| ThemeArg::from_str(value, true).ok())
    }

    pub fn set_columns(&mut self, update: ColumnsUpdate) {
        let columns = &mut self.data.columns;
        if let Some(source) = update.source {
            columns.source = source;
        }
        if let Some(destination) = update.destination {
            columns.destination = destination;
        }
        if let Some(time) = update.time {
            columns.time = time;
        }
    }

    pub fn set_output(&mut self, format: Option<OutputFormat>, theme: Option<ThemeArg>) {
        if let Some(format) = format {
            self.data.output.format = Some(value_name(format));
        }
        if let Some(theme) = theme {
            self.data.output.theme = Some(value_name(theme));
        }
    }

    pub fn persist(&self) -> Result<PathBuf, ConfigError> {
        let target = if let Some(path) = &self.path {
            path.clone()
        } else if let Some(default) = default_config_path() {
            default
        } else {
            return Err(ConfigError::NoConfigPath);
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = self.to_toml()?;
        fs::write(&target, serialized).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.data).map_err(|source| ConfigError::Serialize { source })
    }
}

fn value_name<T: ValueEnum>(value: T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(data: &RawConfig) -> Result<(), ConfigError> {
    if let Some(value) = data.output.format.as_deref() {
        if OutputFormat::from_str(value, true).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "output.format",
                value: value.to_string(),
            });
        }
    }
    if let Some(value) = data.output.theme.as_deref() {
        if ThemeArg::from_str(value, true).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "output.theme",
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    columns: ColumnsSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Deserialize, Serialize)]
struct ColumnsSection {
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_destination")]
    destination: String,
    #[serde(default = "default_time")]
    time: String,
}

impl Default for ColumnsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            destination: default_destination(),
            time: default_time(),
        }
    }
}

fn default_source() -> String {
    "source".into()
}

fn default_destination() -> String {
    "destination".into()
}

fn default_time() -> String {
    "t".into()
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct OutputSection {
    format: Option<String>,
    theme: Option<String>,
}

#[derive(Debug, Default)]
pub struct ColumnsUpdate {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize CLI config: {source}")]
    Serialize { source: toml::ser::Error },
    #[error("failed to write CLI config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("no config directory found; pass --config or set EPITRACE_CONFIG")]
    NoConfigPath,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("epitrace").join("cli.toml"))
}
