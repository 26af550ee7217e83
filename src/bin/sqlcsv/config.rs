use super::QuoteArg;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub database: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub lf: Option<bool>,
    pub headers: Option<bool>,
    pub quote: Option<QuoteArg>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportDefaults {
    pub delimiter: Option<String>,
    pub lf: Option<bool>,
    pub headers: Option<bool>,
    pub quote: Option<QuoteArg>,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    export: ExportDefaults,
    profiles: HashMap<String, Profile>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = if let Some(config_path) = path.as_ref() {
            if config_path.exists() {
                read_file(config_path)?
            } else {
                RawConfig::default()
            }
        } else {
            RawConfig::default()
        };
        let profiles = parse_profiles(&data)?;
        let export = ExportDefaults {
            delimiter: data.export.delimiter.clone(),
            lf: data.export.lf,
            headers: data.export.headers,
            quote: parse_quote("[export]", data.export.quote.as_deref())?,
            buffer_size: data.export.buffer_size,
        };
        Ok(Self {
            path,
            data,
            export,
            profiles,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_db_path(&self) -> Option<&PathBuf> {
        self.data.database.default_path.as_ref()
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.data
            .default_profile
            .as_deref()
            .filter(|name| self.profiles.contains_key(*name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Resolves the explicitly requested profile, or the configured default.
    pub fn active_profile(&self, requested: Option<&str>) -> Result<Option<&Profile>, ConfigError> {
        match requested {
            Some(name) => self
                .profile(name)
                .map(Some)
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                }),
            None => Ok(self.default_profile_name().and_then(|name| self.profile(name))),
        }
    }

    pub fn export_defaults(&self) -> &ExportDefaults {
        &self.export
    }
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

fn parse_profiles(data: &RawConfig) -> Result<HashMap<String, Profile>, ConfigError> {
    let mut profiles = HashMap::new();
    for (name, raw) in &data.profiles {
        profiles.insert(name.clone(), convert_profile(name, raw)?);
    }
    if let Some(default_name) = data.default_profile.as_ref() {
        if !profiles.contains_key(default_name) {
            return Err(ConfigError::ProfileNotFound {
                name: default_name.clone(),
            });
        }
    }
    Ok(profiles)
}

fn convert_profile(name: &str, raw: &RawProfile) -> Result<Profile, ConfigError> {
    Ok(Profile {
        name: name.to_string(),
        database: raw.database.clone(),
        delimiter: raw.delimiter.clone(),
        lf: raw.lf,
        headers: raw.headers,
        quote: parse_quote(&format!("profile '{name}'"), raw.quote.as_deref())?,
    })
}

fn parse_quote(scope: &str, value: Option<&str>) -> Result<Option<QuoteArg>, ConfigError> {
    match value {
        Some(value) => QuoteArg::from_str(value, true)
            .map(Some)
            .map_err(|_| ConfigError::InvalidQuote {
                scope: scope.to_string(),
                value: value.to_string(),
            }),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    export: RawExport,
    #[serde(default)]
    profiles: HashMap<String, RawProfile>,
    #[serde(default)]
    default_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    #[serde(rename = "default")]
    default_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExport {
    delimiter: Option<String>,
    lf: Option<bool>,
    headers: Option<bool>,
    quote: Option<String>,
    buffer_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    database: Option<PathBuf>,
    delimiter: Option<String>,
    lf: Option<bool>,
    headers: Option<bool>,
    quote: Option<String>,
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
    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },
    #[error("{scope} quote value '{value}' is invalid (expected always or non-numeric)")]
    InvalidQuote { scope: String, value: String },
    #[error("buffer size must be greater than zero")]
    InvalidBufferSize,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("sqlcsv").join("config.toml"))
}
