use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to build (read) the settings file.
    #[error("Failed to read settings file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Settings file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl SettingsError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures reported by a provider backend. The core never retries these.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No provider backend is configured; pass --inventory or set provider.inventory in the settings file")]
    Unconfigured,
    #[error("Failed to read provider inventory {path}: {source}")]
    InventoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse provider inventory {path}: {source}")]
    InventoryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Region `{region}` is not known to the provider")]
    UnknownRegion { region: String },
    #[error("Network `{selector}` was not found in region {region}")]
    NetworkNotFound { region: String, selector: String },
    #[error("Provider request failed: {message}")]
    Request { message: String },
}

/// Failure taxonomy for catalogue storage, resolution, and provisioning operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Unable to determine profile catalogue path: {message}")]
    ConfigPath {
        message: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("Profile catalogue {path} is not valid JSON: {source}")]
    CatalogueDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read profile catalogue {path}: {source}")]
    CatalogueIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write profile catalogue {path}: {source}")]
    CatalogueWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No profiles recorded for region {region}; run `machine sync` in that region first")]
    RegionNotFound { region: String },
    #[error("Profile `{name}` not found in region {region}; run `machine sync --name {name}` to create it")]
    ProfileNotFound { region: String, name: String },
    #[error("Invalid parameter `{parameter}`: {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },
    #[error("No region configured; pass --region, set AWS_REGION, or set provider.region in the settings file")]
    RegionUnset,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl MachineError {
    /// Wrap a filesystem failure encountered while resolving the catalogue path.
    pub fn config_path(message: impl Into<String>, source: io::Error) -> Self {
        Self::ConfigPath {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Shorthand for a launch-parameter validation failure.
    pub fn invalid_parameter(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }
}
