//! Load and validate the optional settings file.
use std::{ffi::OsString, path::PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::lib::{errors::SettingsError, paths};
use crate::provider::ImageFilter;

pub mod images;
pub mod provider;

pub use images::{parse_images_section, RawImagesSection, ALLOWED_ARCHITECTURES};
pub use provider::{parse_provider_section, ProviderSection, RawProviderSection};

pub const SETTINGS_ENV_KEY: &str = "MACHINE_SETTINGS";
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// Validated settings. Every field has a usable default.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub provider: ProviderSection,
    pub images: ImageFilter,
    /// File the settings came from; `None` when defaults were used.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    provider: Option<RawProviderSection>,
    images: Option<RawImagesSection>,
}

impl Settings {
    /// Load `explicit` when given (it must exist), otherwise
    /// `~/.machine/config.toml` if present, otherwise defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, SettingsError> {
        Self::load_with_home(explicit, std::env::var_os(paths::HOME_ENV))
    }

    /// Same as [`Settings::load`] with an explicit home value (testable helper).
    pub fn load_with_home(
        explicit: Option<PathBuf>,
        home: Option<OsString>,
    ) -> Result<Self, SettingsError> {
        if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
            info!(
                target: "machine::settings",
                path = %path.display(),
                "Loading settings named by --settings or MACHINE_SETTINGS"
            );
            return Self::load_from_path(path);
        }

        match paths::state_file_from(home, SETTINGS_FILE_NAME) {
            Ok(path) if path.is_file() => Self::load_from_path(path),
            Ok(path) => {
                debug!(
                    target: "machine::settings",
                    path = %path.display(),
                    env = SETTINGS_ENV_KEY,
                    "No settings file; using defaults"
                );
                Ok(Self::default())
            }
            Err(reason) => {
                debug!(
                    target: "machine::settings",
                    reason,
                    "Settings location unresolved; using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, SettingsError> {
        let source = config::File::from(path.clone()).format(config::FileFormat::Toml);
        let document = config::Config::builder()
            .add_source(source)
            .build()
            .map_err(|err| {
                let error = SettingsError::from_read_error(path.clone(), err);
                error!(
                    target: "machine::settings",
                    path = %path.display(),
                    reason = %error,
                    "Failed to read settings file"
                );
                error
            })?;

        let raw: RawSettings = document.try_deserialize().map_err(|err| {
            let error = SettingsError::from_parse_error(path.clone(), err);
            error!(
                target: "machine::settings",
                path = %path.display(),
                reason = %error,
                "Failed to parse settings file"
            );
            error
        })?;

        let settings = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "machine::settings",
                path = %path.display(),
                reason = %err,
                "Failed to validate settings file"
            );
            err
        })?;

        info!(
            target: "machine::settings",
            path = %path.display(),
            region = settings.provider.region.as_deref().unwrap_or(""),
            inventory = settings.provider.inventory.is_some(),
            image_owners = settings.images.owners.len(),
            "Settings file loaded"
        );
        Ok(settings)
    }

    fn from_raw(raw: RawSettings, path: PathBuf) -> Result<Self, SettingsError> {
        let provider = parse_provider_section(raw.provider, &path)?;
        let images = parse_images_section(raw.images, &path)?;

        Ok(Self {
            provider,
            images,
            source_path: Some(path),
        })
    }
}
