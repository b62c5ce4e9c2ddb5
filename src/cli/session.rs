//! Invocation context: settings, region, credentials and backend selection.
use std::path::PathBuf;

use tracing::debug;

use crate::lib::errors::{MachineError, SettingsError};
use crate::provider::{Credentials, InventoryProvider, ProviderSession};
use crate::settings::Settings;

use super::args::GlobalArgs;

/// Where the region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// `--region` or `AWS_REGION`.
    Flag,
    Settings,
}

/// Everything resolved from flags, environment and the settings file.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub region: Option<(String, RegionSource)>,
    pub credentials: Option<Credentials>,
    pub inventory: Option<PathBuf>,
    pub settings: Settings,
}

impl InvocationContext {
    /// Load settings and combine them with the global flags.
    pub fn resolve(global: &GlobalArgs) -> Result<Self, SettingsError> {
        let settings = Settings::load(global.settings.clone())?;
        Ok(Self::from_parts(global, settings))
    }

    /// Combine already-loaded settings with the global flags (testable helper).
    pub fn from_parts(global: &GlobalArgs, settings: Settings) -> Self {
        let region = resolve_region(global.region.as_deref(), &settings);
        let credentials = Credentials::from_parts(
            global.key.clone(),
            global.secret.clone(),
            global.token.clone(),
        );
        let inventory = global
            .inventory
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| settings.provider.inventory.clone());

        debug!(
            target: "machine::cli",
            region = region.as_ref().map(|(region, _)| region.as_str()).unwrap_or(""),
            region_source = ?region.as_ref().map(|(_, source)| *source),
            static_credentials = credentials.is_some(),
            inventory = ?inventory,
            "Resolved invocation context"
        );
        Self {
            region,
            credentials,
            inventory,
            settings,
        }
    }

    pub fn region(&self) -> Result<&str, MachineError> {
        self.region
            .as_ref()
            .map(|(region, _)| region.as_str())
            .ok_or(MachineError::RegionUnset)
    }

    /// Provider session for the resolved region.
    pub fn session(&self) -> Result<ProviderSession, MachineError> {
        Ok(ProviderSession::new(self.region()?, self.credentials.clone()))
    }

    /// File-backed backend, or an unconfigured one when no inventory is known.
    pub fn provider(&self) -> InventoryProvider {
        match &self.inventory {
            Some(path) => InventoryProvider::from_path(path.clone()),
            None => InventoryProvider::unconfigured(),
        }
    }
}

/// Region precedence: flag or environment, then settings. Blank values are ignored.
pub fn resolve_region(flag: Option<&str>, settings: &Settings) -> Option<(String, RegionSource)> {
    let flag = flag
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(|region| (region.to_string(), RegionSource::Flag));
    flag.or_else(|| {
        settings
            .provider
            .region
            .clone()
            .map(|region| (region, RegionSource::Settings))
    })
}
