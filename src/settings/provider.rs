use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lib::errors::SettingsError;

/// Provider defaults applied when flags and environment leave them unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSection {
    pub region: Option<String>,
    /// Inventory document for the file-backed backend, already absolute.
    pub inventory: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawProviderSection {
    pub region: Option<String>,
    pub inventory: Option<PathBuf>,
}

pub fn parse_provider_section(
    raw: Option<RawProviderSection>,
    path: &Path,
) -> Result<ProviderSection, SettingsError> {
    let raw = raw.unwrap_or_default();

    let region = match raw.region {
        Some(region) => {
            let trimmed = region.trim();
            if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
                return Err(SettingsError::InvalidField {
                    path: path.to_path_buf(),
                    field: "provider.region",
                    message: "Use a region code such as `us-east-1`".into(),
                });
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    let inventory = match raw.inventory {
        Some(inventory) if inventory.as_os_str().is_empty() => {
            return Err(SettingsError::InvalidField {
                path: path.to_path_buf(),
                field: "provider.inventory",
                message: "Inventory path must not be empty".into(),
            });
        }
        Some(inventory) if inventory.is_relative() => Some(
            path.parent()
                .map(|dir| dir.join(&inventory))
                .unwrap_or(inventory),
        ),
        other => other,
    };

    Ok(ProviderSection { region, inventory })
}
