use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::SettingsError;
use crate::provider::ImageFilter;

/// Architectures the image catalogue understands.
pub const ALLOWED_ARCHITECTURES: &[&str] = &["i386", "x86_64", "arm64", "x86_64_mac", "arm64_mac"];

#[derive(Debug, Deserialize, Default)]
pub struct RawImagesSection {
    pub owners: Option<Vec<String>>,
    pub name_pattern: Option<String>,
    pub architecture: Option<String>,
}

pub fn parse_images_section(
    raw: Option<RawImagesSection>,
    path: &Path,
) -> Result<ImageFilter, SettingsError> {
    let raw = raw.unwrap_or_default();

    let owners = raw.owners.unwrap_or_default();
    if owners.iter().any(|owner| owner.trim().is_empty()) {
        return Err(SettingsError::InvalidField {
            path: path.to_path_buf(),
            field: "images.owners",
            message: "Owners must be account ids or aliases such as `self`".into(),
        });
    }

    let name_pattern = raw
        .name_pattern
        .map(|pattern| pattern.trim().to_string())
        .filter(|pattern| !pattern.is_empty());

    let architecture = match raw.architecture {
        Some(arch) if ALLOWED_ARCHITECTURES.contains(&arch.as_str()) => Some(arch),
        Some(arch) => {
            return Err(SettingsError::InvalidField {
                path: path.to_path_buf(),
                field: "images.architecture",
                message: format!(
                    "`{arch}` is not one of {}",
                    ALLOWED_ARCHITECTURES.join(", ")
                ),
            });
        }
        None => None,
    };

    Ok(ImageFilter {
        owners,
        name_pattern,
        architecture,
    })
}
