//! Read-only lookup of a profile by region and name.

use super::{Catalogue, Profile};
use crate::lib::errors::MachineError;

/// Return the profile stored at `(region, name)`.
///
/// A missing region and a missing name are reported separately so the
/// operator knows whether the region was ever synced.
pub fn resolve<'a>(
    catalogue: &'a Catalogue,
    region: &str,
    name: &str,
) -> Result<&'a Profile, MachineError> {
    let profiles = catalogue
        .region(region)
        .ok_or_else(|| MachineError::RegionNotFound {
            region: region.to_string(),
        })?;
    profiles
        .get(name)
        .ok_or_else(|| MachineError::ProfileNotFound {
            region: region.to_string(),
            name: name.to_string(),
        })
}
