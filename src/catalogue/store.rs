//! On-disk persistence for the profile catalogue.
//!
//! The catalogue lives in a single JSON file under `~/.machine/`. Loads create
//! the file when it is missing; saves replace it whole through a rename.
//! Separate processes are not coordinated: concurrent saves are
//! last-writer-wins.

use std::{
    env,
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, error, info};

use super::{Catalogue, Profile};
use crate::lib::{
    errors::MachineError,
    fs::{ensure_private_dir, read_or_create_private, write_private_atomic, DirStatus},
    paths,
};

/// File name of the catalogue inside the state directory.
pub const PROFILE_FILE_NAME: &str = "aws-profile.json";

/// Resolve `$HOME/.machine/aws-profile.json`, creating the state directory
/// (mode 0700) when it does not exist yet.
pub fn resolve_profile_path() -> Result<PathBuf, MachineError> {
    resolve_profile_path_from(env::var_os(paths::HOME_ENV))
}

/// Resolve the catalogue path from an explicit home value (testable helper).
pub fn resolve_profile_path_from(home: Option<OsString>) -> Result<PathBuf, MachineError> {
    let path = paths::state_file_from(home, PROFILE_FILE_NAME).map_err(|message| {
        MachineError::ConfigPath {
            message: message.to_string(),
            source: None,
        }
    })?;
    prepare_parent(&path)?;
    Ok(path)
}

fn prepare_parent(path: &Path) -> Result<(), MachineError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    match ensure_private_dir(parent) {
        Ok(DirStatus::Created) => {
            info!(
                target: "machine::store",
                dir = %parent.display(),
                "Created state directory"
            );
            Ok(())
        }
        Ok(DirStatus::Existing) => Ok(()),
        Err(source) => Err(MachineError::config_path(
            format!("cannot prepare {}", parent.display()),
            source,
        )),
    }
}

/// Loads and saves the whole catalogue at a fixed path.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store rooted at the default dotfile location.
    pub fn open_default() -> Result<Self, MachineError> {
        Ok(Self {
            path: resolve_profile_path()?,
        })
    }

    /// Store at an explicit path. The parent directory must already exist.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the catalogue. A missing, zero-byte, or whitespace-only file is an
    /// empty catalogue; anything else must parse.
    pub fn load(&self) -> Result<Catalogue, MachineError> {
        let bytes = read_or_create_private(&self.path).map_err(|source| self.io_error(source))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(
                target: "machine::store",
                path = %self.path.display(),
                "Catalogue file is empty"
            );
            return Ok(Catalogue::new());
        }

        let decoded: Option<Catalogue> = serde_json::from_slice(&bytes).map_err(|source| {
            let error = MachineError::CatalogueDecode {
                path: self.path.clone(),
                source,
            };
            error!(
                target: "machine::store",
                path = %self.path.display(),
                reason = %error,
                "Failed to decode catalogue"
            );
            error
        })?;
        let mut catalogue = decoded.unwrap_or_default();
        catalogue.normalize_keys();

        debug!(
            target: "machine::store",
            path = %self.path.display(),
            profiles = catalogue.profile_count(),
            "Loaded catalogue"
        );
        Ok(catalogue)
    }

    /// Replace the file with `catalogue`.
    pub fn save(&self, catalogue: &Catalogue) -> Result<(), MachineError> {
        let mut encoded = serde_json::to_vec_pretty(catalogue).map_err(|source| {
            MachineError::CatalogueWrite {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, source),
            }
        })?;
        encoded.push(b'\n');

        write_private_atomic(&self.path, &encoded).map_err(|source| {
            let error = MachineError::CatalogueWrite {
                path: self.path.clone(),
                source,
            };
            error!(
                target: "machine::store",
                path = %self.path.display(),
                reason = %error,
                "Failed to save catalogue"
            );
            error
        })?;

        info!(
            target: "machine::store",
            path = %self.path.display(),
            profiles = catalogue.profile_count(),
            "Saved catalogue"
        );
        Ok(())
    }

    /// Load the catalogue into a guard that saves pending changes.
    pub fn checkout(&self) -> Result<CatalogueGuard<'_>, MachineError> {
        Ok(CatalogueGuard {
            store: self,
            catalogue: self.load()?,
            dirty: false,
        })
    }

    fn io_error(&self, source: io::Error) -> MachineError {
        MachineError::CatalogueIo {
            path: self.path.clone(),
            source,
        }
    }
}

/// A loaded catalogue bound to its store.
///
/// `commit` saves and reports failures. A guard dropped with uncommitted
/// changes makes one last save attempt and logs the outcome.
#[derive(Debug)]
pub struct CatalogueGuard<'a> {
    store: &'a ProfileStore,
    catalogue: Catalogue,
    dirty: bool,
}

impl CatalogueGuard<'_> {
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Insert-or-replace a profile and mark the catalogue for saving.
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.dirty = true;
        self.catalogue.insert(profile)
    }

    /// Save pending changes. Clean guards do not touch the file.
    pub fn commit(mut self) -> Result<Catalogue, MachineError> {
        if self.dirty {
            self.dirty = false;
            self.store.save(&self.catalogue)?;
        }
        Ok(std::mem::take(&mut self.catalogue))
    }
}

impl Drop for CatalogueGuard<'_> {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        match self.store.save(&self.catalogue) {
            Ok(()) => info!(
                target: "machine::store",
                path = %self.store.path.display(),
                "Saved uncommitted catalogue changes on exit"
            ),
            Err(err) => error!(
                target: "machine::store",
                path = %self.store.path.display(),
                reason = %err,
                "Uncommitted catalogue changes were lost"
            ),
        }
    }
}
