//! Discover network and image facts and commit them as a named profile.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalogue::{CatalogueGuard, Profile};
use crate::lib::errors::MachineError;
use crate::provider::{ImageFilter, NetworkSelector, Provider, ProviderSession};

/// Parameters of one sync.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub name: String,
    pub network: NetworkSelector,
    pub images: ImageFilter,
    /// Drop key pairs recorded on the profile being replaced.
    pub reset_keys: bool,
}

/// What a sync stored.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub profile: Profile,
    pub replaced: bool,
    pub warnings: Vec<String>,
}

/// Build a fresh profile for `session.region` and `request.name`, store it in
/// place of any previous one, then save.
///
/// Network discovery failing aborts before the catalogue is touched. Image and
/// account lookups are best-effort: failures become warnings and leave the
/// corresponding fields empty.
pub async fn run<P: Provider>(
    provider: &P,
    session: &ProviderSession,
    mut guard: CatalogueGuard<'_>,
    request: SyncRequest,
) -> Result<SyncOutcome, MachineError> {
    let network = provider
        .discover_network(session, &request.network)
        .await
        .map_err(|err| {
            warn!(
                target: "machine::sync",
                region = %session.region,
                network = %request.network,
                reason = %err,
                "Network discovery failed; catalogue left unchanged"
            );
            err
        })?;

    let mut warnings = Vec::new();
    let images = match provider.discover_images(session, &request.images).await {
        Ok(images) => images,
        Err(err) => {
            warn!(
                target: "machine::sync",
                region = %session.region,
                reason = %err,
                "Image discovery failed; storing profile without images"
            );
            warnings.push(format!("image discovery failed: {err}"));
            Vec::new()
        }
    };
    let account_id = match provider.account_id(session).await {
        Ok(account_id) => account_id,
        Err(err) => {
            warnings.push(format!("account lookup failed: {err}"));
            None
        }
    };

    let mut profile = Profile {
        account_id,
        network,
        images,
        ..Profile::new(request.name.as_str(), session.region.as_str())
    };
    if !request.reset_keys {
        if let Some(previous) = guard.catalogue().get(&profile.region, &profile.name) {
            if !previous.key_pairs.is_empty() {
                info!(
                    target: "machine::sync",
                    region = %profile.region,
                    name = %profile.name,
                    key_pairs = previous.key_pairs.len(),
                    "Keeping key pairs of the replaced profile"
                );
                profile.key_pairs = previous.key_pairs.clone();
            }
        }
    }

    let replaced = guard.insert(profile.clone()).is_some();
    guard.commit()?;

    info!(
        target: "machine::sync",
        region = %profile.region,
        name = %profile.name,
        network_id = profile.network.id.as_deref().unwrap_or(""),
        subnets = profile.network.subnets.len(),
        images = profile.images.len(),
        replaced,
        "Synced profile"
    );
    Ok(SyncOutcome {
        profile,
        replaced,
        warnings,
    })
}
