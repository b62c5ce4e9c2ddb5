//! File-backed provider backend.
//!
//! Answers discovery from a JSON inventory document and acknowledges launches
//! with generated instance ids, so the tool runs without network access.

use std::{collections::BTreeMap, path::PathBuf};

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;
use wildmatch::WildMatch;

use super::{ImageFilter, LaunchRequest, NetworkSelector, Provider, ProviderSession};
use crate::catalogue::{ImageProfile, NetworkProfile, SecurityGroupRecord, SubnetRecord};
use crate::lib::errors::ProviderError;

#[derive(Debug, Default, Deserialize)]
struct Inventory {
    account_id: Option<String>,
    #[serde(default)]
    regions: BTreeMap<String, RegionInventory>,
}

#[derive(Debug, Default, Deserialize)]
struct RegionInventory {
    #[serde(default)]
    networks: Vec<InventoryNetwork>,
    #[serde(default)]
    images: Vec<InventoryImage>,
}

#[derive(Debug, Deserialize)]
struct InventoryNetwork {
    id: String,
    cidr: Option<String>,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    subnets: Vec<SubnetRecord>,
    #[serde(default)]
    security_groups: Vec<SecurityGroupRecord>,
}

#[derive(Debug, Deserialize)]
struct InventoryImage {
    owner: Option<String>,
    #[serde(flatten)]
    image: ImageProfile,
}

impl InventoryImage {
    fn matches(&self, filter: &ImageFilter) -> bool {
        let owner_ok = filter.owners.is_empty()
            || self
                .owner
                .as_ref()
                .is_some_and(|owner| filter.owners.contains(owner));
        let name_ok = filter.name_pattern.as_deref().map_or(true, |pattern| {
            self.image
                .name
                .as_deref()
                .is_some_and(|name| WildMatch::new(pattern).matches(name))
        });
        let arch_ok = filter
            .architecture
            .as_ref()
            .map_or(true, |arch| self.image.arch.as_ref() == Some(arch));
        owner_ok && name_ok && arch_ok
    }
}

/// Provider answering from an inventory file, read on first use.
#[derive(Debug, Default)]
pub struct InventoryProvider {
    source: Option<PathBuf>,
    inventory: OnceCell<Inventory>,
}

impl InventoryProvider {
    /// Backend reading `path` lazily.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            inventory: OnceCell::new(),
        }
    }

    /// Backend whose every call fails with [`ProviderError::Unconfigured`].
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    async fn inventory(&self) -> Result<&Inventory, ProviderError> {
        let path = self.source.as_ref().ok_or(ProviderError::Unconfigured)?;
        self.inventory
            .get_or_try_init(|| async {
                let bytes =
                    tokio::fs::read(path)
                        .await
                        .map_err(|source| ProviderError::InventoryRead {
                            path: path.clone(),
                            source,
                        })?;
                let inventory: Inventory = serde_json::from_slice(&bytes).map_err(|source| {
                    ProviderError::InventoryParse {
                        path: path.clone(),
                        source,
                    }
                })?;
                debug!(
                    target: "machine::provider",
                    path = %path.display(),
                    regions = inventory.regions.len(),
                    "Loaded provider inventory"
                );
                Ok::<_, ProviderError>(inventory)
            })
            .await
    }

    async fn region(&self, session: &ProviderSession) -> Result<&RegionInventory, ProviderError> {
        self.inventory()
            .await?
            .regions
            .get(&session.region)
            .ok_or_else(|| ProviderError::UnknownRegion {
                region: session.region.clone(),
            })
    }
}

impl Provider for InventoryProvider {
    async fn discover_network(
        &self,
        session: &ProviderSession,
        selector: &NetworkSelector,
    ) -> Result<NetworkProfile, ProviderError> {
        let region = self.region(session).await?;
        let network = region
            .networks
            .iter()
            .find(|network| match selector {
                NetworkSelector::Default => network.is_default,
                NetworkSelector::Id(id) => network.id == *id,
            })
            .ok_or_else(|| ProviderError::NetworkNotFound {
                region: session.region.clone(),
                selector: selector.to_string(),
            })?;

        Ok(NetworkProfile {
            cidr: network.cidr.clone(),
            id: Some(network.id.clone()),
            subnets: network.subnets.clone(),
            security_groups: network.security_groups.clone(),
        })
    }

    async fn discover_images(
        &self,
        session: &ProviderSession,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageProfile>, ProviderError> {
        let region = self.region(session).await?;
        Ok(region
            .images
            .iter()
            .filter(|image| image.matches(filter))
            .map(|image| image.image.clone())
            .collect())
    }

    async fn account_id(&self, _session: &ProviderSession) -> Result<Option<String>, ProviderError> {
        Ok(self.inventory().await?.account_id.clone())
    }

    async fn launch_instances(
        &self,
        session: &ProviderSession,
        request: &LaunchRequest,
    ) -> Result<Vec<String>, ProviderError> {
        let region = self.region(session).await?;
        let network = region
            .networks
            .iter()
            .find(|network| network.id == request.network_id)
            .ok_or_else(|| ProviderError::Request {
                message: format!(
                    "network {} does not exist in {}",
                    request.network_id, session.region
                ),
            })?;
        if !network
            .subnets
            .iter()
            .any(|subnet| subnet.id.as_deref() == Some(request.subnet_id.as_str()))
        {
            return Err(ProviderError::Request {
                message: format!(
                    "subnet {} does not belong to network {}",
                    request.subnet_id, request.network_id
                ),
            });
        }

        let instance_ids: Vec<String> = (0..request.count)
            .map(|_| {
                let id = Uuid::new_v4().simple().to_string();
                format!("i-{}", &id[..17])
            })
            .collect();
        info!(
            target: "machine::provider",
            region = %session.region,
            subnet_id = %request.subnet_id,
            instance_type = %request.instance_type,
            count = request.count,
            client_token = %request.client_token,
            instance_ids = ?instance_ids,
            "Inventory backend accepted launch request"
        );
        Ok(instance_ids)
    }
}
