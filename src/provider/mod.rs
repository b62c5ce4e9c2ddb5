//! Cloud provider collaborator: session, request shapes, and the backend trait.
//!
//! The catalogue core only needs discovery results and a launch call. Backends
//! implement [`Provider`]; the session carrying region and credentials is
//! built once at startup and passed to every call.

use std::fmt;

use serde::Serialize;

use crate::catalogue::{ImageProfile, NetworkProfile};
use crate::lib::errors::ProviderError;

pub mod inventory;

pub use inventory::InventoryProvider;

/// Literal network selector meaning "the region's default network".
pub const DEFAULT_NETWORK: &str = "default";

/// Static credentials. Only used when both key id and secret are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Build credentials from optional parts, ignoring blank key material.
    pub fn from_parts(
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
    ) -> Option<Self> {
        let access_key_id = access_key_id.filter(|value| !value.is_empty())?;
        let secret_access_key = secret_access_key.filter(|value| !value.is_empty())?;
        Some(Self {
            access_key_id,
            secret_access_key,
            session_token: session_token.filter(|value| !value.is_empty()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Explicit provider context for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub region: String,
    pub credentials: Option<Credentials>,
}

impl ProviderSession {
    pub fn new(region: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            region: region.into(),
            credentials,
        }
    }
}

/// Which network to discover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSelector {
    Default,
    Id(String),
}

impl NetworkSelector {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == DEFAULT_NETWORK {
            Self::Default
        } else {
            Self::Id(trimmed.to_string())
        }
    }
}

impl fmt::Display for NetworkSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(DEFAULT_NETWORK),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// Image discovery filters. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageFilter {
    pub owners: Vec<String>,
    pub name_pattern: Option<String>,
    pub architecture: Option<String>,
}

/// Whether instances go to a public or an internal subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Public,
    Private,
}

impl Placement {
    pub const fn from_private_flag(private: bool) -> Self {
        if private {
            Self::Private
        } else {
            Self::Public
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Placement::Public => "public",
            Placement::Private => "private",
        }
    }

    /// True when a subnet with the given `public` flag serves this placement.
    /// Subnets with an unknown flag serve neither.
    pub fn accepts(&self, public: Option<bool>) -> bool {
        match self {
            Placement::Public => public == Some(true),
            Placement::Private => public == Some(false),
        }
    }
}

/// Everything a backend needs to start instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchRequest {
    pub region: String,
    pub network_id: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub image_id: Option<String>,
    pub instance_type: String,
    pub count: u32,
    pub placement: Placement,
    /// Idempotency token so a retried request does not start extra instances.
    pub client_token: String,
}

/// Backend for discovery and launch calls.
#[allow(async_fn_in_trait)]
pub trait Provider {
    async fn discover_network(
        &self,
        session: &ProviderSession,
        selector: &NetworkSelector,
    ) -> Result<NetworkProfile, ProviderError>;

    async fn discover_images(
        &self,
        session: &ProviderSession,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageProfile>, ProviderError>;

    async fn account_id(&self, session: &ProviderSession) -> Result<Option<String>, ProviderError>;

    async fn launch_instances(
        &self,
        session: &ProviderSession,
        request: &LaunchRequest,
    ) -> Result<Vec<String>, ProviderError>;
}
