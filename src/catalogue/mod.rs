//! Profile catalogue data model: region → profile name → profile.
//!
//! Every discovered scalar is an `Option` so that "not discovered yet" stays
//! distinguishable from "discovered as empty". Collections decode `null` as
//! empty because earlier releases of the tool wrote unset lists that way.

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

pub mod resolver;
pub mod store;

pub use resolver::resolve;
pub use store::{
    resolve_profile_path, resolve_profile_path_from, CatalogueGuard, ProfileStore, PROFILE_FILE_NAME,
};

/// One subnet of a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub availability_zone: Option<String>,
    pub cidr: Option<String>,
    #[serde(alias = "default_for_Az")]
    pub default_for_az: Option<bool>,
    pub id: Option<String>,
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRecord {
    pub id: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
}

impl SecurityGroupRecord {
    /// True when `needle` equals this group's id or name.
    pub fn matches(&self, needle: &str) -> bool {
        self.id.as_deref() == Some(needle) || self.name.as_deref() == Some(needle)
    }
}

/// Network facts recorded for a profile. Sequences keep discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub cidr: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "subnet", default, deserialize_with = "null_as_empty")]
    pub subnets: Vec<SubnetRecord>,
    #[serde(rename = "security_group", default, deserialize_with = "null_as_empty")]
    pub security_groups: Vec<SecurityGroupRecord>,
}

/// A machine image usable for launches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageProfile {
    pub arch: Option<String>,
    pub description: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairRecord {
    pub digest: Option<String>,
    pub name: Option<String>,
}

/// A named, region-scoped bundle of discovered facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub account_id: Option<String>,
    #[serde(rename = "vpc", default, deserialize_with = "null_as_default")]
    pub network: NetworkProfile,
    #[serde(rename = "key_pair", default, deserialize_with = "null_as_empty")]
    pub key_pairs: Vec<KeyPairRecord>,
    #[serde(rename = "ami", default, deserialize_with = "null_as_empty")]
    pub images: Vec<ImageProfile>,
}

impl Profile {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            ..Self::default()
        }
    }
}

/// Profiles of a single region keyed by profile name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionCatalogue {
    profiles: BTreeMap<String, Profile>,
}

impl RegionCatalogue {
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'de> Deserialize<'de> for RegionCatalogue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, Option<Profile>>>::deserialize(deserializer)?;
        let profiles = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, profile)| profile.map(|profile| (name, profile)))
            .collect();
        Ok(Self { profiles })
    }
}

/// The whole catalogue keyed by region identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    regions: BTreeMap<String, RegionCatalogue>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self, region: &str) -> Option<&RegionCatalogue> {
        self.regions.get(region)
    }

    pub fn get(&self, region: &str, name: &str) -> Option<&Profile> {
        self.region(region).and_then(|profiles| profiles.get(name))
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &RegionCatalogue)> {
        self.regions
            .iter()
            .map(|(region, profiles)| (region.as_str(), profiles))
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of profiles across every region.
    pub fn profile_count(&self) -> usize {
        self.regions.values().map(RegionCatalogue::len).sum()
    }

    /// Insert `profile` under its own `(region, name)`, replacing any previous
    /// profile wholesale. Returns the replaced profile.
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.regions
            .entry(profile.region.clone())
            .or_default()
            .profiles
            .insert(profile.name.clone(), profile)
    }

    /// Rewrite every profile's `region` and `name` to the keys it is stored
    /// under. Returns how many profiles had to be corrected.
    pub fn normalize_keys(&mut self) -> usize {
        let mut corrected = 0;
        for (region, profiles) in &mut self.regions {
            for (name, profile) in &mut profiles.profiles {
                if profile.region != *region || profile.name != *name {
                    warn!(
                        target: "machine::catalogue",
                        region = %region,
                        name = %name,
                        stored_region = %profile.region,
                        stored_name = %profile.name,
                        "Profile fields disagree with their catalogue keys; using the keys"
                    );
                    profile.region.clone_from(region);
                    profile.name.clone_from(name);
                    corrected += 1;
                }
            }
        }
        corrected
    }
}

impl<'a> IntoIterator for &'a RegionCatalogue {
    type Item = (&'a String, &'a Profile);
    type IntoIter = btree_map::Iter<'a, String, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
