//! Start instances from a resolved profile.

use rand::{seq::IndexedRandom, Rng};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::catalogue::Profile;
use crate::lib::errors::MachineError;
use crate::provider::{LaunchRequest, Placement, Provider, ProviderSession};

/// Caller-supplied launch parameters.
#[derive(Debug, Clone)]
pub struct LaunchParams {
    pub instance_type: String,
    pub count: u32,
    pub placement: Placement,
    /// Security group ids or names recorded on the profile.
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchResult {
    pub profile: String,
    pub request: LaunchRequest,
    pub instance_ids: Vec<String>,
}

/// Validate `params` against `profile` and build the provider request.
///
/// Fails with `InvalidParameter` before any provider call when the count is
/// zero, the profile has no network id, no subnet serves the placement, or a
/// requested security group is not part of the profile.
pub fn build_request<R: Rng + ?Sized>(
    session: &ProviderSession,
    profile: &Profile,
    params: &LaunchParams,
    rng: &mut R,
) -> Result<LaunchRequest, MachineError> {
    if params.count < 1 {
        return Err(MachineError::invalid_parameter(
            "count",
            "at least one instance must be requested",
        ));
    }
    let instance_type = params.instance_type.trim();
    if instance_type.is_empty() {
        return Err(MachineError::invalid_parameter(
            "type",
            "instance type must not be empty",
        ));
    }

    let network_id = profile.network.id.clone().ok_or_else(|| {
        MachineError::invalid_parameter(
            "name",
            format!(
                "profile `{}` has no network id; run `machine sync --name {}` again",
                profile.name, profile.name
            ),
        )
    })?;

    let candidates: Vec<&str> = profile
        .network
        .subnets
        .iter()
        .filter(|subnet| params.placement.accepts(subnet.public))
        .filter_map(|subnet| subnet.id.as_deref())
        .collect();
    let subnet_id = candidates.choose(rng).copied().ok_or_else(|| {
        MachineError::invalid_parameter(
            "private",
            format!(
                "profile `{}` has no {} subnet",
                profile.name,
                params.placement.as_str()
            ),
        )
    })?;

    let security_group_ids = params
        .security_groups
        .iter()
        .map(|wanted| {
            profile
                .network
                .security_groups
                .iter()
                .find(|group| group.matches(wanted))
                .and_then(|group| group.id.clone())
                .ok_or_else(|| {
                    MachineError::invalid_parameter(
                        "group",
                        format!(
                            "security group `{wanted}` is not recorded on profile `{}`",
                            profile.name
                        ),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LaunchRequest {
        region: session.region.clone(),
        network_id,
        subnet_id: subnet_id.to_string(),
        security_group_ids,
        image_id: profile.images.iter().find_map(|image| image.id.clone()),
        instance_type: instance_type.to_string(),
        count: params.count,
        placement: params.placement,
        client_token: Uuid::new_v4().to_string(),
    })
}

/// Validate, then hand the request to the provider. Never touches the catalogue.
pub async fn run<P: Provider, R: Rng + ?Sized>(
    provider: &P,
    session: &ProviderSession,
    profile: &Profile,
    params: &LaunchParams,
    rng: &mut R,
) -> Result<LaunchResult, MachineError> {
    let request = build_request(session, profile, params, rng)?;
    let instance_ids = provider.launch_instances(session, &request).await?;

    info!(
        target: "machine::launch",
        region = %request.region,
        profile = %profile.name,
        subnet_id = %request.subnet_id,
        placement = request.placement.as_str(),
        launched = instance_ids.len(),
        "Launched instances"
    );
    Ok(LaunchResult {
        profile: profile.name.clone(),
        request,
        instance_ids,
    })
}
