//! CLI entrypoint module structure.
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::json;

use crate::catalogue::{resolve, ProfileStore};
use crate::ops::{self, LaunchParams, SyncRequest};
use crate::provider::Provider;

pub mod args;
pub mod exit;
pub mod session;

pub use args::{
    CreateArgs, GlobalArgs, MachineArgs, MachineCommand, ShowArgs, SyncArgs,
    DEFAULT_INSTANCE_TYPE, DEFAULT_PROFILE_NAME,
};
pub use exit::RuntimeExit;
pub use session::{resolve_region, InvocationContext, RegionSource};

/// Resolve the context and default store, then run `args.command`.
pub async fn run(args: MachineArgs) -> Result<String> {
    let context = InvocationContext::resolve(&args.global)?;
    let store = ProfileStore::open_default()?;
    let provider = context.provider();
    execute(args.command, &context, &provider, &store).await
}

/// Execute one command and return a user-facing JSON payload.
pub async fn execute<P: Provider>(
    command: MachineCommand,
    context: &InvocationContext,
    provider: &P,
    store: &ProfileStore,
) -> Result<String> {
    let payload = match command {
        MachineCommand::Sync(args) => {
            let session = context.session()?;
            let request = SyncRequest {
                network: args.network(),
                name: args.name,
                images: context.settings.images.clone(),
                reset_keys: args.reset_keys,
            };
            let outcome =
                ops::sync::run(provider, &session, store.checkout()?, request).await?;
            json!({
                "status": if outcome.replaced { "replaced" } else { "created" },
                "catalogue": store.path().to_string_lossy(),
                "profile": outcome.profile,
                "warnings": outcome.warnings,
            })
        }
        MachineCommand::Create(args) => {
            let session = context.session()?;
            let catalogue = store.load()?;
            let profile = resolve(&catalogue, &session.region, &args.name)?;
            let params = LaunchParams {
                placement: args.placement(),
                instance_type: args.instance_type,
                count: args.count,
                security_groups: args.groups,
            };
            let result =
                ops::launch::run(provider, &session, profile, &params, &mut rand::rng()).await?;
            json!({
                "status": "launched",
                "profile": result.profile,
                "instance_ids": result.instance_ids,
                "request": result.request,
            })
        }
        MachineCommand::List => {
            let catalogue = store.load()?;
            let regions: BTreeMap<&str, Vec<&str>> = catalogue
                .regions()
                .map(|(region, profiles)| (region, profiles.names().collect()))
                .collect();
            json!({
                "catalogue": store.path().to_string_lossy(),
                "profiles": catalogue.profile_count(),
                "regions": regions,
            })
        }
        MachineCommand::Show(args) => {
            let region = context.region()?;
            let catalogue = store.load()?;
            let profile = resolve(&catalogue, region, &args.name)?;
            serde_json::to_value(profile).context("failed to render profile")?
        }
    };

    Ok(serde_json::to_string_pretty(&payload)?)
}
