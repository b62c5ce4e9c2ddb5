//! CLI argument definitions.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::provider::{NetworkSelector, Placement, DEFAULT_NETWORK};

/// Profile name used when `--name` is omitted.
pub const DEFAULT_PROFILE_NAME: &str = "default";
/// Instance type used when `--type` is omitted.
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "machine",
    author,
    version,
    about = "Provision cloud instances from locally recorded network and image profiles",
    long_about = None
)]
pub struct MachineArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: MachineCommand,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Provider region (falls back to provider.region in the settings file).
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,
    /// Access key id.
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID")]
    pub key: Option<String>,
    /// Secret access key. Only used together with --key.
    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret: Option<String>,
    /// Session token for temporary credentials.
    #[arg(long, global = true, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Path to the settings file (default ~/.machine/config.toml).
    #[arg(long, global = true, env = "MACHINE_SETTINGS")]
    pub settings: Option<PathBuf>,
    /// Inventory document for the file-backed provider backend.
    #[arg(long, global = true, env = "MACHINE_INVENTORY")]
    pub inventory: Option<PathBuf>,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum MachineCommand {
    /// Discover the network and images of the region and record them as a profile.
    Sync(SyncArgs),
    /// Launch instances from a recorded profile.
    Create(CreateArgs),
    /// List recorded regions and profile names.
    List,
    /// Print one recorded profile.
    Show(ShowArgs),
}

impl MachineCommand {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MachineCommand::Sync(_) => "sync",
            MachineCommand::Create(_) => "create",
            MachineCommand::List => "list",
            MachineCommand::Show(_) => "show",
        }
    }

    /// Profile name the command addresses, if any.
    pub fn profile_name(&self) -> Option<&str> {
        match self {
            MachineCommand::Sync(args) => Some(&args.name),
            MachineCommand::Create(args) => Some(&args.name),
            MachineCommand::Show(args) => Some(&args.name),
            MachineCommand::List => None,
        }
    }
}

/// Arguments for `sync`.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Profile name to record.
    #[arg(long, default_value = DEFAULT_PROFILE_NAME)]
    pub name: String,
    /// Network to discover; `default` selects the region's default network.
    #[arg(long = "vpc-id", default_value = DEFAULT_NETWORK)]
    pub vpc_id: String,
    /// Drop key pairs recorded on the profile being replaced.
    #[arg(long, default_value_t = false)]
    pub reset_keys: bool,
}

impl SyncArgs {
    pub fn network(&self) -> NetworkSelector {
        NetworkSelector::parse(&self.vpc_id)
    }
}

/// Arguments for `create`.
#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Recorded profile to launch from.
    #[arg(long, default_value = DEFAULT_PROFILE_NAME)]
    pub name: String,
    /// Instance type.
    #[arg(long = "type", default_value = DEFAULT_INSTANCE_TYPE)]
    pub instance_type: String,
    /// Number of instances.
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// Place instances in an internal subnet instead of a public one.
    #[arg(long, default_value_t = false)]
    pub private: bool,
    /// Security group id or name from the profile; repeatable.
    #[arg(long = "group", value_name = "ID_OR_NAME")]
    pub groups: Vec<String>,
}

impl CreateArgs {
    pub fn placement(&self) -> Placement {
        Placement::from_private_flag(self.private)
    }
}

/// Arguments for `show`.
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Recorded profile to print.
    #[arg(long, default_value = DEFAULT_PROFILE_NAME)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn create_defaults_match_documented_values() {
        let args = MachineArgs::try_parse_from(["machine", "create"]).expect("parses");

        match args.command {
            MachineCommand::Create(create) => {
                assert_eq!(create.name, "default");
                assert_eq!(create.instance_type, "t2.micro");
                assert_eq!(create.count, 1);
                assert_eq!(create.placement(), Placement::Public);
                assert!(create.groups.is_empty());
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let args = MachineArgs::try_parse_from([
            "machine",
            "sync",
            "--name",
            "web",
            "--vpc-id",
            "vpc-123",
            "--region",
            "eu-west-1",
        ])
        .expect("parses");

        assert_eq!(args.global.region.as_deref(), Some("eu-west-1"));
        match args.command {
            MachineCommand::Sync(sync) => {
                assert_eq!(sync.name, "web");
                assert_eq!(sync.network(), NetworkSelector::Id("vpc-123".into()));
                assert!(!sync.reset_keys);
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn groups_repeat() {
        let args = MachineArgs::try_parse_from([
            "machine", "create", "--private", "--group", "web", "--group", "sg-1",
        ])
        .expect("parses");

        match args.command {
            MachineCommand::Create(create) => {
                assert_eq!(create.groups, vec!["web", "sg-1"]);
                assert_eq!(create.placement(), Placement::Private);
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_count_is_rejected_by_parser() {
        assert!(MachineArgs::try_parse_from(["machine", "create", "--count", "-1"]).is_err());
    }
}
