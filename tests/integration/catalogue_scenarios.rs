use std::cell::RefCell;

use machine_profiles::{
    catalogue::{
        resolve, ImageProfile, NetworkProfile, Profile, ProfileStore, SubnetRecord,
        PROFILE_FILE_NAME,
    },
    cli::{execute, CreateArgs, GlobalArgs, InvocationContext, MachineCommand, SyncArgs},
    lib::errors::{MachineError, ProviderError},
    provider::{ImageFilter, LaunchRequest, NetworkSelector, Provider, ProviderSession},
    settings::Settings,
};
use tempfile::tempdir;

#[derive(Default)]
struct FakeProvider {
    launches: RefCell<Vec<LaunchRequest>>,
}

impl Provider for FakeProvider {
    async fn discover_network(
        &self,
        _session: &ProviderSession,
        _selector: &NetworkSelector,
    ) -> Result<NetworkProfile, ProviderError> {
        Ok(NetworkProfile {
            cidr: Some("10.0.0.0/16".into()),
            id: Some("vpc-scenario".into()),
            subnets: vec![SubnetRecord {
                availability_zone: Some("us-east-1a".into()),
                cidr: Some("10.0.1.0/24".into()),
                default_for_az: Some(true),
                id: Some("subnet-scenario".into()),
                public: Some(true),
            }],
            security_groups: Vec::new(),
        })
    }

    async fn discover_images(
        &self,
        _session: &ProviderSession,
        _filter: &ImageFilter,
    ) -> Result<Vec<ImageProfile>, ProviderError> {
        Ok(Vec::new())
    }

    async fn account_id(&self, _session: &ProviderSession) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    async fn launch_instances(
        &self,
        _session: &ProviderSession,
        request: &LaunchRequest,
    ) -> Result<Vec<String>, ProviderError> {
        self.launches.borrow_mut().push(request.clone());
        Ok((0..request.count).map(|n| format!("i-scenario{n}")).collect())
    }
}

fn context() -> InvocationContext {
    let global = GlobalArgs {
        region: Some("us-east-1".into()),
        ..GlobalArgs::default()
    };
    InvocationContext::from_parts(&global, Settings::default())
}

fn create(name: &str, count: u32) -> MachineCommand {
    MachineCommand::Create(CreateArgs {
        name: name.into(),
        instance_type: "t2.micro".into(),
        count,
        private: false,
        groups: Vec::new(),
    })
}

#[tokio::test]
async fn sync_into_empty_store_records_one_profile() {
    let temp = tempdir().expect("can create temp directory");
    let store = ProfileStore::at(temp.path().join(PROFILE_FILE_NAME));
    let provider = FakeProvider::default();

    execute(
        MachineCommand::Sync(SyncArgs {
            name: "default".into(),
            vpc_id: "default".into(),
            reset_keys: false,
        }),
        &context(),
        &provider,
        &store,
    )
    .await
    .expect("sync succeeds");

    let catalogue = store.load().expect("catalogue loads");
    let regions: Vec<_> = catalogue.regions().map(|(region, _)| region).collect();
    assert_eq!(regions, vec!["us-east-1"]);
    assert_eq!(catalogue.profile_count(), 1);
    let profile = resolve(&catalogue, "us-east-1", "default").expect("profile stored");
    assert_eq!(profile.network.cidr.as_deref(), Some("10.0.0.0/16"));

    store.save(&catalogue).expect("save again");
    assert_eq!(store.load().expect("reload"), catalogue);
}

#[tokio::test]
async fn create_forwards_count_and_rejects_unknown_names() {
    let temp = tempdir().expect("can create temp directory");
    let store = ProfileStore::at(temp.path().join(PROFILE_FILE_NAME));
    let provider = FakeProvider::default();
    let mut seeded = machine_profiles::catalogue::Catalogue::new();
    seeded.insert(Profile {
        network: provider
            .discover_network(
                &ProviderSession::new("us-east-1", None),
                &NetworkSelector::Default,
            )
            .await
            .expect("fake discovery"),
        ..Profile::new("default", "us-east-1")
    });
    store.save(&seeded).expect("seed");

    let payload = execute(create("default", 2), &context(), &provider, &store)
        .await
        .expect("create succeeds");
    let value: serde_json::Value = serde_json::from_str(&payload).expect("json payload");
    assert_eq!(value["instance_ids"].as_array().map(Vec::len), Some(2));
    assert_eq!(provider.launches.borrow().len(), 1);
    assert_eq!(provider.launches.borrow()[0].count, 2);

    let error = execute(create("missing", 1), &context(), &provider, &store)
        .await
        .expect_err("unknown profile");
    match error.downcast_ref::<MachineError>() {
        Some(MachineError::ProfileNotFound { region, name }) => {
            assert_eq!(region, "us-east-1");
            assert_eq!(name, "missing");
        }
        other => panic!("Unexpected error: {other:?}"),
    }
    assert_eq!(provider.launches.borrow().len(), 1, "no second launch");
}
