use std::fs;

use tempfile::tempdir;

use crate::common::{fixture, machine, stdout_json};

#[test]
fn sync_then_create_through_the_binary() {
    let home = tempdir().expect("can create temp home");
    let inventory = fixture("tests/fixtures/inventory.json");

    let synced = machine(home.path())
        .args(["sync", "--region", "us-east-1", "--inventory"])
        .arg(&inventory)
        .output()
        .expect("sync runs");
    let synced = stdout_json(&synced);
    assert_eq!(synced["status"], "created");
    assert_eq!(synced["profile"]["vpc"]["id"], "vpc-0a1b2c3d");
    assert_eq!(synced["profile"]["account_id"], "123456789012");

    let catalogue_path = home.path().join(".machine/aws-profile.json");
    let document: serde_json::Value =
        serde_json::from_slice(&fs::read(&catalogue_path).expect("catalogue written"))
            .expect("catalogue is JSON");
    assert_eq!(
        document["us-east-1"]["default"]["vpc"]["subnet"][0]["default_for_az"],
        true
    );

    let created = machine(home.path())
        .args([
            "create", "--region", "us-east-1", "--count", "2", "--private", "--group", "web",
            "--inventory",
        ])
        .arg(&inventory)
        .output()
        .expect("create runs");
    let created = stdout_json(&created);
    assert_eq!(created["instance_ids"].as_array().map(Vec::len), Some(2));
    assert_eq!(created["request"]["subnet_id"], "subnet-private-b");
    assert_eq!(created["request"]["security_group_ids"][0], "sg-0web");
}

#[test]
fn list_and_show_read_the_catalogue() {
    let home = tempdir().expect("can create temp home");
    let inventory = fixture("tests/fixtures/inventory.json");
    let synced = machine(home.path())
        .args(["sync", "--name", "staging", "--vpc-id", "vpc-0staging"])
        .env("AWS_REGION", "us-east-1")
        .env("MACHINE_INVENTORY", &inventory)
        .output()
        .expect("sync runs");
    stdout_json(&synced);

    let listed = stdout_json(&machine(home.path()).arg("list").output().expect("list runs"));
    assert_eq!(listed["regions"]["us-east-1"][0], "staging");

    let shown = machine(home.path())
        .args(["show", "--name", "staging", "--region", "us-east-1"])
        .output()
        .expect("show runs");
    let shown = stdout_json(&shown);
    assert_eq!(shown["vpc"]["cidr"], "10.20.0.0/16");
}

#[test]
fn missing_profile_exits_nonzero_with_guidance() {
    let home = tempdir().expect("can create temp home");

    let output = machine(home.path())
        .args(["create", "--region", "us-east-1"])
        .output()
        .expect("create runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: "), "stderr: {stderr}");
    assert!(stderr.contains("machine sync"), "stderr: {stderr}");
}

#[test]
fn missing_region_is_reported() {
    let home = tempdir().expect("can create temp home");

    let output = machine(home.path()).arg("sync").output().expect("sync runs");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No region configured"), "stderr: {stderr}");
}

#[test]
fn settings_file_supplies_region_and_inventory() {
    let home = tempdir().expect("can create temp home");

    let output = machine(home.path())
        .arg("sync")
        .arg("--settings")
        .arg(fixture("tests/fixtures/settings_valid.toml"))
        .output()
        .expect("sync runs");
    let synced = stdout_json(&output);

    let images = synced["profile"]["ami"].as_array().expect("ami list");
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["id"], "ami-0base64");
}

#[test]
fn malformed_catalogue_is_left_untouched() {
    let home = tempdir().expect("can create temp home");
    let dir = home.path().join(".machine");
    fs::create_dir(&dir).expect("can create state dir");
    let path = dir.join("aws-profile.json");
    fs::write(&path, b"{\"us-east-1\": ").expect("can write catalogue");

    let output = machine(home.path())
        .args(["list"])
        .output()
        .expect("list runs");

    assert!(!output.status.success());
    assert_eq!(fs::read(&path).expect("read"), b"{\"us-east-1\": ");
}
