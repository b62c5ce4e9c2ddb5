use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_machine");

pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// `machine` with `home` as its home directory and no ambient provider variables.
pub fn machine(home: &Path) -> Command {
    let mut command = Command::new(BINARY_PATH);
    command
        .env("HOME", home)
        .env("RUST_LOG", "warn")
        .env_remove("AWS_REGION")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("AWS_SESSION_TOKEN")
        .env_remove("MACHINE_SETTINGS")
        .env_remove("MACHINE_INVENTORY");
    command
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: status={:?} stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}
