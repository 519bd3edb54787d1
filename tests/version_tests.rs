use std::process::Command;

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success(), "Command should exit successfully");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = env!("CARGO_PKG_VERSION");
    assert_eq!(stdout.trim(), format!("cellpress {}", version));
    assert_eq!(cellpress_lib::VERSION, version);
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .arg("compile")
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
}

#[test]
fn test_config_prints_defaults_as_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .arg("config")
        .current_dir(dir.path())
        .env("CELLPRESS_HISTORY_CAPACITY", "4")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["history_capacity"], 4);
}
