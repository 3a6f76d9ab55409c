use std::path::Path;
use std::process::{Command, Output};

use url::Url;

/// Convert a catalog directory to a `file://` source URL.
pub fn catalog_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}

/// Run the CLI with a custom HOME so the default catalog stays isolated.
pub fn run_cli(args: &[&str], home: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reposift"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("REPOSIFT_SOURCE");
    cmd.env_remove("REPOSIFT_TOKEN");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run a search and parse the printed response document.
pub fn search_json(args: &[&str], home: &Path) -> serde_json::Value {
    let stdout = run_cli_success(args, home);
    serde_json::from_str(stdout.trim()).expect("search output is not JSON")
}

/// Ids of the repositories in a search response, in order.
pub fn result_ids(response: &serde_json::Value) -> Vec<String> {
    response["repos"]
        .as_array()
        .expect("missing repos array")
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}
