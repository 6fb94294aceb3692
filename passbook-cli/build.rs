use std::path::Path;
use std::process::Command;

/// Stamp the binary with the commit it was built from. Packagers building
/// outside a checkout can set PASSBOOK_BUILD_SHA themselves.
fn build_sha(workspace: &Path) -> String {
    if let Ok(sha) = std::env::var("PASSBOOK_BUILD_SHA") {
        let sha = sha.trim();
        if !sha.is_empty() {
            return sha.to_string();
        }
    }

    Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = Path::new(&manifest_dir).join("..");

    println!("cargo:rerun-if-env-changed=PASSBOOK_BUILD_SHA");
    let git = workspace.join(".git");
    if git.is_dir() {
        println!("cargo:rerun-if-changed={}", git.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git.join("index").display());
    }
    println!("cargo:rustc-env=PASSBOOK_BUILD_SHA={}", build_sha(&workspace));
}
