// Build script: expose the git-describe version as PROMISIFY_VERSION,
// falling back to CARGO_PKG_VERSION when git is unavailable

use std::process::Command;

fn main() {
    let version = git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=PROMISIFY_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

/// Version from `git describe`, e.g. "v0.2.0", "v0.2.0-3-gabc123" or "abc123-dirty"
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();

    match described.strip_prefix('v') {
        // Tagged: keep only the release part of "0.2.0-3-gabc123"
        Some(tagged) => Some(tagged.split('-').next().unwrap_or(tagged).to_string()),
        // Untagged commit: append the short hash to the package version
        None => Some(format!("{}-{}", env!("CARGO_PKG_VERSION"), described)),
    }
}
