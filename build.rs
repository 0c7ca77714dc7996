use std::process::Command;

/// Exposes the checkout's short commit as `GIT_HASH`. The server reports
/// `<crate version>-<GIT_HASH>` as its version in the MCP `initialize` reply
/// unless `MCP_SERVER_VERSION` overrides it.
fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        // Source tarballs have no repository
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
