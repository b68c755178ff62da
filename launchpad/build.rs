//! Build script for launchpad
//!
//! Embeds the commit and build time reported by `--version` and `GET /version`.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use chrono::{SecondsFormat, Utc};

fn main() {
    // Release tarballs have no .git, packagers pass the commit explicitly
    println!("cargo:rerun-if-env-changed=LAUNCHPAD_GIT_HASH");
    let git_hash = env::var("LAUNCHPAD_GIT_HASH")
        .ok()
        .filter(|hash| !hash.trim().is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string());

    let build_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    println!("cargo:rustc-env=LAUNCHPAD_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=LAUNCHPAD_BUILD_TIME={}", build_time);

    // The repository root is the workspace, one level above this package
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        let head = PathBuf::from(manifest_dir).join("../.git/HEAD");
        if head.exists() {
            println!("cargo:rerun-if-changed={}", head.display());
        }
    }
}

fn git_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
