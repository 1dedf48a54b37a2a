use std::process::{Command, Output};

fn git(args: &[&str]) -> Option<Output> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
}

fn main() {
    // Re-run if git HEAD or tags change
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-changed=.git/packed-refs");

    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let hash = git(&["rev-parse", "--short", "HEAD"])
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    // Release tags report the plain version; other builds carry the commit.
    let version = match (on_tag, hash.is_empty()) {
        (true, _) => pkg_version,
        (false, true) => format!("{pkg_version}-dev"),
        (false, false) => format!("{pkg_version}-dev+{hash}"),
    };

    println!("cargo:rustc-env=FIXGEN_VERSION={version}");
}
