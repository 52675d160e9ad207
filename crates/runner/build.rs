use std::process::Command;

/// Trimmed stdout of a command, if it ran and succeeded.
fn capture(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    // v0.1.0, v0.1.0-rc.1 or v0.1.0-3-gabc1234 after a tag
    let version = capture("git", &["describe", "--tags", "--always", "--dirty"])
        .map(|v| v.trim_start_matches('v').to_string())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    let hash = capture("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".into());
    let date = capture("date", &["-u", "+%Y-%m-%d"])
        .unwrap_or_else(|| "unknown".into());
    let target = std::env::var("TARGET").unwrap_or_default();

    for (key, value) in [
        ("GIT_VERSION", version),
        ("GIT_HASH", hash),
        ("BUILD_DATE", date),
        ("BUILD_TARGET", target),
    ] {
        println!("cargo:rustc-env={key}={value}");
    }
}
