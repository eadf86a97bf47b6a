//! Layering guardrails for the manifest.
//!
//! Test-only crates (`proptest`, `tempfile`) may only appear under `[dev-dependencies]`.
//! This test scans the root `Cargo.toml` and fails if either appears in `[dependencies]`.

const TEST_ONLY_CRATES: &[&str] = &["proptest", "tempfile"];

#[test]
fn test_only_crates_stay_in_dev_dependencies() {
    let manifest = include_str!("../Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        let name = line_no_comment.split(['=', ' ']).next().unwrap_or("");
        if TEST_ONLY_CRATES.contains(&name) {
            panic!("`{}` must not appear in [dependencies]; use [dev-dependencies] instead", name);
        }
    }
}

#[test]
fn test_manifest_declares_binary() {
    let manifest = include_str!("../Cargo.toml");
    assert!(manifest.contains("[[bin]]\nname = \"testsel\""));
}
