//! Layering guardrails to keep `goldrun_core` free of IO.
//!
//! The core crate holds the pure rules (normalization, artifact codec, ordering invariant) shared by
//! the harness and its tooling. This test scans `crates/goldrun_core/Cargo.toml` and fails if a
//! process, async, filesystem or randomness crate appears in its `[dependencies]`.

const FORBIDDEN: &[&str] = &["tokio", "rand", "walkdir", "tempfile", "goldrun"];

/// Crate names listed in the `[dependencies]` table of a manifest.
fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

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
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn core_does_not_depend_on_io_crates() {
    let manifest = include_str!("../crates/goldrun_core/Cargo.toml");
    let names = dependency_names(manifest);
    assert!(!names.is_empty(), "expected to find goldrun_core's [dependencies]");

    for name in &names {
        assert!(
            !FORBIDDEN.contains(&name.as_str()),
            "`{name}` must not appear in goldrun_core's [dependencies]; keep IO in the goldrun crate"
        );
    }
}

#[test]
fn dependency_scan_stops_at_next_table() {
    let manifest = "[dependencies]\nregex = \"1\"\n\n[dev-dependencies]\ntokio = \"1\"\n";
    assert_eq!(dependency_names(manifest), ["regex"]);
}
