//! Integration Test: Session engine stays headless
//!
//! **Policy**: `sudosolve-core` MUST NOT depend on or mention terminal UI
//! crates in code. Surfaces depend on the core, never the other way round.

use std::fs;

use architectural_enforcement::{rust_sources, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_sources_have_no_ui_imports() {
    let mut violations = Vec::new();
    for file in rust_sources("conductor/core/src") {
        for (idx, line) in file.lines.iter().enumerate() {
            if UI_CRATES.iter().any(|krate| line.contains(krate)) {
                violations.push(format!(
                    "{}:{} - {}",
                    file.path.display(),
                    idx + 1,
                    line.trim()
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "UI crate referenced from the session engine:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("conductor/core/Cargo.toml"))
        .expect("core manifest should be readable");
    for krate in UI_CRATES {
        assert!(
            !manifest
                .lines()
                .any(|line| line.trim_start().starts_with(krate)),
            "conductor/core/Cargo.toml depends on {krate}"
        );
    }
}
