//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions in the TUI and the session engine MUST NOT
//! block the runtime.
//! **Required**: `tokio::fs`, `tokio::time::sleep`, async `reqwest`.
//!
//! Blocking calls are acceptable in non-async functions (config loading and
//! logging setup run before the event loop) and in test code.

use architectural_enforcement::rust_sources;

/// Calls that block the executor thread
const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::thread::sleep", "Thread sleep"),
    ("thread::sleep(", "Thread sleep"),
    ("std::net::", "Blocking network I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::process::Command", "Blocking process I/O"),
];

fn find_violations(dir: &str) -> Vec<String> {
    let mut violations = Vec::new();
    for file in rust_sources(dir) {
        for (start, end) in file.async_fn_bodies() {
            for idx in start..=end {
                let line = &file.lines[idx];
                for (pattern, what) in FORBIDDEN {
                    if line.contains(pattern) {
                        violations.push(format!(
                            "{}:{} - {}: {}",
                            file.path.display(),
                            idx + 1,
                            what,
                            line.trim()
                        ));
                    }
                }
            }
        }
    }
    violations
}

#[test]
fn test_no_blocking_io_in_core() {
    let violations = find_violations("conductor/core/src");
    assert!(
        violations.is_empty(),
        "Blocking calls in async code:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn test_no_blocking_io_in_tui() {
    let violations = find_violations("tui/src");
    assert!(
        violations.is_empty(),
        "Blocking calls in async code:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn test_scanner_sees_sources() {
    assert!(!rust_sources("conductor/core/src").is_empty());
    assert!(!rust_sources("tui/src").is_empty());
}
