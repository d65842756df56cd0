//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The session engine never depends on a UI framework
//! - Async code never blocks the runtime (no `std::fs`, no thread sleeps)
//!
//! The helpers here do a line-based scan of the workspace sources. They are
//! deliberately simple: comments are stripped, `#[cfg(test)]` modules are
//! skipped, and async function bodies are found by brace counting.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace (two levels above this crate)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// A source file loaded for scanning
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// Lines up to (not including) the first `#[cfg(test)]`, comments removed
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Load and pre-process a file
    pub fn load(root: &Path, path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let lines = content
            .lines()
            .take_while(|line| line.trim() != "#[cfg(test)]")
            .map(|line| strip_comment(line).to_string())
            .collect();
        Some(Self {
            path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
            lines,
        })
    }

    /// Line ranges (0-based, inclusive) of every `async fn` body
    pub fn async_fn_bodies(&self) -> Vec<(usize, usize)> {
        let mut bodies = Vec::new();
        let mut idx = 0;
        while idx < self.lines.len() {
            if self.lines[idx].contains("async fn ") {
                if let Some(end) = self.body_end(idx) {
                    bodies.push((idx, end));
                    idx = end;
                }
            }
            idx += 1;
        }
        bodies
    }

    /// Line where the brace block opened at or after `start` closes
    fn body_end(&self, start: usize) -> Option<usize> {
        let mut depth = 0i32;
        let mut opened = false;
        for (offset, line) in self.lines[start..].iter().enumerate() {
            for ch in line.chars() {
                match ch {
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' => depth -= 1,
                    // A trait method declaration has no body
                    ';' if !opened => return None,
                    _ => {}
                }
            }
            if opened && depth <= 0 {
                return Some(start + offset);
            }
        }
        None
    }
}

/// Everything before a `//` comment marker
pub fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| SourceFile::load(&root, e.path()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("x.rs"),
            lines: text.lines().map(|l| strip_comment(l).to_string()).collect(),
        }
    }

    #[test]
    fn test_finds_async_bodies() {
        let file = source(
            "fn a() {}\nasync fn b() {\n    if x {\n    }\n}\nfn c() {}\n",
        );
        assert_eq!(file.async_fn_bodies(), vec![(1, 4)]);
    }

    #[test]
    fn test_trait_declaration_has_no_body() {
        let file = source("trait T {\n    async fn b(&self) -> bool;\n}\n");
        assert!(file.async_fn_bodies().is_empty());
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("let a = 1; // note"), "let a = 1; ");
        assert_eq!(strip_comment("//! doc"), "");
    }
}
