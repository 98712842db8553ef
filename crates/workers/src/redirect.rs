// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared issue-store redirect setup (§4.2, §4.9 "Redirect topology" /
//! "Stale data alongside redirect"), used by every worker manager's Add
//! and by the health-check Fix for drifted redirects.

use gastown_workspace::expected_redirect;
use std::path::Path;

use crate::error::WorkersError;

/// Glob-ish filenames that must not coexist with a `redirect` file
/// (§4.9 "Stale data alongside redirect").
const STALE_DATA_NAMES: &[&str] = &[
    "issues.jsonl",
    "interactions.jsonl",
    "metadata.json",
    "sync-state.json",
    "last-touched",
    ".local_version",
    "bd.sock",
];

const STALE_DATA_PREFIXES: &[&str] = &["daemon."];
const STALE_DATA_GLOB_SUFFIXES: &[&str] = &[".db"];
const STALE_DATA_INFIX: &str = ".db-";

const REQUIRED_GITIGNORE_PATTERNS: &[&str] = &[".beads/", "mail/", ".claude/settings.local.json"];

/// Write `<workspace>/.beads/redirect` pointing at `canonical`,
/// removing any stale runtime-data files first (§4.9: fixing a drifted
/// redirect "handles removing conflicting local data").
pub fn write_redirect(workspace: &Path, canonical: &Path) -> Result<(), WorkersError> {
    let beads = workspace.join(".beads");
    std::fs::create_dir_all(&beads).map_err(gastown_core::CoreError::Io)?;
    remove_stale_data(&beads)?;

    let target = expected_redirect(workspace, canonical);
    let contents = format!("{}\n", normalize_redirect_text(&target.display().to_string()));
    std::fs::write(beads.join("redirect"), contents).map_err(gastown_core::CoreError::Io)?;
    Ok(())
}

/// Normalize a redirect's on-disk text for comparison (§4.9: "textually
/// equal after normalization: trim whitespace, POSIX slashes, strip
/// trailing slash").
pub fn normalize_redirect_text(raw: &str) -> String {
    raw.trim().replace('\\', "/").trim_end_matches('/').to_string()
}

/// Whether `dir` (which has a `redirect` file) contains any forbidden
/// stale runtime-data entries.
pub fn has_stale_data(dir: &Path) -> Result<bool, WorkersError> {
    Ok(!stale_entries(dir)?.is_empty())
}

fn stale_entries(dir: &Path) -> Result<Vec<std::path::PathBuf>, WorkersError> {
    let mut found = Vec::new();
    if !dir.is_dir() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(dir).map_err(gastown_core::CoreError::Io)? {
        let entry = entry.map_err(gastown_core::CoreError::Io)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == "mq" || is_stale_name(name) {
            found.push(entry.path());
        }
    }
    Ok(found)
}

fn is_stale_name(name: &str) -> bool {
    STALE_DATA_NAMES.contains(&name)
        || STALE_DATA_PREFIXES.iter().any(|p| name.starts_with(p))
        || STALE_DATA_GLOB_SUFFIXES.iter().any(|s| name.ends_with(s))
        || name.contains(STALE_DATA_INFIX)
}

/// Remove stale runtime-data files from a `.beads/` directory,
/// preserving `redirect` and `.gitignore`. Refuses (no-op, not an
/// error) on a directory without a `redirect` file — callers that need
/// the "refuse" semantics of §4.9 should check `has_redirect` first.
pub fn remove_stale_data(beads: &Path) -> Result<(), WorkersError> {
    for path in stale_entries(beads)? {
        if path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(gastown_core::CoreError::Io)?;
        } else {
            std::fs::remove_file(&path).map_err(gastown_core::CoreError::Io)?;
        }
    }
    Ok(())
}

pub fn has_redirect(beads: &Path) -> bool {
    beads.join("redirect").is_file()
}

/// Append any of [`REQUIRED_GITIGNORE_PATTERNS`] missing from
/// `<workspace>/.gitignore`, creating the file if absent.
pub fn ensure_gitignore_patterns(workspace: &Path) -> Result<(), WorkersError> {
    let path = workspace.join(".gitignore");
    let existing = std::fs::read_to_string(&path).unwrap_or_default();
    let present: Vec<&str> = existing.lines().map(str::trim).collect();

    let missing: Vec<&str> =
        REQUIRED_GITIGNORE_PATTERNS.iter().filter(|p| !present.contains(p)).copied().collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    for pattern in missing {
        updated.push_str(pattern);
        updated.push('\n');
    }
    std::fs::write(&path, updated).map_err(gastown_core::CoreError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_redirect_creates_relative_pointer() {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("gastown/crew/alice");
        std::fs::create_dir_all(&workspace).unwrap();
        let canonical = dir.path().join("gastown/.beads");
        std::fs::create_dir_all(&canonical).unwrap();

        write_redirect(&workspace, &canonical).unwrap();
        let contents = std::fs::read_to_string(workspace.join(".beads/redirect")).unwrap();
        assert_eq!(contents, "../../.beads\n");
    }

    #[test]
    fn remove_stale_data_clears_forbidden_entries_but_keeps_redirect() {
        let dir = tempdir().unwrap();
        let beads = dir.path().join(".beads");
        std::fs::create_dir_all(&beads).unwrap();
        std::fs::write(beads.join("redirect"), "../../.beads\n").unwrap();
        std::fs::write(beads.join("issues.jsonl"), "{}").unwrap();
        std::fs::write(beads.join("metadata.json"), "{}").unwrap();
        std::fs::create_dir_all(beads.join("mq")).unwrap();

        assert!(has_stale_data(&beads).unwrap());
        remove_stale_data(&beads).unwrap();
        assert!(!has_stale_data(&beads).unwrap());
        assert!(beads.join("redirect").is_file());
    }

    #[test]
    fn ensure_gitignore_patterns_is_idempotent() {
        let dir = tempdir().unwrap();
        ensure_gitignore_patterns(dir.path()).unwrap();
        let first = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        ensure_gitignore_patterns(dir.path()).unwrap();
        let second = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(first, second);
        assert!(first.contains(".beads/"));
    }

    #[test]
    fn normalize_redirect_text_strips_whitespace_and_trailing_slash() {
        assert_eq!(normalize_redirect_text(" ../../.beads/ \n"), "../../.beads");
    }
}
