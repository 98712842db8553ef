// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue-store directory resolution within a rig (§4.2).

use std::path::{Path, PathBuf};

/// `<rig>/.beads`, following a `redirect` file if present. `redirect`
/// holds a single line: a path relative to `rig_root`.
pub fn rig_beads(rig_root: &Path) -> PathBuf {
    let beads = rig_root.join(".beads");
    let redirect_file = beads.join("redirect");
    match std::fs::read_to_string(&redirect_file) {
        Ok(contents) => {
            let target = contents.trim();
            if target.is_empty() {
                beads
            } else {
                rig_root.join(target)
            }
        }
        Err(_) => beads,
    }
}

/// `<rig>/mayor/rig/.beads` if that directory exists (tracked-beads
/// topology, where the mayor's own git checkout carries the canonical
/// store), else falls back to [`rig_beads`].
pub fn canonical_beads(rig_root: &Path) -> PathBuf {
    let tracked = rig_root.join("mayor").join("rig").join(".beads");
    if tracked.is_dir() {
        tracked
    } else {
        rig_beads(rig_root)
    }
}

/// The relative path a worktree's `.beads/redirect` file should contain
/// to point at `canonical`, given the worktree's own root.
pub fn expected_redirect(worktree_root: &Path, canonical: &Path) -> PathBuf {
    relative_path(&worktree_root.join(".beads"), canonical)
}

/// `lexical` relative path from `from` to `to`, assuming both are
/// absolute and normalized (no `.`/`..` components to resolve against
/// the filesystem — this is purely lexical, which is all a `redirect`
/// file needs).
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from_comps: Vec<_> = from.components().collect();
    let to_comps: Vec<_> = to.components().collect();

    let common = from_comps.iter().zip(to_comps.iter()).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in common..from_comps.len() {
        result.push("..");
    }
    for comp in &to_comps[common..] {
        result.push(comp.as_os_str());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rig_beads_defaults_to_dot_beads() {
        let dir = tempdir().unwrap();
        assert_eq!(rig_beads(dir.path()), dir.path().join(".beads"));
    }

    #[test]
    fn rig_beads_follows_redirect() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".beads")).unwrap();
        std::fs::write(dir.path().join(".beads/redirect"), "../mayor/rig/.beads\n").unwrap();
        assert_eq!(rig_beads(dir.path()), dir.path().join("../mayor/rig/.beads"));
    }

    #[test]
    fn canonical_prefers_tracked_beads_topology() {
        let dir = tempdir().unwrap();
        let rig_root = dir.path().join("gastown");
        let tracked = rig_root.join("mayor/rig/.beads");
        std::fs::create_dir_all(&tracked).unwrap();

        assert_eq!(canonical_beads(&rig_root), tracked);
    }

    #[test]
    fn canonical_falls_back_without_tracked_topology() {
        let dir = tempdir().unwrap();
        let rig_root = dir.path().join("gastown");
        std::fs::create_dir_all(&rig_root).unwrap();

        assert_eq!(canonical_beads(&rig_root), rig_beads(&rig_root));
    }

    #[test]
    fn expected_redirect_computes_relative_path() {
        let worktree = PathBuf::from("/town/gastown/crew/alice");
        let canonical = PathBuf::from("/town/mayor/rig/gastown/.beads");
        let expected = PathBuf::from("../../../../mayor/rig/gastown/.beads");
        assert_eq!(expected_redirect(&worktree, &canonical), expected);
    }
}
