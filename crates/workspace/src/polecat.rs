// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polecat workspace layout (§4.2): transparently handles both the "new"
//! `polecats/<name>/<rig>/` layout (a polecat's workspace nested under
//! its own name, to support one polecat working across several rigs)
//! and the "old" flat `polecats/<name>/` layout (one rig per polecat,
//! pre-dating multi-rig support).

use std::path::{Path, PathBuf};

/// Resolve a polecat's workspace directory under `polecats_root`,
/// preferring the new nested layout when both could apply.
pub fn polecat_workspace(polecats_root: &Path, name: &str, rig: &str) -> PathBuf {
    let nested = polecats_root.join(name).join(rig);
    if nested.is_dir() {
        return nested;
    }
    let flat = polecats_root.join(name);
    if flat.is_dir() {
        return flat;
    }
    // Neither exists yet — new layout is the one to create.
    nested
}

/// Whether `dir` (a polecat workspace path) is in the new nested layout,
/// i.e. its parent directory is the polecat's own name directory rather
/// than `polecats_root` itself.
pub fn is_nested_layout(polecats_root: &Path, dir: &Path) -> bool {
    dir.parent().map(|p| p != polecats_root).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prefers_nested_layout_when_present() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("fenix/gastown");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(polecat_workspace(dir.path(), "fenix", "gastown"), nested);
    }

    #[test]
    fn falls_back_to_flat_layout() {
        let dir = tempdir().unwrap();
        let flat = dir.path().join("fenix");
        std::fs::create_dir_all(&flat).unwrap();

        assert_eq!(polecat_workspace(dir.path(), "fenix", "gastown"), flat);
    }

    #[test]
    fn defaults_to_nested_layout_for_new_workspace() {
        let dir = tempdir().unwrap();
        let expected = dir.path().join("fenix/gastown");
        assert_eq!(polecat_workspace(dir.path(), "fenix", "gastown"), expected);
    }

    #[test]
    fn nested_layout_detection() {
        let root = Path::new("/town/gastown/polecats");
        assert!(is_nested_layout(root, &root.join("fenix/gastown")));
        assert!(!is_nested_layout(root, &root.join("fenix")));
    }
}
