// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Representative checks (§4.9 "Representative checks (contracts, not
//! an exhaustive list)"). Each check is independent; the runner decides
//! ordering and whether `Fix` runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gastown_issues::IssueStore;
use gastown_workers::redirect::{has_redirect, has_stale_data, normalize_redirect_text, remove_stale_data, write_redirect};
use gastown_workspace::{expected_redirect, WorkspaceResolver};

use crate::check::{Category, Check, CheckResult, Context};
use crate::error::HealthError;
use crate::gitstatus::classify;

/// Every worktree directory under a rig that is expected to carry a
/// `.beads/redirect` once tracked-beads topology is in play.
fn redirect_worktrees(rig_root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(entries) = std::fs::read_dir(rig_root.join("crew")) {
        dirs.extend(entries.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_dir()));
    }
    if let Ok(entries) = std::fs::read_dir(rig_root.join("polecats")) {
        for entry in entries.filter_map(|e| e.ok()) {
            let name_dir = entry.path();
            if !name_dir.is_dir() {
                continue;
            }
            if let Ok(nested) = std::fs::read_dir(&name_dir) {
                dirs.extend(nested.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_dir()));
            }
        }
    }
    let refinery = rig_root.join("refinery").join("rig");
    if refinery.is_dir() {
        dirs.push(refinery);
    }
    dirs
}

/// Redirect topology (§4.9 "Redirect topology").
pub struct RedirectTopologyCheck;

impl Check for RedirectTopologyCheck {
    fn name(&self) -> &str {
        "redirect-topology"
    }

    fn category(&self) -> Category {
        Category::Topology
    }

    fn description(&self) -> &str {
        "every crew/polecat/refinery worktree's .beads/redirect points at its rig's canonical issue store"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let resolver = WorkspaceResolver::from_town_root(&ctx.town_root);
        let mut drifted = Vec::new();

        for rig_root in ctx.rig_roots() {
            let Some(rig) = rig_root.file_name().and_then(|n| n.to_str()) else { continue };
            let canonical = resolver.canonical_beads(rig);
            if !canonical.is_dir() {
                continue;
            }
            for worktree in redirect_worktrees(&rig_root) {
                let redirect_path = worktree.join(".beads").join("redirect");
                let expected = expected_redirect(&worktree, &canonical);
                match std::fs::read_to_string(&redirect_path) {
                    Ok(actual) if normalize_redirect_text(&actual) == normalize_redirect_text(&expected.display().to_string()) => {}
                    Ok(actual) => drifted.push(format!(
                        "{}: redirect is {:?}, expected {:?}",
                        worktree.display(),
                        actual.trim(),
                        expected.display()
                    )),
                    Err(_) => drifted.push(format!("missing redirect: {}", worktree.display())),
                }
            }
        }

        if drifted.is_empty() {
            Ok(CheckResult::ok("all redirects point at their canonical issue store"))
        } else {
            let count = drifted.len();
            Ok(CheckResult::warning(format!("{count} worktree(s) have a missing or drifted redirect"))
                .with_detail(drifted)
                .with_remediation_hint("run with --fix to rewrite .beads/redirect"))
        }
    }

    fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
        let resolver = WorkspaceResolver::from_town_root(&ctx.town_root);
        let run = (|| -> Result<(), HealthError> {
            for rig_root in ctx.rig_roots() {
                let Some(rig) = rig_root.file_name().and_then(|n| n.to_str()) else { continue };
                let canonical = resolver.canonical_beads(rig);
                if !canonical.is_dir() {
                    continue;
                }
                for worktree in redirect_worktrees(&rig_root) {
                    let redirect_path = worktree.join(".beads").join("redirect");
                    let expected = expected_redirect(&worktree, &canonical);
                    let matches = std::fs::read_to_string(&redirect_path)
                        .map(|actual| normalize_redirect_text(&actual) == normalize_redirect_text(&expected.display().to_string()))
                        .unwrap_or(false);
                    if !matches {
                        write_redirect(&worktree, &canonical)?;
                    }
                }
            }
            Ok(())
        })();
        Some(run)
    }
}

/// Stale data alongside redirect (§4.9 "Stale data alongside redirect").
pub struct StaleDataCheck;

impl Check for StaleDataCheck {
    fn name(&self) -> &str {
        "stale-data-alongside-redirect"
    }

    fn category(&self) -> Category {
        Category::Data
    }

    fn description(&self) -> &str {
        "no runtime-data files sit alongside a .beads/redirect"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let mut offenders = Vec::new();
        for rig_root in ctx.rig_roots() {
            for worktree in redirect_worktrees(&rig_root) {
                let beads = worktree.join(".beads");
                if has_redirect(&beads) && has_stale_data(&beads)? {
                    offenders.push(beads.display().to_string());
                }
            }
        }
        if offenders.is_empty() {
            Ok(CheckResult::ok("no stale runtime-data alongside any redirect"))
        } else {
            Ok(CheckResult::warning(format!("{} .beads/ director{} have stale runtime data", offenders.len(), if offenders.len() == 1 { "y" } else { "ies" }))
                .with_detail(offenders)
                .with_remediation_hint("run with --fix to remove stale files, preserving redirect and .gitignore"))
        }
    }

    fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
        let run = (|| -> Result<(), HealthError> {
            for rig_root in ctx.rig_roots() {
                for worktree in redirect_worktrees(&rig_root) {
                    let beads = worktree.join(".beads");
                    if has_redirect(&beads) {
                        remove_stale_data(&beads)?;
                    }
                }
            }
            Ok(())
        })();
        Some(run)
    }
}

/// Runtime settings placement (§4.9 "Runtime settings placement"):
/// settings files live at the role's parent directory, not inside its
/// source worktree.
pub struct RuntimeSettingsPlacementCheck;

impl RuntimeSettingsPlacementCheck {
    /// `.claude/` directories nested one level too deep, inside a role's
    /// source worktree rather than beside it (e.g.
    /// `<rig>/witness/rig/.claude/` instead of `<rig>/witness/.claude/`).
    fn misplaced(rig_root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for role_dir in ["witness", "refinery"] {
            let misplaced = rig_root.join(role_dir).join("rig").join(".claude");
            if misplaced.is_dir() {
                found.push(misplaced);
            }
        }
        found
    }
}

impl Check for RuntimeSettingsPlacementCheck {
    fn name(&self) -> &str {
        "runtime-settings-placement"
    }

    fn category(&self) -> Category {
        Category::Runtime
    }

    fn description(&self) -> &str {
        "agent settings files live beside the role's worktree, not inside the source repo"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let mut offenders = Vec::new();
        for rig_root in ctx.rig_roots() {
            offenders.extend(Self::misplaced(&rig_root));
        }
        if offenders.is_empty() {
            return Ok(CheckResult::ok("no misplaced settings directories found"));
        }

        let mut detail = Vec::new();
        for path in &offenders {
            let status = classify(&ctx.town_root, path);
            detail.push(format!("{}: {:?}", path.display(), status));
        }
        Ok(CheckResult::warning(format!("{} misplaced settings director(y/ies) found", offenders.len()))
            .with_detail(detail)
            .with_remediation_hint(
                "restart the affected agents rather than force-killing sessions; a running doctor fixing its own config would deadlock",
            ))
    }

    fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
        let run = (|| -> Result<(), HealthError> {
            for rig_root in ctx.rig_roots() {
                for path in Self::misplaced(&rig_root) {
                    if classify(&ctx.town_root, &path).safe_to_delete() {
                        let _ = std::fs::remove_dir_all(&path);
                    } else {
                        tracing::warn!(path = %path.display(), "skipping misplaced settings dir with local modifications");
                    }
                }
            }
            Ok(())
        })();
        Some(run)
    }
}

fn git_config_get(repo: &Path, key: &str) -> Option<String> {
    let output = std::process::Command::new("git").current_dir(repo).args(["config", "--get", key]).output().ok()?;
    output.status.success().then(|| String::from_utf8_lossy(&output.stdout).trim().to_string()).filter(|s| !s.is_empty())
}

fn git_config_set(repo: &Path, key: &str, value: &str) -> Result<(), HealthError> {
    let status = std::process::Command::new("git")
        .current_dir(repo)
        .args(["config", key, value])
        .status()
        .map_err(gastown_core::CoreError::Io)?;
    if !status.success() {
        return Err(HealthError::Core(gastown_core::CoreError::external_tool("git", status.code(), "config set failed")));
    }
    Ok(())
}

pub const EXPECTED_REFSPEC: &str = "+refs/heads/*:refs/remotes/origin/*";

/// Bare-repo refspec (§4.9 "Bare-repo refspec").
pub struct BareRepoRefspecCheck;

impl Check for BareRepoRefspecCheck {
    fn name(&self) -> &str {
        "bare-repo-refspec"
    }

    fn category(&self) -> Category {
        Category::Topology
    }

    fn description(&self) -> &str {
        "a shared bare repo's remote.origin.fetch matches the expected refspec"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let mut wrong = Vec::new();
        for rig_root in ctx.rig_roots() {
            let bare = rig_root.join(".repo.git");
            if !bare.is_dir() {
                continue;
            }
            match git_config_get(&bare, "remote.origin.fetch") {
                Some(v) if v == EXPECTED_REFSPEC => {}
                other => wrong.push(format!("{}: remote.origin.fetch = {:?}", bare.display(), other)),
            }
        }
        if wrong.is_empty() {
            Ok(CheckResult::ok("every bare repo's fetch refspec is correct"))
        } else {
            Ok(CheckResult::error(format!("{} bare repo(s) have an incorrect fetch refspec", wrong.len()))
                .with_detail(wrong)
                .with_remediation_hint("run with --fix to set remote.origin.fetch"))
        }
    }

    fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
        let run = (|| -> Result<(), HealthError> {
            for rig_root in ctx.rig_roots() {
                let bare = rig_root.join(".repo.git");
                if bare.is_dir() {
                    git_config_set(&bare, "remote.origin.fetch", EXPECTED_REFSPEC)?;
                }
            }
            Ok(())
        })();
        Some(run)
    }
}

/// Worktree paths under `rig_root` whose `.git` file points into
/// `bare`'s `worktrees/` directory (i.e. they were created as worktrees
/// of that bare repo).
fn references_bare(worktree: &Path, bare: &Path) -> bool {
    let git_file = worktree.join(".git");
    if !git_file.is_file() {
        return false;
    }
    let Ok(contents) = std::fs::read_to_string(&git_file) else { return false };
    let Some(gitdir) = contents.trim().strip_prefix("gitdir:") else { return false };
    Path::new(gitdir.trim()).starts_with(bare.join("worktrees")) || gitdir.contains(".repo.git")
}

fn clone_bare(url: &str, dest: &Path) -> Result<(), HealthError> {
    let status = std::process::Command::new("git")
        .args(["clone", "--bare", url, &dest.display().to_string()])
        .status()
        .map_err(gastown_core::CoreError::Io)?;
    if !status.success() {
        return Err(HealthError::Core(gastown_core::CoreError::external_tool(
            "git",
            status.code(),
            "bare clone failed",
        )));
    }
    Ok(())
}

fn git_fetch(bare: &Path) -> Result<(), HealthError> {
    let status = std::process::Command::new("git")
        .current_dir(bare)
        .args(["fetch", "origin"])
        .status()
        .map_err(gastown_core::CoreError::Io)?;
    if !status.success() {
        return Err(HealthError::Core(gastown_core::CoreError::external_tool("git", status.code(), "fetch failed")));
    }
    Ok(())
}

/// Write back `.repo.git/worktrees/<name>/gitdir` and `HEAD` (and the
/// worktree's own `.git` file) so git recognizes a worktree whose bare
/// repo was just recreated (§4.9 "Bare-repo existence").
fn reattach_worktree(bare: &Path, worktree: &Path, default_branch: &str) -> Result<(), HealthError> {
    let name = worktree.file_name().and_then(|n| n.to_str()).unwrap_or("worktree");
    let admin_dir = bare.join("worktrees").join(name);
    std::fs::create_dir_all(&admin_dir).map_err(gastown_core::CoreError::Io)?;

    let worktree_git_path = worktree.join(".git");
    std::fs::write(admin_dir.join("gitdir"), format!("{}\n", worktree_git_path.display())).map_err(gastown_core::CoreError::Io)?;
    std::fs::write(admin_dir.join("HEAD"), format!("ref: refs/heads/{default_branch}\n")).map_err(gastown_core::CoreError::Io)?;
    std::fs::write(admin_dir.join("commondir"), "../..\n").map_err(gastown_core::CoreError::Io)?;
    std::fs::write(&worktree_git_path, format!("gitdir: {}\n", admin_dir.display())).map_err(gastown_core::CoreError::Io)?;
    Ok(())
}

/// Bare-repo existence (§4.9 "Bare-repo existence"): if worktrees
/// reference a shared `.repo.git/` that has disappeared, recreate it
/// from the rig's configured `git_url` and reattach every broken
/// worktree. No automated fix is attempted when `config.json` itself
/// can't be read — recreating the bare repo needs the URL it carries.
pub struct BareRepoExistenceCheck;

impl Check for BareRepoExistenceCheck {
    fn name(&self) -> &str {
        "bare-repo-existence"
    }

    fn category(&self) -> Category {
        Category::Topology
    }

    fn description(&self) -> &str {
        "a rig's shared bare .repo.git exists whenever a worktree references it"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let mut missing = Vec::new();
        for rig_root in ctx.rig_roots() {
            let bare = rig_root.join(".repo.git");
            if bare.is_dir() {
                continue;
            }
            for worktree in redirect_worktrees(&rig_root) {
                if references_bare(&worktree, &bare) {
                    missing.push(format!("{}: references missing bare repo {}", worktree.display(), bare.display()));
                }
            }
        }
        if missing.is_empty() {
            Ok(CheckResult::ok("every worktree's bare repo is present"))
        } else {
            Ok(CheckResult::error(format!("{} worktree(s) reference a missing bare repo", missing.len()))
                .with_detail(missing)
                .with_remediation_hint("run with --fix to re-clone the bare repo and reattach worktrees"))
        }
    }

    fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
        let run = (|| -> Result<(), HealthError> {
            for rig_root in ctx.rig_roots() {
                let bare = rig_root.join(".repo.git");
                if bare.is_dir() {
                    continue;
                }
                let broken: Vec<PathBuf> =
                    redirect_worktrees(&rig_root).into_iter().filter(|w| references_bare(w, &bare)).collect();
                if broken.is_empty() {
                    continue;
                }

                let config: Option<gastown_core::config::RigConfig> =
                    gastown_store::read_json(&rig_root.join("config.json"))
                        .map_err(|e| HealthError::Core(gastown_core::CoreError::invalid(e.to_string())))?;
                let Some(config) = config else {
                    tracing::warn!(rig = %rig_root.display(), "cannot recreate bare repo without config.json");
                    continue;
                };

                clone_bare(&config.git_url, &bare)?;
                git_config_set(&bare, "remote.origin.fetch", EXPECTED_REFSPEC)?;
                git_fetch(&bare)?;
                for worktree in &broken {
                    reattach_worktree(&bare, worktree, &config.default_branch)?;
                }
            }
            Ok(())
        })();
        Some(run)
    }
}

/// Default branch existence (§4.9 "Default branch"). Fatal: there is no
/// automated fix, since recreating a missing remote-tracking ref
/// requires a fetch against a URL this check has no business guessing.
pub struct DefaultBranchCheck {
    pub default_branch: String,
}

impl Check for DefaultBranchCheck {
    fn name(&self) -> &str {
        "default-branch-existence"
    }

    fn category(&self) -> Category {
        Category::Topology
    }

    fn description(&self) -> &str {
        "the configured default branch exists as a remote-tracking ref in the bare repo"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let mut missing = Vec::new();
        for rig_root in ctx.rig_roots() {
            let bare = rig_root.join(".repo.git");
            if !bare.is_dir() {
                continue;
            }
            let reference = format!("refs/remotes/origin/{}", self.default_branch);
            let exists = std::process::Command::new("git")
                .current_dir(&bare)
                .args(["rev-parse", "--verify", "--quiet", &reference])
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false);
            if !exists {
                missing.push(format!("{}: missing {}", bare.display(), reference));
            }
        }
        if missing.is_empty() {
            Ok(CheckResult::ok("default branch present in every bare repo"))
        } else {
            Ok(CheckResult::error(format!("{} bare repo(s) are missing the default branch", missing.len())).with_detail(missing))
        }
    }
}

/// Role-label and prefix coherence (§4.9 "Role-label and prefix
/// coherence"). Role beads must carry a `gt:role` label; rig prefixes
/// must agree between the issue store's own `issue_prefix` config and
/// the value the caller expects from the routing table (the single
/// source of truth, per §4.9).
pub struct RoleLabelCoherenceCheck {
    pub store: Arc<dyn IssueStore>,
    pub expected_prefix: String,
}

impl Check for RoleLabelCoherenceCheck {
    fn name(&self) -> &str {
        "role-label-and-prefix-coherence"
    }

    fn category(&self) -> Category {
        Category::Data
    }

    fn description(&self) -> &str {
        "role beads carry a gt:role label and the store's issue_prefix agrees with the routing table"
    }

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
        let _ = ctx;
        let mut problems = Vec::new();

        let agents = self
            .store
            .list(&gastown_issues::ListFilter::new().issue_type("agent"))
            .map_err(HealthError::from)?;
        for agent in &agents {
            if !agent.labels.iter().any(|l| l.starts_with("gt:role:")) {
                problems.push(format!("{}: missing gt:role label", agent.id));
            }
        }

        match self.store.config_get("issue_prefix").map_err(HealthError::from)? {
            Some(prefix) if prefix == self.expected_prefix => {}
            Some(prefix) => problems.push(format!(
                "issue_prefix is {prefix:?}, routing table expects {:?}",
                self.expected_prefix
            )),
            None => problems.push("issue_prefix is not set".to_string()),
        }

        if problems.is_empty() {
            Ok(CheckResult::ok("role labels and prefixes are coherent"))
        } else {
            Ok(CheckResult::warning(format!("{} coherence problem(s) found", problems.len()))
                .with_detail(problems)
                .with_remediation_hint("run with --fix to add missing labels and harmonize prefixes toward the routing table"))
        }
    }

    fn fix(&self, _ctx: &Context) -> Option<Result<(), HealthError>> {
        let run = (|| -> Result<(), HealthError> {
            let agents = self.store.list(&gastown_issues::ListFilter::new().issue_type("agent"))?;
            for agent in &agents {
                if !agent.labels.iter().any(|l| l.starts_with("gt:role:")) {
                    self.store.label_add(&agent.id, "gt:role:unknown")?;
                }
            }
            self.store.config_set("issue_prefix", &self.expected_prefix)?;
            Ok(())
        })();
        Some(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gastown_issues::{FakeIssueStore, NewIssue};
    use tempfile::tempdir;

    #[test]
    fn redirect_topology_reports_missing_redirect() {
        let town = tempdir().unwrap();
        std::fs::create_dir_all(town.path().join("gastown/.beads")).unwrap();
        std::fs::create_dir_all(town.path().join("gastown/crew/carol")).unwrap();

        let ctx = Context::new(town.path());
        let result = RedirectTopologyCheck.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Warning);
        assert!(result.detail[0].contains("missing redirect"));
    }

    #[test]
    fn redirect_topology_fix_converges_to_ok() {
        let town = tempdir().unwrap();
        std::fs::create_dir_all(town.path().join("gastown/.beads")).unwrap();
        std::fs::create_dir_all(town.path().join("gastown/crew/carol")).unwrap();

        let ctx = Context::new(town.path());
        RedirectTopologyCheck.fix(&ctx).unwrap().unwrap();
        let result = RedirectTopologyCheck.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Ok);

        let contents = std::fs::read_to_string(town.path().join("gastown/crew/carol/.beads/redirect")).unwrap();
        assert_eq!(contents, "../../.beads\n");
    }

    #[test]
    fn stale_data_check_is_idempotent_after_fix() {
        let town = tempdir().unwrap();
        let beads = town.path().join("gastown/crew/carol/.beads");
        std::fs::create_dir_all(&beads).unwrap();
        std::fs::write(beads.join("redirect"), "../../.beads\n").unwrap();
        std::fs::write(beads.join("issues.jsonl"), "{}").unwrap();

        let ctx = Context::new(town.path());
        let before = StaleDataCheck.run(&ctx).unwrap();
        assert_eq!(before.status, crate::check::Status::Warning);

        StaleDataCheck.fix(&ctx).unwrap().unwrap();
        let after = StaleDataCheck.run(&ctx).unwrap();
        assert_eq!(after.status, crate::check::Status::Ok);
    }

    #[test]
    fn role_label_coherence_flags_missing_label_and_prefix_drift() {
        let store = Arc::new(FakeIssueStore::new());
        store
            .create(NewIssue {
                title: "mayor".into(),
                issue_type: "agent".into(),
                assignee: "mayor/".into(),
                body: String::new(),
                priority: 2,
                labels: vec![],
                actor: "mayor/".into(),
                ephemeral: false,
            })
            .unwrap();
        store.config_set("issue_prefix", "gt").unwrap();

        let check = RoleLabelCoherenceCheck { store, expected_prefix: "town".to_string() };
        let ctx = Context::new(tempdir().unwrap().path());
        let result = check.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Warning);
        assert_eq!(result.detail.len(), 2);
    }

    #[test]
    fn bare_repo_existence_flags_worktree_referencing_missing_bare() {
        let town = tempdir().unwrap();
        let worktree = town.path().join("gastown/crew/alice");
        std::fs::create_dir_all(&worktree).unwrap();
        std::fs::write(worktree.join(".git"), "gitdir: /some/where/gastown/.repo.git/worktrees/alice\n").unwrap();

        let ctx = Context::new(town.path());
        let result = BareRepoExistenceCheck.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Error);
        assert!(result.detail[0].contains("alice"));
    }

    #[test]
    fn bare_repo_existence_is_ok_when_no_worktree_references_a_bare_repo() {
        let town = tempdir().unwrap();
        std::fs::create_dir_all(town.path().join("gastown/crew/alice")).unwrap();

        let ctx = Context::new(town.path());
        let result = BareRepoExistenceCheck.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Ok);
    }

    #[test]
    fn default_branch_check_is_ok_without_a_bare_repo() {
        let town = tempdir().unwrap();
        let ctx = Context::new(town.path());
        let check = DefaultBranchCheck { default_branch: "main".to_string() };
        let result = check.run(&ctx).unwrap();
        assert_eq!(result.status, crate::check::Status::Ok);
    }
}
