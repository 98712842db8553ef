// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Runner`: executes a set of checks in topology → data → runtime
//! order (§4.9 "Execution"), invoking `Fix` only when requested and the
//! prior `Run` was non-OK and itself fixable.

use crate::check::{Category, Check, CheckResult, Context, Status};
use crate::error::HealthError;

pub struct CheckOutcome {
    pub name: String,
    pub category: Category,
    pub result: CheckResult,
    /// `Some` once a fix was attempted for this check this run.
    pub fix_result: Option<Result<(), HealthError>>,
}

pub struct Runner {
    checks: Vec<Box<dyn Check>>,
}

impl Runner {
    pub fn new(mut checks: Vec<Box<dyn Check>>) -> Self {
        checks.sort_by_key(|c| c.category());
        Self { checks }
    }

    /// Run every check once. When `fix` is true, any non-OK result
    /// immediately gets a `Fix` attempt, and the check is re-run so the
    /// caller sees the post-fix status (§4.9 "Fixes MUST be idempotent:
    /// re-running immediately after success yields OK").
    pub fn run(&self, ctx: &Context, fix: bool) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let mut result = match check.run(ctx) {
                Ok(r) => r,
                Err(e) => CheckResult::error(format!("check failed to run: {e}")),
            };

            let mut fix_result = None;
            if fix && !result.status.is_ok() {
                if let Some(outcome) = check.fix(ctx) {
                    let failed = outcome.is_err();
                    fix_result = Some(outcome);
                    if !failed {
                        result = match check.run(ctx) {
                            Ok(r) => r,
                            Err(e) => CheckResult::error(format!("check failed to re-run after fix: {e}")),
                        };
                    }
                }
            }

            outcomes.push(CheckOutcome { name: check.name().to_string(), category: check.category(), result, fix_result });
        }
        outcomes
    }

    /// Overall exit status: `Error` if any check errored, else
    /// `Warning` if any warned, else `Ok`.
    pub fn overall(outcomes: &[CheckOutcome]) -> Status {
        if outcomes.iter().any(|o| o.result.status == Status::Error) {
            Status::Error
        } else if outcomes.iter().any(|o| o.result.status == Status::Warning) {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysWarns;
    impl Check for AlwaysWarns {
        fn name(&self) -> &str {
            "always-warns"
        }
        fn category(&self) -> Category {
            Category::Runtime
        }
        fn description(&self) -> &str {
            "test fixture"
        }
        fn run(&self, _ctx: &Context) -> Result<CheckResult, HealthError> {
            Ok(CheckResult::warning("still warning"))
        }
        fn fix(&self, _ctx: &Context) -> Option<Result<(), HealthError>> {
            Some(Ok(()))
        }
    }

    struct FixesToOk;
    impl Check for FixesToOk {
        fn name(&self) -> &str {
            "fixes-to-ok"
        }
        fn category(&self) -> Category {
            Category::Topology
        }
        fn description(&self) -> &str {
            "test fixture"
        }
        fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError> {
            if ctx.town_root.join("fixed").exists() {
                Ok(CheckResult::ok("fixed"))
            } else {
                Ok(CheckResult::warning("needs fixing"))
            }
        }
        fn fix(&self, ctx: &Context) -> Option<Result<(), HealthError>> {
            Some(std::fs::write(ctx.town_root.join("fixed"), "").map_err(|e| HealthError::Core(e.into())))
        }
    }

    #[test]
    fn without_fix_a_warning_stays_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(vec![Box::new(AlwaysWarns)]);
        let outcomes = runner.run(&Context::new(dir.path()), false);
        assert_eq!(outcomes[0].result.status, Status::Warning);
        assert!(outcomes[0].fix_result.is_none());
    }

    #[test]
    fn fix_reruns_and_converges_to_ok() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(vec![Box::new(FixesToOk)]);
        let outcomes = runner.run(&Context::new(dir.path()), true);
        assert_eq!(outcomes[0].result.status, Status::Ok);
        assert!(outcomes[0].fix_result.as_ref().unwrap().is_ok());
    }

    #[test]
    fn checks_run_in_topology_then_data_then_runtime_order() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(vec![Box::new(AlwaysWarns), Box::new(FixesToOk)]);
        let outcomes = runner.run(&Context::new(dir.path()), false);
        assert_eq!(outcomes[0].name, "fixes-to-ok");
        assert_eq!(outcomes[1].name, "always-warns");
    }

    #[test]
    fn overall_escalates_to_the_worst_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(vec![Box::new(AlwaysWarns)]);
        let outcomes = runner.run(&Context::new(dir.path()), false);
        assert_eq!(Runner::overall(&outcomes), Status::Warning);
    }
}
