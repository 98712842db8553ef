// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TmuxMultiplexer`: shells out to `tmux`, grounded on the teacher's
//! `oj-daemon::listener::tmux` module (`capture-pane`, `kill-session`)
//! but blocking on `std::process::Command` rather than
//! `tokio::process`, per §5's sync-only constraint.

use crate::error::SessionError;
use crate::multiplexer::Multiplexer;
use gastown_core::CoreError;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Default timeout for a single tmux RPC (SPEC_FULL §4.3: "5s for
/// multiplexer RPCs").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TmuxMultiplexer {
    timeout: Duration,
}

impl TmuxMultiplexer {
    pub fn new() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, args: &[&str]) -> Result<(bool, String, String), SessionError> {
        let mut child = Command::new("tmux")
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(CoreError::Io)?;

        let start = std::time::Instant::now();
        loop {
            match child.try_wait().map_err(CoreError::Io)? {
                Some(status) => {
                    use std::io::Read;
                    let mut stdout = String::new();
                    let mut stderr = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        let _ = out.read_to_string(&mut stdout);
                    }
                    if let Some(mut err) = child.stderr.take() {
                        let _ = err.read_to_string(&mut stderr);
                    }
                    return Ok((status.success(), stdout, stderr));
                }
                None => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SessionError::Core(CoreError::Timeout {
                            op: args.join(" "),
                            after: self.timeout,
                        }));
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }
    }
}

impl Default for TmuxMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer for TmuxMultiplexer {
    fn has_session(&self, id: &str) -> Result<bool, SessionError> {
        let (ok, _, _) = self.run(&["has-session", "-t", id])?;
        Ok(ok)
    }

    fn new_session_with_command(
        &self,
        id: &str,
        cwd: &Path,
        command: &str,
        args: &[String],
    ) -> Result<(), SessionError> {
        let cwd_str = cwd.display().to_string();
        let mut full_command = vec![command.to_string()];
        full_command.extend(args.iter().cloned());
        let joined = shell_join(&full_command);

        let mut tmux_args = vec!["new-session", "-d", "-s", id, "-c", cwd_str.as_str()];
        tmux_args.push(joined.as_str());
        let (ok, _, stderr) = self.run(&tmux_args)?;
        if !ok {
            return Err(SessionError::Core(CoreError::external_tool("tmux", None, stderr)));
        }
        Ok(())
    }

    fn kill_session(&self, id: &str) -> Result<(), SessionError> {
        let (ok, _, stderr) = self.run(&["kill-session", "-t", id])?;
        if !ok {
            return Err(SessionError::Core(CoreError::not_found(format!("session {id}: {stderr}"))));
        }
        Ok(())
    }

    fn send_keys(&self, id: &str, text: &str) -> Result<(), SessionError> {
        let (ok, _, stderr) = self.run(&["send-keys", "-t", id, text, "Enter"])?;
        if !ok {
            return Err(SessionError::Core(CoreError::external_tool("tmux", None, stderr)));
        }
        Ok(())
    }

    fn set_environment(&self, id: &str, key: &str, value: &str) -> Result<(), SessionError> {
        let (ok, _, stderr) = self.run(&["set-environment", "-t", id, key, value])?;
        if !ok {
            return Err(SessionError::Core(CoreError::external_tool("tmux", None, stderr)));
        }
        Ok(())
    }

    fn root_pid(&self, id: &str) -> Result<Option<u32>, SessionError> {
        let (ok, stdout, _) = self.run(&["list-panes", "-t", id, "-F", "#{pane_pid}"])?;
        if !ok {
            return Ok(None);
        }
        Ok(stdout.lines().next().and_then(|l| l.trim().parse().ok()))
    }

    fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, SessionError> {
        let pane = self.capture_pane(id)?;
        Ok(pane.contains(pattern))
    }

    fn capture_pane(&self, id: &str) -> Result<String, SessionError> {
        let (ok, stdout, stderr) = self.run(&["capture-pane", "-t", id, "-p", "-S", "-40"])?;
        if !ok {
            return Err(SessionError::Core(CoreError::not_found(format!("session {id}: {stderr}"))));
        }
        Ok(stdout)
    }
}

/// Join argv into a single shell command line for `tmux new-session`'s
/// trailing command argument, quoting anything containing whitespace.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| if a.contains(' ') { format!("'{}'", a.replace('\'', "'\\''")) } else { a.clone() })
        .collect::<Vec<_>>()
        .join(" ")
}
