// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill a process and every descendant it has spawned (§4.7: tearing
//! down a session must not leave orphaned children behind). Walks
//! `/proc` for the parent-pid graph where available, falling back to
//! shelling out to `pgrep -P` otherwise.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::process::Command;

/// Collect `root` and every transitive child pid, breadth-first.
pub fn descendants(root: u32) -> Vec<u32> {
    let parent_map = if std::path::Path::new("/proc").is_dir() {
        read_proc_parent_map()
    } else {
        HashMap::new()
    };

    let mut children_of: HashMap<u32, Vec<u32>> = HashMap::new();
    for (&pid, &ppid) in &parent_map {
        children_of.entry(ppid).or_default().push(pid);
    }

    let mut out = vec![root];
    let mut queue = VecDeque::from([root]);
    let mut seen = std::collections::HashSet::from([root]);

    if !parent_map.is_empty() {
        while let Some(pid) = queue.pop_front() {
            if let Some(kids) = children_of.get(&pid) {
                for &child in kids {
                    if seen.insert(child) {
                        out.push(child);
                        queue.push_back(child);
                    }
                }
            }
        }
    } else {
        // /proc unavailable: fall back to pgrep -P per generation.
        while let Some(pid) = queue.pop_front() {
            for child in pgrep_children(pid) {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
    }

    out
}

/// Send SIGTERM to `root` and every descendant, root last so children
/// don't get reparented to init mid-walk.
pub fn kill_tree(root: u32) {
    let mut pids = descendants(root);
    pids.retain(|&p| p != root);
    pids.push(root);
    for pid in pids {
        signal(pid);
    }
}

fn signal(pid: u32) {
    let _ = Command::new("kill").arg("-TERM").arg(pid.to_string()).status();
}

fn pgrep_children(pid: u32) -> Vec<u32> {
    let Ok(output) = Command::new("pgrep").arg("-P").arg(pid.to_string()).output() else {
        return vec![];
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|l| l.trim().parse().ok())
        .collect()
}

fn read_proc_parent_map() -> HashMap<u32, u32> {
    let mut map = HashMap::new();
    let Ok(entries) = fs::read_dir("/proc") else {
        return map;
    };
    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        // Fields after the `(comm)` parenthesized group are
        // space-separated; ppid is field 4 overall, i.e. index 1 after
        // the closing paren.
        let Some(after_comm) = stat.rsplit_once(')').map(|(_, rest)| rest) else {
            continue;
        };
        let mut fields = after_comm.split_whitespace();
        let _state = fields.next();
        if let Some(ppid) = fields.next().and_then(|s| s.parse::<u32>().ok()) {
            map.insert(pid, ppid);
        }
    }
    map
}
