use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use libc::pid_t;

use crate::snapshot::Snapshot;
use crate::tty::TtyName;

/// Conventional pid of the init/reaper process.
const INIT_PID: pid_t = 1;

/// Classify every terminal-attached process as a session root or a
/// descendant.
///
/// A process roots its terminal's tree when it did not inherit that terminal
/// from its parent: the parent is unknown, the parent is init, the parent
/// has no known terminal, or the parent sits on a different terminal. A
/// terminal can have several roots (re-attached sessions, `screen`-style
/// reparenting); each root list is de-duplicated and sorted by pid.
pub fn build_roots(snapshot: &Snapshot) -> HashMap<TtyName, Vec<pid_t>> {
    let mut roots: HashMap<TtyName, Vec<pid_t>> = HashMap::new();

    for (&pid, tty) in &snapshot.ttys {
        let is_root = match snapshot.parents.get(&pid) {
            None => true,
            Some(&INIT_PID) => true,
            Some(ppid) => match snapshot.ttys.get(ppid) {
                None => true,
                Some(parent_tty) => parent_tty != tty,
            },
        };
        if is_root {
            roots.entry(tty.clone()).or_default().push(pid);
        }
    }

    for pids in roots.values_mut() {
        pids.sort_unstable();
        pids.dedup();
    }
    roots
}

/// Children of `pid` on the same terminal, ascending by pid, excluding
/// anything the current render has already visited.
pub fn children_of(
    snapshot: &Snapshot,
    pid: pid_t,
    tty: &TtyName,
    visited: &HashSet<pid_t>,
) -> Vec<pid_t> {
    snapshot
        .parents
        .iter()
        .filter(|&(child, &parent)| {
            parent == pid && !visited.contains(child) && snapshot.ttys.get(child) == Some(tty)
        })
        .map(|(&child, _)| child)
        .sorted_unstable()
        .collect()
}
