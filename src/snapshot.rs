use std::collections::HashMap;

use itertools::Itertools;
use libc::pid_t;
use sysinfo::{ProcessRefreshKind, RefreshKind, System, UpdateKind, Users};

use crate::tty::{self, TtyName};

/// Display data for one terminal-attached process.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: pid_t,
    /// Joined argv, or the bare process name when no argv is recorded
    /// (kernel threads, zombies).
    pub cmdline: String,
    pub user: String,
    pub exe_path: String,
}

/// One best-effort pass over the process table. All relationships are kept
/// as pid references; the graph is rebuilt from scratch on every run.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Terminal-attached processes only.
    pub records: HashMap<pid_t, ProcessRecord>,
    /// Parent pid for every scanned process. Values may name pids that are
    /// gone or invisible to us; those count as "parent unknown" downstream.
    pub parents: HashMap<pid_t, pid_t>,
    /// Controlling terminal per pid, when one could be determined.
    pub ttys: HashMap<pid_t, TtyName>,
}

impl Snapshot {
    /// Enumerate every process visible to the caller. Processes that vanish
    /// mid-scan or are inaccessible are simply absent from the maps;
    /// partially readable ones degrade field by field to placeholder values.
    pub fn collect() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(
                ProcessRefreshKind::nothing()
                    .with_cmd(UpdateKind::Always)
                    .with_exe(UpdateKind::Always)
                    .with_user(UpdateKind::Always),
            ),
        );
        let users = Users::new_with_refreshed_list();

        let mut snapshot = Snapshot::default();
        for (pid, process) in system.processes() {
            let pid = pid.as_u32() as pid_t;
            if let Some(parent) = process.parent() {
                snapshot.parents.insert(pid, parent.as_u32() as pid_t);
            }

            let Some(tty) = tty::resolve(pid) else {
                continue;
            };

            let cmdline = if process.cmd().is_empty() {
                process.name().to_string_lossy().into_owned()
            } else {
                process.cmd().iter().map(|arg| arg.to_string_lossy()).join(" ")
            };
            let user = process
                .user_id()
                .and_then(|uid| users.get_user_by_id(uid))
                .map(|user| user.name().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let exe_path = process
                .exe()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "N/A".to_string());

            snapshot.ttys.insert(pid, tty);
            snapshot.records.insert(
                pid,
                ProcessRecord {
                    pid,
                    cmdline,
                    user,
                    exe_path,
                },
            );
        }
        snapshot
    }
}

#[cfg(test)]
impl Snapshot {
    /// Register a fake process, with a record and terminal mapping when
    /// `tty` is set.
    pub fn with_process(
        mut self,
        pid: pid_t,
        ppid: Option<pid_t>,
        tty: Option<TtyName>,
        cmdline: &str,
    ) -> Self {
        if let Some(ppid) = ppid {
            self.parents.insert(pid, ppid);
        }
        if let Some(tty) = tty {
            self.ttys.insert(pid, tty);
            self.records.insert(
                pid,
                ProcessRecord {
                    pid,
                    cmdline: cmdline.to_string(),
                    user: "user".to_string(),
                    exe_path: "N/A".to_string(),
                },
            );
        }
        self
    }
}
