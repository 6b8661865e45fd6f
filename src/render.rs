use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::{self, Write};

use itertools::Itertools;
use libc::pid_t;

use crate::snapshot::{ProcessRecord, Snapshot};
use crate::tree;
use crate::tty::TtyName;
use crate::who::LoginEntry;

/// Immutable rendering options, threaded through every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub verbose: bool,
    pub tree: bool,
}

fn display_string(record: &ProcessRecord, config: &RenderConfig) -> String {
    if config.verbose {
        format!(
            "{} (PID: {}, User: {}, EXE: {})",
            record.cmdline, record.pid, record.user, record.exe_path
        )
    } else {
        record.cmdline.clone()
    }
}

/// Print the whole report: banner, then one section per terminal in display
/// order, each with its login line and either a tree or a flat command list.
pub fn render(
    out: &mut impl Write,
    snapshot: &Snapshot,
    logins: &HashMap<TtyName, LoginEntry>,
    config: &RenderConfig,
) -> io::Result<()> {
    writeln!(out, "---")?;
    writeln!(out, "TTY/PTS Sessions and their Commands:")?;
    writeln!(out, "---")?;

    if snapshot.ttys.is_empty() {
        writeln!(out, "No active TTY/PTS sessions with running commands found.")?;
        return Ok(());
    }

    let roots = tree::build_roots(snapshot);
    let ttys: BTreeSet<&TtyName> = snapshot.ttys.values().collect();

    for tty in ttys {
        writeln!(out)?;
        writeln!(out, "## TTY/PTS: /dev/{tty}")?;
        match logins.get(tty) {
            Some(entry) => writeln!(
                out,
                "  Login: {} (Logged in at: {})",
                entry.user, entry.login_time
            )?,
            None => writeln!(out, "  Login: Unknown User (Logged in at: N/A)")?,
        }

        if config.tree {
            let tty_roots = roots.get(tty).map(Vec::as_slice).unwrap_or_default();
            render_tree(out, snapshot, tty, tty_roots, logins.contains_key(tty), config)?;
        } else {
            render_flat(out, snapshot, tty, config)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "---")?;
    Ok(())
}

fn render_tree(
    out: &mut impl Write,
    snapshot: &Snapshot,
    tty: &TtyName,
    roots: &[pid_t],
    has_login: bool,
    config: &RenderConfig,
) -> io::Result<()> {
    writeln!(out, "  Process Tree:")?;

    // One visited set per terminal: a pid is rendered at most once even when
    // several roots or a degenerate parent graph would reach it again.
    let mut visited = HashSet::new();
    for &root in roots {
        render_subtree(out, snapshot, tty, root, &mut Vec::new(), &mut visited, config)?;
    }

    if visited.is_empty() && has_login {
        writeln!(out, "    (no active session roots)")?;
    }
    Ok(())
}

/// Depth-first render of one subtree. `ancestors` records, for every level
/// above the current node, whether that ancestor was the last child of its
/// parent; connector glyphs are derived from it only at print time.
fn render_subtree(
    out: &mut impl Write,
    snapshot: &Snapshot,
    tty: &TtyName,
    pid: pid_t,
    ancestors: &mut Vec<bool>,
    visited: &mut HashSet<pid_t>,
    config: &RenderConfig,
) -> io::Result<()> {
    let Some(record) = snapshot.records.get(&pid) else {
        return Ok(());
    };
    if !visited.insert(pid) {
        return Ok(());
    }

    let mut prefix = String::from("    ");
    if let Some((&is_last, upper)) = ancestors.split_last() {
        for &ancestor_was_last in upper {
            prefix.push_str(if ancestor_was_last { "    " } else { "│   " });
        }
        prefix.push_str(if is_last { "└── " } else { "├── " });
    }
    writeln!(out, "{prefix}{}", display_string(record, config))?;

    let children = tree::children_of(snapshot, pid, tty, visited);
    let count = children.len();
    for (index, child) in children.into_iter().enumerate() {
        ancestors.push(index + 1 == count);
        render_subtree(out, snapshot, tty, child, ancestors, visited, config)?;
        ancestors.pop();
    }
    Ok(())
}

/// Flat mode: distinct display strings for this terminal's processes,
/// ascending by pid, first occurrence wins.
fn render_flat(
    out: &mut impl Write,
    snapshot: &Snapshot,
    tty: &TtyName,
    config: &RenderConfig,
) -> io::Result<()> {
    writeln!(out, "  Commands running:")?;

    let lines = snapshot
        .ttys
        .iter()
        .filter(|(_, t)| *t == tty)
        .map(|(&pid, _)| pid)
        .sorted_unstable()
        .filter_map(|pid| snapshot.records.get(&pid))
        .map(|record| display_string(record, config))
        .unique();
    for line in lines {
        writeln!(out, "    * {line}")?;
    }
    Ok(())
}
