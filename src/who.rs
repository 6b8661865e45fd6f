use std::collections::HashMap;
use std::process::Command;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;

use crate::prelude::*;
use crate::tty::TtyName;

lazy_static! {
    // `<user> <terminal> <date> <time>`, date either ISO or `Mon d`
    static ref LOGIN_LINE: Regex = Regex::new(
        r"^(\S+)\s+(\S+)\s+(\d{4}-\d{2}-\d{2}|[A-Z][a-z]{2}\s+\d{1,2})\s+(\d{1,2}:\d{2})"
    )
    .unwrap();
}

/// Login metadata for one terminal, as reported by `who`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEntry {
    pub user: String,
    /// Raw `<date> <time>` string, kept verbatim for display.
    pub login_time: String,
    /// Epoch seconds of the login instant, `None` when the reported
    /// date/time could not be parsed.
    pub timestamp: Option<i64>,
}

/// Run `who` and index its output by terminal.
///
/// Login info is an overlay, never a requirement: a missing binary, a
/// non-zero exit or unreadable output degrades to an empty map with a single
/// warning and the run continues.
pub fn collect_logins() -> HashMap<TtyName, LoginEntry> {
    let output = match Command::new("who").output() {
        Ok(output) => output,
        Err(err) => {
            warn!("Could not run `who`, login information will be unavailable: {err}");
            return HashMap::new();
        }
    };
    if !output.status.success() {
        warn!(
            "`who` exited with {}, login information will be unavailable",
            output.status
        );
        return HashMap::new();
    }

    parse_who_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_who_output(stdout: &str) -> HashMap<TtyName, LoginEntry> {
    let mut logins = HashMap::new();
    for line in stdout.lines() {
        let Some((tty, entry)) = parse_login_line(line) else {
            continue;
        };
        if entry.timestamp.is_none() {
            debug!("Unparseable login time for {tty}: {:?}", entry.login_time);
        }
        // First entry per terminal wins
        logins.entry(tty).or_insert(entry);
    }
    logins
}

/// Parse one `who` line. Lines for non-terminal entries (the system console,
/// X displays) and lines in an unexpected shape are dropped.
fn parse_login_line(line: &str) -> Option<(TtyName, LoginEntry)> {
    let captures = LOGIN_LINE.captures(line)?;
    let user = captures[1].to_string();
    let tty = TtyName::parse(&captures[2])?;
    let date = &captures[3];
    let time = &captures[4];

    Some((
        tty,
        LoginEntry {
            user,
            login_time: format!("{date} {time}"),
            timestamp: parse_timestamp(date, time),
        },
    ))
}

/// Local-time epoch of `<date> <time>`. Abbreviated-month dates carry no
/// year, so the current calendar year is assumed.
fn parse_timestamp(date: &str, time: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDate::parse_from_str(&format!("{date} {}", Local::now().year()), "%b %d %Y")
        })
        .ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Local
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|instant| instant.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_epoch(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<i64> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .map(|instant| instant.timestamp())
    }

    #[test]
    fn test_parse_iso_line() {
        let (tty, entry) = parse_login_line("alice pts/0 2025-07-01 09:15").unwrap();
        assert_eq!(tty, TtyName::Pts(0));
        assert_eq!(entry.user, "alice");
        assert_eq!(entry.login_time, "2025-07-01 09:15");
        assert_eq!(entry.timestamp, expected_epoch(2025, 7, 1, 9, 15));
    }

    #[test]
    fn test_parse_abbreviated_date_assumes_current_year() {
        let (tty, entry) = parse_login_line("bob      tty2         Jul  1 09:15 (:0)").unwrap();
        assert_eq!(tty, TtyName::Console(2));
        assert_eq!(entry.login_time, "Jul  1 09:15");
        assert_eq!(
            entry.timestamp,
            expected_epoch(Local::now().year(), 7, 1, 9, 15)
        );
    }

    #[test]
    fn test_unparseable_date_keeps_display_strings() {
        let (_, entry) = parse_login_line("alice pts/0 2025-13-40 09:15").unwrap();
        assert_eq!(entry.user, "alice");
        assert_eq!(entry.login_time, "2025-13-40 09:15");
        assert_eq!(entry.timestamp, None);
    }

    #[test]
    fn test_console_and_garbage_lines_skipped() {
        assert!(parse_login_line("root     console      2025-07-01 08:00").is_none());
        assert!(parse_login_line("alice    :0           2025-07-01 08:00").is_none());
        assert!(parse_login_line("NAME     LINE         TIME").is_none());
        assert!(parse_login_line("").is_none());
    }

    #[test]
    fn test_parse_who_output_first_entry_wins() {
        let logins = parse_who_output(
            "alice pts/0 2025-07-01 09:15\n\
             bob   pts/0 2025-07-01 10:00\n\
             carol tty1  2025-07-01 08:30\n",
        );
        assert_eq!(logins.len(), 2);
        assert_eq!(logins[&TtyName::Pts(0)].user, "alice");
        assert_eq!(logins[&TtyName::Console(1)].user, "carol");
    }
}
