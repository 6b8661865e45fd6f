use std::fmt;

use libc::pid_t;

/// Normalized name of a terminal device, `/dev/` prefix stripped.
///
/// The variant order doubles as the display sort order: virtual consoles
/// first (numerically), then pseudo-terminals (numerically), then anything
/// else lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TtyName {
    /// Virtual console, `ttyN`.
    Console(u32),
    /// Pseudo-terminal slave, `pts/N`.
    Pts(u32),
    /// Any other `tty*` node, e.g. serial lines (`ttyS0`).
    Other(String),
}

impl fmt::Display for TtyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtyName::Console(n) => write!(f, "tty{n}"),
            TtyName::Pts(n) => write!(f, "pts/{n}"),
            TtyName::Other(name) => f.write_str(name),
        }
    }
}

impl TtyName {
    /// Parse a short device name such as `tty2` or `pts/0`. Names that do
    /// not denote a terminal device return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(suffix) = name.strip_prefix("pts/") {
            return suffix.parse().ok().map(TtyName::Pts);
        }
        if let Some(suffix) = name.strip_prefix("tty") {
            return match suffix.parse() {
                Ok(n) => Some(TtyName::Console(n)),
                Err(_) => Some(TtyName::Other(name.to_string())),
            };
        }
        None
    }
}

/// Decode the `tty_nr` device number reported in `/proc/<pid>/stat`.
///
/// Linux allocates major 4 to the virtual consoles (minors below 64; the
/// higher minors are the legacy serial lines) and majors 136-143 to
/// pseudo-terminal slaves, 256 minors per major.
fn decode_tty_nr(tty_nr: i32) -> Option<TtyName> {
    if tty_nr <= 0 {
        return None;
    }
    let nr = tty_nr as u32;
    let major = (nr >> 8) & 0xfff;
    let minor = (nr & 0xff) | ((nr >> 12) & 0xfff00);
    match major {
        4 if minor < 64 => Some(TtyName::Console(minor)),
        4 => Some(TtyName::Other(format!("ttyS{}", minor - 64))),
        136..=143 => Some(TtyName::Pts((major - 136) * 256 + minor)),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn tty_from_stat(pid: pid_t) -> Option<TtyName> {
    let process = procfs::process::Process::new(pid).ok()?;
    decode_tty_nr(process.stat().ok()?.tty_nr)
}

#[cfg(not(target_os = "linux"))]
fn tty_from_stat(_pid: pid_t) -> Option<TtyName> {
    None
}

/// Fallback: resolve the symlink behind the process's stdin descriptor and
/// accept it when it points at a terminal device. Any failure (process gone,
/// permission denied, fd 0 not a symlink to a device) means "no terminal".
fn tty_from_fd0(pid: pid_t) -> Option<TtyName> {
    let target = std::fs::read_link(format!("/proc/{pid}/fd/0")).ok()?;
    let short = target.strip_prefix("/dev").ok()?;
    TtyName::parse(short.to_str()?)
}

/// Controlling terminal of a process: the stat attribute when the kernel
/// reports one, the fd 0 symlink otherwise.
pub fn resolve(pid: pid_t) -> Option<TtyName> {
    tty_from_stat(pid).or_else(|| tty_from_fd0(pid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tty2", Some(TtyName::Console(2)))]
    #[case("pts/0", Some(TtyName::Pts(0)))]
    #[case("pts/12", Some(TtyName::Pts(12)))]
    #[case("ttyS0", Some(TtyName::Other("ttyS0".to_string())))]
    #[case("tty", Some(TtyName::Other("tty".to_string())))]
    #[case("console", None)]
    #[case(":0", None)]
    #[case("pts/x", None)]
    fn test_parse(#[case] name: &str, #[case] expected: Option<TtyName>) {
        assert_eq!(TtyName::parse(name), expected);
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["tty1", "tty63", "pts/0", "pts/300", "ttyS1"] {
            assert_eq!(TtyName::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_sort_order() {
        let mut ttys = vec![
            TtyName::parse("tty10").unwrap(),
            TtyName::parse("tty2").unwrap(),
            TtyName::parse("pts/1").unwrap(),
            TtyName::parse("pts/0").unwrap(),
        ];
        ttys.sort();
        let sorted: Vec<String> = ttys.iter().map(TtyName::to_string).collect();
        assert_eq!(sorted, ["tty2", "tty10", "pts/0", "pts/1"]);
    }

    #[test]
    fn test_serial_lines_sort_after_pts() {
        let mut ttys = vec![
            TtyName::parse("ttyS0").unwrap(),
            TtyName::parse("pts/3").unwrap(),
            TtyName::parse("tty1").unwrap(),
        ];
        ttys.sort();
        let sorted: Vec<String> = ttys.iter().map(TtyName::to_string).collect();
        assert_eq!(sorted, ["tty1", "pts/3", "ttyS0"]);
    }

    #[rstest]
    #[case(0, None)]
    #[case(-1, None)]
    // major 4, minor 1 -> first virtual console
    #[case((4 << 8) | 1, Some(TtyName::Console(1)))]
    // major 4, minor 64 -> first legacy serial line
    #[case((4 << 8) | 64, Some(TtyName::Other("ttyS0".to_string())))]
    // major 136, minor 0 -> pts/0
    #[case(136 << 8, Some(TtyName::Pts(0)))]
    // major 137, minor 44 -> pts/300
    #[case((137 << 8) | 44, Some(TtyName::Pts(300)))]
    // major 5 is /dev/tty itself and friends, not a controlling terminal name
    #[case((5 << 8) | 1, None)]
    fn test_decode_tty_nr(#[case] tty_nr: i32, #[case] expected: Option<TtyName>) {
        assert_eq!(decode_tty_nr(tty_nr), expected);
    }
}
