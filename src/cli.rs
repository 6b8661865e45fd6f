use std::io;

use clap::Parser;
use nix::unistd::Uid;

use crate::prelude::*;
use crate::render::{self, RenderConfig};
use crate::snapshot::Snapshot;
use crate::who;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "List active TTY/PTS sessions and the commands attached to them"
)]
pub struct Cli {
    /// Append PID, user and executable path to every process line
    #[arg(short, long)]
    pub verbose: bool,

    /// Render each session as a process tree instead of a flat command list
    #[arg(short, long)]
    pub tree: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if !Uid::effective().is_root() {
        warn!(
            "Not running as root: some process, terminal or login information may be incomplete"
        );
    }

    let snapshot = Snapshot::collect();
    let logins = who::collect_logins();

    let config = RenderConfig {
        verbose: cli.verbose,
        tree: cli.tree,
    };
    let stdout = io::stdout();
    render::render(&mut stdout.lock(), &snapshot, &logins, &config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combinable_in_any_order() {
        let cli = Cli::parse_from(["lstty", "-v", "--tree"]);
        assert!(cli.verbose);
        assert!(cli.tree);

        let cli = Cli::parse_from(["lstty", "-t", "-v"]);
        assert!(cli.verbose);
        assert!(cli.tree);

        let cli = Cli::parse_from(["lstty"]);
        assert!(!cli.verbose);
        assert!(!cli.tree);
    }

    #[test]
    fn test_unknown_argument_is_a_usage_error() {
        assert!(Cli::try_parse_from(["lstty", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["lstty", "extra"]).is_err());
    }
}
