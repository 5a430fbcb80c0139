//! `-v` / `RAILGATE_LOG_LEVEL` handling.
//!
//! The flag counts occurrences, the env var takes a level name or its index.
//! Both end up as the same `u8` so the telemetry setup sees a single value.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn parse_log_level(raw: &str) -> Result<u8, String> {
    let raw = raw.trim();

    if let Ok(index) = raw.parse::<u8>() {
        return if usize::from(index) < LEVEL_NAMES.len() {
            Ok(index)
        } else {
            Err(format!("log level index must be 0-{}", LEVEL_NAMES.len() - 1))
        };
    }

    LEVEL_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(raw))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level '{raw}', expected one of {LEVEL_NAMES:?}"))
}

/// Map a verbosity count to a tracing level; `None` keeps the ERROR default.
#[must_use]
pub const fn level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

#[must_use]
pub fn level_from_matches(matches: &ArgMatches) -> Option<Level> {
    level(matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity, repeat for more (-v warn .. -vvvv trace); default: error")
            .env("RAILGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(parse_log_level),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_indexes_parse() {
        assert_eq!(parse_log_level("error"), Ok(0));
        assert_eq!(parse_log_level("DEBUG"), Ok(3));
        assert_eq!(parse_log_level(" trace "), Ok(4));
        assert_eq!(parse_log_level("2"), Ok(2));
    }

    #[test]
    fn out_of_range_and_unknown_levels_fail() {
        assert!(parse_log_level("5").is_err());
        assert!(parse_log_level("verbose").is_err_and(|e| e.contains("unknown log level")));
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level(0), None);
        assert_eq!(level(1), Some(Level::WARN));
        assert_eq!(level(2), Some(Level::INFO));
        assert_eq!(level(3), Some(Level::DEBUG));
        assert_eq!(level(9), Some(Level::TRACE));
    }
}
