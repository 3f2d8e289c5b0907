#![forbid(unsafe_code)]

//! Command-line argument parsing for the loop harness.
//!
//! Parses args manually to keep the binary lean. Device paths also come
//! from `WSRV_*` environment variables (see `wsrv_runtime::config`); flags
//! given here win over both.

use std::env;
use std::path::PathBuf;
use std::process;

use wsrv_runtime::LoopConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
wsrv-harness: run the window-server message loop against real devices

USAGE:
    wsrv-harness [OPTIONS]

OPTIONS:
    --keyboard=PATH      Keyboard device node (default: /dev/keyboard)
    --pointer=PATH       Pointer device node (default: /dev/psaux)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    WSRV_KEYBOARD_DEVICE  Override the keyboard device node
    WSRV_POINTER_DEVICE   Override the pointer device node
    WSRV_LOG              Log filter, e.g. 'debug' or 'wsrv_runtime=trace' (default: info)";

/// Parsed command-line options.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Opts {
    /// Keyboard device given on the command line.
    pub keyboard_device: Option<PathBuf>,
    /// Pointer device given on the command line.
    pub pointer_device: Option<PathBuf>,
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    /// Run the loop.
    Run(Opts),
    /// Print help and exit.
    Help,
    /// Print the version and exit.
    Version,
}

impl Opts {
    /// Parse the process arguments, exiting on `--help`, `--version` or an
    /// invalid argument.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1)) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("wsrv-harness {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse an argument list (without the program name).
    pub fn parse_from<I, S>(args: I) -> Result<Parsed, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();
        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--keyboard=") {
                        opts.keyboard_device = Some(non_empty_path("--keyboard", val)?);
                    } else if let Some(val) = other.strip_prefix("--pointer=") {
                        opts.pointer_device = Some(non_empty_path("--pointer", val)?);
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Ok(Parsed::Run(opts))
    }

    /// Apply command-line overrides on top of `config`.
    #[must_use]
    pub fn apply(self, mut config: LoopConfig) -> LoopConfig {
        if let Some(path) = self.keyboard_device {
            config = config.with_keyboard_device(path);
        }
        if let Some(path) = self.pointer_device {
            config = config.with_pointer_device(path);
        }
        config
    }
}

fn non_empty_path(flag: &str, val: &str) -> Result<PathBuf, String> {
    if val.is_empty() {
        Err(format!("Invalid {flag} value: path is empty"))
    } else {
        Ok(PathBuf::from(val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_runs_with_defaults() {
        let parsed = Opts::parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(parsed, Parsed::Run(Opts::default()));
    }

    #[test]
    fn device_flags_parsed() {
        let parsed =
            Opts::parse_from(["--keyboard=/tmp/kbd", "--pointer=/tmp/mouse"]).unwrap();
        assert_eq!(
            parsed,
            Parsed::Run(Opts {
                keyboard_device: Some(PathBuf::from("/tmp/kbd")),
                pointer_device: Some(PathBuf::from("/tmp/mouse")),
            })
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(Opts::parse_from(["-h", "--bogus"]).unwrap(), Parsed::Help);
        assert_eq!(Opts::parse_from(["--version"]).unwrap(), Parsed::Version);
    }

    #[test]
    fn unknown_argument_rejected() {
        let err = Opts::parse_from(["--screen=2"]).unwrap_err();
        assert!(err.contains("--screen=2"));
    }

    #[test]
    fn empty_path_rejected() {
        let err = Opts::parse_from(["--pointer="]).unwrap_err();
        assert!(err.contains("--pointer"));
    }

    #[test]
    fn flags_override_config() {
        let base = LoopConfig::default().with_pointer_device("/from/env");
        let config = Opts {
            keyboard_device: Some(PathBuf::from("/from/flag")),
            pointer_device: None,
        }
        .apply(base);
        assert_eq!(config.keyboard_device, PathBuf::from("/from/flag"));
        assert_eq!(config.pointer_device, PathBuf::from("/from/env"));
    }

    #[test]
    fn help_text_lists_env_vars() {
        assert!(HELP_TEXT.contains("WSRV_KEYBOARD_DEVICE"));
        assert!(HELP_TEXT.contains("WSRV_POINTER_DEVICE"));
        assert!(HELP_TEXT.contains("WSRV_LOG"));
        assert!(!VERSION.is_empty());
    }
}
