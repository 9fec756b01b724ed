#![forbid(unsafe_code)]

//! Command-line argument parsing for the field list demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `FIELDLIST_DEMO_*` prefix.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
fieldlist-demo: mount a virtualized field list and print its rows

USAGE:
    fieldlist-demo [OPTIONS] [COMMANDS]

OPTIONS:
    --fields=PATH        File with one field name per line ('-' or unset: stdin)
    --height=N           Container height in pixels (default: 400)
    --scroll=N           Scroll offset in pixels (default: 0)
    --search=TEXT        Case-insensitive field filter
    --state=PATH         Selection state file (default: XDG state dir)
    --memory             Keep the selection in memory only
    --help, -h           Show this help message
    --version, -V        Show version

COMMANDS (applied in order):
    --add=FIELD          Move FIELD to the displayed section
    --remove=FIELD       Move FIELD back to the hidden section
    --query=FIELD        Emit the add-to-query name for FIELD

ENVIRONMENT VARIABLES:
    FIELDLIST_DEMO_FIELDS     Override --fields
    FIELDLIST_DEMO_HEIGHT     Override --height
    FIELDLIST_DEMO_SCROLL     Override --scroll
    FIELDLIST_DEMO_SEARCH     Override --search
    FIELDLIST_DEMO_STATE      Override --state
    FIELDLIST_BUFFER_ROWS     Rows rendered beyond the viewport (default: 8)
    FIELDLIST_OVERSCAN_ROWS   Extra overscan rows (default: 3)
    FIELDLIST_LOG             Log filter, e.g. 'debug' or 'fieldlist_widgets=trace'";

/// A selection mutation or query requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Remove(String),
    Query(String),
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Field name source. `None` reads stdin.
    pub fields: Option<PathBuf>,
    /// Container height in pixels.
    pub height: u32,
    /// Initial scroll offset in pixels.
    pub scroll: u32,
    pub search: String,
    /// State file. `None` uses the per-user default location.
    pub state: Option<PathBuf>,
    /// Skip the state file entirely.
    pub memory: bool,
    pub commands: Vec<Command>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            fields: None,
            height: 400,
            scroll: 0,
            search: String::new(),
            state: None,
            memory: false,
            commands: Vec::new(),
        }
    }
}

/// Outcome of parsing an argument list.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        let mut opts = Self::default();
        opts.apply_env(|key| env::var(key).ok());

        match opts.apply_args(env::args().skip(1)) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("fieldlist-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("FIELDLIST_DEMO_FIELDS") {
            self.fields = path_arg(&val);
        }
        if let Some(val) = lookup("FIELDLIST_DEMO_HEIGHT")
            && let Ok(n) = val.parse()
        {
            self.height = n;
        }
        if let Some(val) = lookup("FIELDLIST_DEMO_SCROLL")
            && let Ok(n) = val.parse()
        {
            self.scroll = n;
        }
        if let Some(val) = lookup("FIELDLIST_DEMO_SEARCH") {
            self.search = val;
        }
        if let Some(val) = lookup("FIELDLIST_DEMO_STATE") {
            self.state = path_arg(&val);
        }
    }

    fn apply_args<I>(mut self, args: I) -> Result<Parsed, String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--memory" => self.memory = true,
                other => {
                    if let Some(val) = other.strip_prefix("--fields=") {
                        self.fields = path_arg(val);
                    } else if let Some(val) = other.strip_prefix("--height=") {
                        self.height = val
                            .parse()
                            .map_err(|_| format!("Invalid --height value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--scroll=") {
                        self.scroll = val
                            .parse()
                            .map_err(|_| format!("Invalid --scroll value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--search=") {
                        self.search = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--state=") {
                        self.state = path_arg(val);
                    } else if let Some(val) = other.strip_prefix("--add=") {
                        self.commands.push(Command::Add(val.to_string()));
                    } else if let Some(val) = other.strip_prefix("--remove=") {
                        self.commands.push(Command::Remove(val.to_string()));
                    } else if let Some(val) = other.strip_prefix("--query=") {
                        self.commands.push(Command::Query(val.to_string()));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Ok(Parsed::Run(self))
    }
}

fn path_arg(val: &str) -> Option<PathBuf> {
    match val {
        "" | "-" => None,
        path => Some(PathBuf::from(path)),
    }
}
