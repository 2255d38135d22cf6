use std::path::PathBuf;

use anyhow::{Result, bail};

/// Environment variable consulted when no dataset path is given on the command line.
pub const DATA_PATH_ENV: &str = "SALES_DASHBOARD_DATA";

pub const USAGE: &str = "\
Usage: sales-dashboard [DATA_FILE]

DATA_FILE   order export to open at startup (.csv, .json, .parquet)
            falls back to $SALES_DASHBOARD_DATA when omitted

Set RUST_LOG (e.g. RUST_LOG=info) to control log output.";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Startup configuration plus presentation constants.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Dataset loaded before the window opens. A failure here is fatal.
    pub data_path: Option<PathBuf>,
    /// Prefix for money values, including any trailing space.
    pub currency_symbol: String,
    /// Number of rows kept in the category rankings.
    pub top_n: usize,
    pub title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            currency_symbol: "R$ ".to_string(),
            top_n: 10,
            title: "E-commerce Sales Dashboard".to_string(),
        }
    }
}

/// What `main` should do after parsing the command line.
#[derive(Debug, PartialEq)]
pub enum Startup {
    Run(DashboardConfig),
    PrintHelp,
}

impl DashboardConfig {
    /// Resolve configuration from process arguments and environment.
    pub fn from_env() -> Result<Startup> {
        let env_path = std::env::var_os(DATA_PATH_ENV).map(PathBuf::from);
        Self::from_args(std::env::args().skip(1), env_path)
    }

    /// Argument parsing, split out so it can be tested without touching the
    /// real process environment. `args` excludes the program name.
    pub fn from_args<I>(args: I, env_path: Option<PathBuf>) -> Result<Startup>
    where
        I: IntoIterator<Item = String>,
    {
        let mut data_path = None;
        for arg in args {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Startup::PrintHelp),
                flag if flag.starts_with('-') => bail!("Unknown option: {flag}\n\n{USAGE}"),
                path => {
                    if data_path.is_some() {
                        bail!("Only one data file may be given\n\n{USAGE}");
                    }
                    data_path = Some(PathBuf::from(path));
                }
            }
        }

        Ok(Startup::Run(DashboardConfig {
            data_path: data_path.or(env_path),
            ..Default::default()
        }))
    }
}
