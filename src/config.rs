//! Functions and structures related to configuring how a report is rendered and logged.
//!
//! The aggregation itself has nothing to configure. The surfaces around it do: which
//! [`ReportFormat`] downstream printers should use, and how verbosely Boomer logs
//! while draining outcomes.
//!
//! [`ReportConfiguration`] can be built from command line arguments with
//! [`gumdrop`](https://docs.rs/gumdrop/), or constructed directly.

use gumdrop::Options;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use simplelog::*;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::BoomerError;

/// Runtime options controlling report output and logging.
///
/// # Example
/// ```rust
/// use boomer::config::{ReportConfiguration, ReportFormat};
/// use gumdrop::Options;
///
/// let configuration = ReportConfiguration::parse_args_default(&["--output", "json", "-vv"])
///     .expect("failed to parse options");
/// assert_eq!(configuration.output_format(), ReportFormat::Json);
/// assert_eq!(configuration.verbose, 2);
/// ```
#[derive(Options, Debug, Clone, Default, Serialize, Deserialize)]
#[options(
    help = r#"Boomer reduces the outcomes of a load test into a summary report.

The following runtime options are available:"#
)]
pub struct ReportConfiguration {
    /// Displays this help
    #[options(short = "h")]
    pub help: bool,
    /// Sets report format (summary, json, pretty)
    #[options(short = "o", meta = "FORMAT")]
    pub output: Option<ReportFormat>,
    /// Enables Boomer log file and sets name
    #[options(short = "G", meta = "NAME")]
    pub log_file: String,
    /// Increases Boomer log file level (-g, -gg, etc)
    #[options(short = "g", count)]
    pub log_level: u8,
    /// Decreases Boomer verbosity (-q, -qq, etc)
    #[options(count, short = "q")]
    pub quiet: u8,
    /// Increases Boomer verbosity (-v, -vv, etc)
    #[options(count, short = "v")]
    pub verbose: u8,
}

impl ReportConfiguration {
    /// The configured report format, [`ReportFormat::Summary`] if none was set.
    pub fn output_format(&self) -> ReportFormat {
        self.output.unwrap_or_default()
    }

    /// Validate that the options are consistent with each other.
    pub fn validate(&self) -> Result<(), BoomerError> {
        // A log file level means nothing without a log file.
        if self.log_level > 0 && self.log_file.is_empty() {
            return Err(BoomerError::InvalidOption {
                option: "`configuration.log_level`".to_string(),
                value: self.log_level.to_string(),
                detail: "`configuration.log_level` can not be set without `configuration.log_file`."
                    .to_string(),
            });
        }

        if self.verbose > 0 && self.quiet > 0 {
            return Err(BoomerError::InvalidOption {
                option: "`configuration.verbose`".to_string(),
                value: self.verbose.to_string(),
                detail: "`configuration.verbose` can not be set together with `configuration.quiet`."
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Level of messages written to standard out.
    pub fn debug_level(&self) -> LevelFilter {
        match self.verbose {
            0 => match self.quiet {
                0 => LevelFilter::Info,
                1 => LevelFilter::Warn,
                _ => LevelFilter::Error,
            },
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Level of messages written to the optional log file.
    pub fn log_file_level(&self) -> LevelFilter {
        match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Initialize the Boomer logger which writes to standard out and, optionally, to
    /// a log file.
    ///
    /// Only one logger can be installed per process: if one already exists it is kept,
    /// and the failure is logged rather than returned. A log file that can't be created
    /// is returned as [`BoomerError::Io`].
    pub fn initialize_logger(&self) -> Result<(), BoomerError> {
        let debug_level = self.debug_level();
        let log_level = self.log_file_level();

        // Open the log file if configured.
        let log_file: Option<PathBuf> = if !self.log_file.is_empty() {
            Some(PathBuf::from(&self.log_file))
        } else {
            None
        };

        let result = if let Some(log_to_file) = log_file.as_ref() {
            let file = std::fs::File::create(log_to_file)?;
            CombinedLogger::init(vec![
                SimpleLogger::new(debug_level, Config::default()),
                WriteLogger::new(log_level, Config::default(), file),
            ])
        } else {
            CombinedLogger::init(vec![SimpleLogger::new(debug_level, Config::default())])
        };

        if let Err(e) = result {
            info!("failed to initialize CombinedLogger: {}", e);
        }

        if let Some(log_to_file) = log_file {
            info!("Writing to log file: {}", log_to_file.display());
        }
        info!("Output verbosity level: {}", debug_level);
        info!("Logfile verbosity level: {}", log_level);

        Ok(())
    }
}

/// How downstream printers should render a [`Report`](../report/struct.Report.html).
///
/// The aggregator never looks at this value; it is carried on the report for the
/// printer that consumes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Human readable summary (default).
    #[default]
    Summary,
    /// Compact JSON document.
    Json,
    /// Indented JSON document.
    Pretty,
}

/// Allow `--output` from the command line using text variations on supported
/// `ReportFormat`s by implementing [`FromStr`].
impl FromStr for ReportFormat {
    type Err = BoomerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Use a [`RegexSet`] to match string representations of `ReportFormat`,
        // returning the appropriate enum value. Also match abbreviations and synonyms.
        let format = RegexSet::new([
            r"(?i)^(summary|sum|text|txt|table)$",
            r"(?i)^(json|js)$",
            r"(?i)^(pretty|json-pretty|pretty-json)$",
        ])
        .expect("failed to compile format RegexSet");
        let matches = format.matches(s);
        if matches.matched(0) {
            Ok(ReportFormat::Summary)
        } else if matches.matched(1) {
            Ok(ReportFormat::Json)
        } else if matches.matched(2) {
            Ok(ReportFormat::Pretty)
        } else {
            Err(BoomerError::InvalidOption {
                option: format!("ReportFormat::{:?}", s),
                value: s.to_string(),
                detail: "Invalid format, expected: summary, json or pretty".to_string(),
            })
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportFormat::Summary => f.write_str("summary"),
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Pretty => f.write_str("pretty"),
        }
    }
}
