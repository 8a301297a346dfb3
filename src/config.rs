//! Command-line configuration.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// HuffPost Pollster aggregate of the 2016 Trump vs. Clinton general election polls.
pub const DEFAULT_SOURCE: &str =
    "http://elections.huffingtonpost.com/pollster/2016-general-election-trump-vs-clinton.csv";

/// pollscope - poll dataset summaries and campaign timeline charts
///
/// Loads the poll CSV, keeps Likely and Registered Voter polls, prints
/// AVG/STDEV tables for all, RV and LV polls and renders the charts as PNG.
///
/// Examples:
///   pollscope
///   pollscope --source ./polls.csv --output-dir out --no-show
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL or local path of the poll CSV
    #[arg(
        short,
        long,
        value_name = "URL|PATH",
        default_value = DEFAULT_SOURCE,
        env = "POLLSCOPE_SOURCE"
    )]
    pub source: String,

    /// Directory the chart images and manifest are written to
    #[arg(short, long, default_value = "charts", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Chart width in pixels
    #[arg(long, default_value = "1200")]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Do not open the rendered charts
    #[arg(long)]
    pub no_show: bool,

    /// Print the summary tables only
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the log level based on verbosity flags.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_pollster_csv() {
        let args = Args::try_parse_from(["pollscope"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("charts"));
        assert_eq!(args.chart_size(), (1200, 480));
        assert!(!args.no_show);
        assert_eq!(args.log_level(), Level::INFO);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "pollscope",
            "--source",
            "polls.csv",
            "-o",
            "out",
            "--no-show",
            "--no-charts",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.source, "polls.csv");
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.no_show);
        assert!(args.no_charts);
        assert_eq!(args.log_level(), Level::DEBUG);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
