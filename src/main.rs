//! Pollscope - Poll Dataset Summaries & Campaign Timeline Charts
//!
//! Exit codes:
//!   0 - Success
//!   1 - Load, analysis or rendering failure

use anyhow::{Context, Result};
use pollscope::charts::ChartRenderer;
use pollscope::config::Args;
use pollscope::data::PollLoader;
use pollscope::report;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse_args();
    init_logging(&args);

    info!("pollscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let raw = PollLoader::load(&args.source)
        .with_context(|| format!("Failed to load poll data from {}", args.source))?;

    let analysis = report::analyze(&raw).context("Failed to analyze poll data")?;
    print!("{}", analysis.summary_report());

    if args.no_charts {
        return Ok(());
    }

    let renderer = ChartRenderer::new(&args.output_dir, args.chart_size());
    let paths = renderer
        .render_all(&analysis.charts)
        .context("Failed to render charts")?;

    if !args.no_show {
        renderer.show(&paths);
    }

    Ok(())
}

/// Logs go to stderr so that stdout carries only the summary tables.
fn init_logging(args: &Args) {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    fmt()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
