//! WP Site Health CLI - Compile a diagnostic report for a WordPress install

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use wp_site_health::{
    Collector, ConnectionTester, FullSyncStatus, JsonFileStore, ModuleState, RequestContext,
    StoredQueue, info_sections,
    output::{OutputConfig, OutputFormat, OutputVisibility, output_report},
};

/// Option names holding the two sync queues
const SYNC_QUEUE_OPTION: &str = "sync_queue";
const FULL_SYNC_QUEUE_OPTION: &str = "full_sync_queue";

/// Site health reporter - collects configuration, sync, and connection diagnostics
#[derive(Parser, Debug)]
#[command(name = "wp-site-health")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the exported options JSON file
    options: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "output", default_value = "human", value_enum)]
    output_format: OutputFormatArg,

    /// Exclude private entries (tokens) for a copy-pasteable report
    #[arg(long = "shareable")]
    shareable: bool,

    /// Skip the HTTP connection checks and run only local ones
    #[arg(long = "offline")]
    offline: bool,

    /// Override the site URL probed by the connection checks
    #[arg(long = "site-url")]
    site_url: Option<String>,
}

/// Output format argument
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    None,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::None => OutputFormat::None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Print banner for human output
    if matches!(args.output_format, OutputFormatArg::Human) {
        print_banner();
    }

    let visibility = if args.shareable {
        OutputVisibility::Shareable
    } else {
        OutputVisibility::All
    };
    let output_config = OutputConfig::new(args.output_format.into(), visibility);

    match run_report(&args, &output_config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_report(args: &Args, output_config: &OutputConfig) -> wp_site_health::Result<()> {
    let store = JsonFileStore::load(&args.options)?;
    let request = RequestContext::from_env();

    let mut tester = ConnectionTester::new(&store)?.offline(args.offline);
    if let Some(site_url) = &args.site_url {
        tester = tester.site_url(site_url)?;
    }
    let cxn_tests = tester.run().await;

    let sync_queue = StoredQueue::new(&store, SYNC_QUEUE_OPTION);
    let full_sync_queue = StoredQueue::new(&store, FULL_SYNC_QUEUE_OPTION);
    let full_sync = FullSyncStatus::from_store(&store);

    let mut collector = Collector::new(&store, &request, &cxn_tests)
        .sync_queue(&sync_queue)
        .full_sync_queue(&full_sync_queue)
        .options_path(&args.options);
    if let Some(full_sync) = &full_sync {
        collector = collector.full_sync(full_sync);
    }

    let report = collector.collect();
    let state = ModuleState::from_store(&store);
    let sections = info_sections(&report, &state);

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    output_report(&report, &sections, output_config, &mut writer)?;

    Ok(())
}

fn print_banner() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("WP Site Health v{}", VERSION);
    println!();
}
