//! ping-cli - one-shot health check from the command line
//!
//! Runs the same probe sequence as the HTTP endpoint and always prints the
//! diagnostic tables; intended for local debugging and deployment checks.
//! Exit code 0 means overall success, 1 means at least one probe errored.

use clap::Parser;
use pingd::core::probe::SettingsSource;
use pingd::core::runner::Runner;
use pingd::utils::logging::{self, TracingLogger};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(
    name = "ping-cli",
    about = "Run the dependency health checks once and print the diagnostic tables"
)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, env = "PING_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Capture the epoch first; it anchors the preboot row.
    let epoch = Instant::now();

    dotenvy::dotenv().ok();
    logging::init_tracing();
    let args = Args::parse();

    let runner = Runner::new(
        SettingsSource::Load {
            config_path: args.config,
        },
        Arc::new(TracingLogger),
        epoch,
    );
    let report = runner.run().await;

    print!("{}", report.body(false));
    println!("\nDebug code: {}", report.debug_token);
    println!();
    println!("{}", report.status.text_table("\n"));
    println!();
    println!("{}", report.profile.text_table("\n"));

    // Exit immediately; nothing the runtime might still have scheduled
    // should delay or alter the verdict.
    std::process::exit(if report.code == 200 { 0 } else { 1 });
}
