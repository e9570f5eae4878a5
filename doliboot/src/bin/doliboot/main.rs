//! Entry point for the doliboot container bootstrap.

use clap::Parser;
use doliboot::db::{MariadbClient, MysqlConnector};
use doliboot::{BootArgs, BootConfig, BootLayout, BootPipeline, BootResult};
use std::convert::Infallible;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("[PANIC] doliboot panicked: {}", panic_info);
        std::process::exit(1);
    }));

    // Respects RUST_LOG, defaults to "info"
    if let Err(e) = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
    {
        eprintln!("[ERROR] Failed to initialize tracing: {}", e);
    }

    let args = BootArgs::parse();

    // Only returns on failure; success replaces this process
    let Err(e) = boot(args).await;
    error!("{}", e);
    std::process::exit(1);
}

async fn boot(args: BootArgs) -> BootResult<Infallible> {
    let mut layout = BootLayout::new(&args.root);
    if let Some(archive) = &args.archive {
        layout = layout.with_archive(archive);
    }

    let config = BootConfig::from_args(args)?;
    info!(
        version = %config.desired_version,
        uid = config.identity.uid,
        gid = config.identity.gid,
        root = %layout.root().display(),
        "Starting doliboot"
    );

    let connector = MysqlConnector::new(&config.db);
    let scripts = MariadbClient::new(&config.db);
    let report = BootPipeline::new(&layout, &config)
        .run(&connector, &scripts)
        .await?;

    report.handoff.exec()
}
