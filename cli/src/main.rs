use std::path::Path;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;

use bitprobe_core::{Phase, PhaseController, RunError, RunSummary};

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(summary) => {
            print_summary(&summary);
            match summary.phase {
                Phase::Done => 0,
                _ => 1,
            }
        }
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<RunSummary, RunError> {
    let args = cli::Args::parse();

    let mut config = bitprobe_core::config::load(args.config.as_deref())
        .map_err(|e| RunError::Config(e.to_string()))?;
    args.apply_to(&mut config);

    let logging = config.logging.clone();
    let registry = bitprobe_collectors::default_registry()?;
    let controller = PhaseController::init(config, &args.output, registry)?
        .with_progress(!args.no_progress);

    // The run's own logs directory only exists after init, so the
    // subscriber comes up second; everything before this line is silent.
    init_tracing(&logging, &controller.context().layout.logs)
        .map_err(RunError::Config)?;
    let ctx = controller.context().clone();
    tracing::info!(run_id = %ctx.run_id, root = %ctx.layout.root.display(), "collection run starting");
    println!(
        "BitProbe run {} -> {}",
        ctx.run_id,
        ctx.layout.root.display()
    );

    controller.run().await
}

fn init_tracing(
    logging: &bitprobe_core::config::LoggingConfig,
    log_dir: &Path,
) -> Result<(), String> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let appender = tracing_appender::rolling::never(log_dir, "bitprobe.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = logging.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| e.to_string())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "Run {} finished in {:.1}s ({})",
        summary.run_id,
        summary.duration.as_secs_f64(),
        summary.counts
    );
    for warning in &summary.warnings {
        println!("WARNING: {warning}");
    }
    if let Some(path) = &summary.master_report {
        println!("Master report: {}", path.display());
    }
}

fn exit_code_for_error(e: &RunError) -> i32 {
    // 0: run reached Done
    // 1: run aborted (master report could not be written)
    // 2: invalid configuration
    match e {
        RunError::Config(_) => 2,
        RunError::SynthesisIo { .. } => 1,
        RunError::Phase(_) | RunError::Io(_) => 1,
    }
}
