mod cli;
mod orchestrator;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag as signal_flag;
use std::panic;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use wavmp3_core::{Configuration, ExitSeverity, OutputSink, ReturnCode, WorkerPool};

fn run_app(return_code: &Arc<ReturnCode>) -> Result<()> {
    let args = Args::parse();
    terminal::init_logging(args.verbose);

    let mut config: Configuration = args.into();
    let sink = OutputSink::new();

    let termination_requested = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_flag::register(signal, Arc::clone(&termination_requested))
            .context("installing signal handler")?;
    }

    if let Some(clamped) = config.clamp_threads(num_cpus::get()) {
        log::warn!("clamping thread count down to {clamped} (hardware concurrency)");
    }
    let config = Arc::new(config);

    let pool = match WorkerPool::new(config.number_of_threads) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("{err}");
            return_code.raise(ExitSeverity::ThreadingFailure);
            return Ok(());
        }
    };
    orchestrator::run(&config, &pool, &sink, return_code, &termination_requested);
    drop(pool); // joins every worker, so every submitted job has finished converting by now

    Ok(())
}

fn main() {
    let return_code = Arc::new(ReturnCode::new());

    let outcome = {
        let return_code = Arc::clone(&return_code);
        panic::catch_unwind(move || run_app(&return_code))
    };

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            log::error!("fatal: {err:#}");
            return_code.raise(ExitSeverity::UncaughtException);
        }
        Err(_) => {
            log::error!("fatal: an internal error occurred");
            return_code.raise(ExitSeverity::UncaughtException);
        }
    }

    process::exit(i32::from(return_code.get()));
}
