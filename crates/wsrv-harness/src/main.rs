#![forbid(unsafe_code)]

//! wsrv harness binary entry point.
//!
//! Opens the configured keyboard and pointer devices, registers a logging
//! input receiver, and runs the message loop on the main thread until the
//! process is signalled or the loop hits a fatal error.

mod cli;
mod input_log;

use std::io;
use std::process;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wsrv_runtime::{EventLoop, LoopConfig, LoopContext};

use crate::input_log::InputLog;

/// Log filter variable.
const ENV_LOG: &str = "WSRV_LOG";

fn main() {
    let opts = cli::Opts::parse();
    init_logging();

    if let Err(e) = spawn_signal_thread() {
        warn!(error = %e, "signal handlers not installed");
    }

    let config = opts.apply(LoopConfig::from_env());
    info!(
        keyboard = %config.keyboard_device.display(),
        pointer = %config.pointer_device.display(),
        "starting message loop"
    );

    let context = match LoopContext::new() {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, "failed to create loop context");
            eprintln!("Failed to initialize: {e}");
            process::exit(1);
        }
    };

    let input = Arc::new(InputLog::default());
    let input_id = context.register(&input);

    match EventLoop::open(&config, Arc::clone(&context), input_id) {
        Ok(event_loop) => event_loop.run_forever(),
        Err(e) => {
            error!(error = %e, "failed to open input devices");
            eprintln!("Failed to open input devices: {e}");
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Exit with the conventional `128 + signal` status on SIGINT or SIGTERM.
///
/// The loop thread blocks indefinitely, so termination is handled here.
fn spawn_signal_thread() -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
    std::thread::Builder::new()
        .name("wsrv-signals".into())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                warn!(signal, "termination signal received, exiting");
                process::exit(128 + signal);
            }
        })?;
    Ok(())
}
