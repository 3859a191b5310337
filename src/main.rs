use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trayopen::Device;

const USAGE: &str = "Usage : trayopen [device]\n\
                     Result: Returns a 0 if the tray was open and 1 if it was closed";

const TRAY_OPEN: u8 = 0;
const TRAY_NOT_OPEN: u8 = 1;
const BAD_USAGE: u8 = 2;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Prints `msg` and returns the bad-usage exit code, even if stdout is
/// unwritable.
fn bad_usage(msg: &dyn std::fmt::Display) -> ExitCode {
    if let Err(e) = writeln!(io::stdout(), "{}", msg) {
        tracing::debug!(error = %e, "failed to write to stdout");
    }
    ExitCode::from(BAD_USAGE)
}

fn run(path: &Path) -> ExitCode {
    let open = match Device::open(path) {
        Ok(device) => device.is_tray_open(),
        Err(e) => return bad_usage(&e),
    };

    if open {
        ExitCode::from(TRAY_OPEN)
    } else {
        ExitCode::from(TRAY_NOT_OPEN)
    }
}

fn main() -> ExitCode {
    init_logging();

    // The first argument is always the device path, whatever it looks like.
    // Anything after it is ignored.
    match std::env::args_os().nth(1) {
        Some(device) => run(Path::new(&device)),
        None => bad_usage(&USAGE),
    }
}
