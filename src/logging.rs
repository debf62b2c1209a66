use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
#[cfg(test)]
use std::sync::Once;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins; otherwise the level follows `-v`/`-q`.
pub fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity, quiet)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(path) = log_file {
        let file = std::fs::File::create(path)?;
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .json();
        tracing::subscriber::set_global_default(subscriber.with(file_layer))?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

fn default_filter(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbosity {
        0 => "mantis2gitlab=info".to_string(),
        1 => "mantis2gitlab=debug".to_string(),
        2 => "mantis2gitlab=trace".to_string(),
        _ => "mantis2gitlab=trace,reqwest=debug,hyper=debug".to_string(),
    }
}

/// Route test output through the libtest capture writer.
#[cfg(test)]
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("mantis2gitlab=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
