//! csskit command line
//!
//! Parses stylesheets, prints them back and writes their source maps.

pub mod args;
pub mod process;

pub use args::{Cli, MapMode};
pub use process::{expand_inputs, output_path, process_file, run, Processed, Settings};

/// Install the tracing subscriber. Without `-v` the filter comes from
/// `CSSKIT_LOG` and defaults to warnings only.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_env("CSSKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
