//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

fn main() {
    // Library crates log through `log`; the subscriber bridges those records.
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("headway: logging disabled: {err}");
    }

    if let Err(err) = headway_cli::run() {
        if let headway_cli::CliError::ArgumentParsing(parse) = &err {
            parse.exit();
        }
        eprintln!("headway: {err}");
        std::process::exit(1);
    }
}
