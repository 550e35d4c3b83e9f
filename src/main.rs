use std::path::PathBuf;

use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod config;
pub mod outputs;
pub mod secrets;
pub mod writer;

const LOG_ENV_VAR: &str = "TFSECRETS_LOG";

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Outputs(#[from] outputs::Error),
}

fn main() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("tfsecrets=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(error) = run() {
        error!(%error, "unable to generate terraform files");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let config_path = PathBuf::from(config::CONFIG_FILE_NAME);
    let config = config::load(&config_path)?;

    outputs::Generator::new(config).generate_outputs()?;
    return Ok(());
}
