use brrtparam::cli::run_cli;
use brrtparam::logging::{init_logging_with_config, LogConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = init_logging_with_config(&LogConfig::from_env()) {
        eprintln!("Warning: {e:#}");
    }
    match run_cli() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
