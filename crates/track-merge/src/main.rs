use std::process::ExitCode;

// The binary uses the library, not duplicate modules
use track_merge::{Settings, logging, run};

fn main() -> ExitCode {
    logging::setup_logging();
    let settings = Settings::from_cli();

    match run(&settings) {
        Ok(output) => {
            tracing::info!("Wrote merged track to {}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
