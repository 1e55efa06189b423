//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration from the environment and open the configured backend.
//! - Wire services and print deterministic version/count lines.

use flashdeck_core::service::generator::UnavailableGenerator;
use flashdeck_core::{core_version, init_logging, AppConfig, AppServices, Backend};
use log::error;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("flashdeck: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(settings) = config.log_settings() {
        init_logging(&settings)?;
    }

    let backend = Backend::open(&config.backend)?;
    let (users, flashcards) = {
        let services = AppServices::wire(&backend, Box::new(UnavailableGenerator))?;
        (
            services.users().count_users()?,
            services.flashcards().count_flashcards()?,
        )
    };

    println!("flashdeck_core version={}", core_version());
    println!("backend={}", backend.name());
    println!("users={users}");
    println!("flashcards={flashcards}");

    backend.close()?;
    Ok(())
}
