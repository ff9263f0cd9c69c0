//! Bridge binary: serves the crew over HTTP.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: bridge enrollment key (required)
//! - `DOMAIN_NAME`: public domain of this host (required)
//! - `OPENAI_API_KEY`: key for the crew's model
//! - `PORT`: HTTP port (default: 6000)
//! - `RUST_LOG`: tracing filter (default: "info,mit_ai_studio=debug")
//!
//! Exits with code 2 when either required variable is missing.

use std::process::ExitCode;
use std::sync::Arc;

use mit_ai_studio::bridge::{resolve_or_exit, start_bridge, HttpBridge, StudioHandler};
use mit_ai_studio::{Crew, StudioConfig};

#[tokio::main]
async fn main() -> ExitCode {
    mit_ai_studio::logging::init_tracing();

    let credentials = match resolve_or_exit(|key| std::env::var(key).ok()) {
        Ok(credentials) => credentials,
        Err(code) => return ExitCode::from(code),
    };

    let config = StudioConfig::from_env();
    let crew = match Crew::from_config(&config) {
        Ok(crew) => crew,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let handler = StudioHandler::new(Arc::new(crew), config.preference_path());
    let bridge = HttpBridge::new(config.port);

    match start_bridge(&bridge, Arc::new(handler), credentials).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
