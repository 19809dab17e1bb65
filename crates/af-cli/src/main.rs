//! Accelade Filters RS command-line tool
//!
//! Loads constraint definitions, then compiles, inspects or evaluates rule
//! trees submitted by query builder clients.

use std::process::ExitCode;

use af_core::FilterError;

mod args;
mod commands;
mod definitions;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = args::parse_args();
    match commands::handle_command(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.downcast_ref::<FilterError>() {
            Some(filter_err) if filter_err.is_too_complex() => {
                tracing::error!(code = filter_err.error_code(), "{}", filter_err);
                eprintln!("error: {}", filter_err);
                Ok(ExitCode::from(2))
            }
            _ => Err(err),
        },
    }
}

/// Initialize tracing/logging on stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,af_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
