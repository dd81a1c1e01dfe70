//! CLI command implementations
//!
//! Commands return process exit codes:
//! 0 success, 2 configuration error, 3 client error or not found,
//! 4 store connection error, 5 fatal error.

pub mod init;
pub mod orders;
pub mod providers;
pub mod sync;
pub mod validate;

use crate::config::load_config;
use crate::core::service::FieldsyncService;
use crate::domain::{FieldsyncError, StoreError};
use crate::log_error_with_context;

/// Successful run
pub const EXIT_OK: i32 = 0;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// Bad client input or unknown record
pub const EXIT_CLIENT: i32 = 3;
/// The store could not be reached
pub const EXIT_CONNECTION: i32 = 4;
/// Anything else
pub const EXIT_FATAL: i32 = 5;

/// Maps an error onto the exit code reported for it
pub fn exit_code_for(err: &FieldsyncError) -> i32 {
    match err {
        FieldsyncError::Configuration(_) => EXIT_CONFIG,
        FieldsyncError::Store(StoreError::ConnectionFailed(_) | StoreError::Timeout(_))
        | FieldsyncError::SyncFetch(StoreError::ConnectionFailed(_) | StoreError::Timeout(_)) => {
            EXIT_CONNECTION
        }
        e if e.is_client_error() => EXIT_CLIENT,
        _ => EXIT_FATAL,
    }
}

/// Logs and prints an error, returning its exit code
pub(crate) fn report(err: &FieldsyncError, context: &str) -> i32 {
    log_error_with_context!(err, context);
    eprintln!("❌ {context}");
    eprintln!("   Error: {err}");
    exit_code_for(err)
}

/// Loads the configuration and builds the service, or returns the exit code
pub(crate) async fn open_service(config_path: &str) -> std::result::Result<FieldsyncService, i32> {
    let config = load_config(config_path)
        .map_err(|e| report(&e, "Failed to load configuration file"))?;
    FieldsyncService::from_config(&config)
        .await
        .map_err(|e| report(&e, "Failed to open store"))
}

/// Prints a JSON value the way every command does
pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
