//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - Human-readable console output
//! - Optional JSON file output with daily or hourly rotation
//! - Level control through config, `--log-level` or `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use fieldsync::logging::init_logging;
//! use fieldsync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log one delivered sync page
///
/// # Example
///
/// ```no_run
/// use fieldsync::log_sync_page;
/// use fieldsync::domain::RecordKind;
///
/// log_sync_page!(RecordKind::Orders, 100, true, "eyJ2IjoxfQ");
/// ```
#[macro_export]
macro_rules! log_sync_page {
    ($kind:expr, $count:expr, $more:expr, $bookmark:expr) => {
        tracing::info!(
            kind = %$kind,
            count = $count,
            more = $more,
            bookmark = %$bookmark,
            "Sync page delivered"
        );
    };
}

/// Log a change to an order revision chain
///
/// # Example
///
/// ```no_run
/// use fieldsync::log_chain_event;
///
/// log_chain_event!("revised", "stable-id", "new-revision-id");
/// ```
#[macro_export]
macro_rules! log_chain_event {
    ($event:expr, $stable_id:expr, $revision_id:expr) => {
        tracing::info!(
            event = $event,
            stable_id = %$stable_id,
            revision_id = %$revision_id,
            "Order chain updated"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use fieldsync::log_error_with_context;
/// use fieldsync::domain::FieldsyncError;
///
/// let error = FieldsyncError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{FieldsyncError, RecordKind};

    #[test]
    fn test_macros_expand_without_subscriber() {
        log_sync_page!(RecordKind::Patients, 2usize, true, "bookmark");
        log_chain_event!("created", "stable", "revision");
        log_error_with_context!(FieldsyncError::Other("boom".to_string()), "test");
    }
}
