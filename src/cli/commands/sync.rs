//! Sync command implementation
//!
//! Runs the sync protocol from the command line and prints each response.

use super::{open_service, print_json, report, EXIT_OK};
use crate::domain::RecordKind;
use clap::Args;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Record kind: patients, observations or orders
    pub kind: RecordKind,

    /// Bookmark returned by the previous call
    #[arg(short, long)]
    pub bookmark: Option<String>,

    /// Page size (defaults to the configured size for the kind)
    #[arg(short, long)]
    pub max_results: Option<usize>,

    /// Skip voided records
    #[arg(long)]
    pub exclude_voided: bool,

    /// Keep fetching pages until the store reports no more
    #[arg(long)]
    pub all: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let service = match open_service(config_path).await {
            Ok(service) => service,
            Err(code) => return Ok(code),
        };

        let mut request = service.default_request(self.kind, self.bookmark.as_deref());
        if let Some(max_results) = self.max_results {
            request.max_results = max_results;
        }
        if self.exclude_voided {
            request.include_voided = false;
        }

        let mut pages = 0usize;
        loop {
            let response = match service.sync(self.kind, &request).await {
                Ok(response) => response,
                Err(e) => return Ok(report(&e, "Sync failed")),
            };
            print_json(&response)?;
            pages += 1;

            let more = response["more"].as_bool().unwrap_or(false);
            if !(self.all && more) {
                break;
            }
            request.bookmark = response["bookmark"].as_str().map(str::to_string);
        }

        tracing::debug!(kind = %self.kind, pages, "Sync command finished");
        Ok(EXIT_OK)
    }
}
