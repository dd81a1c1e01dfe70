//! Providers command implementation

use super::{open_service, print_json, report, EXIT_OK};
use clap::Args;
use serde_json::json;

/// Arguments for the providers command
#[derive(Args, Debug)]
pub struct ProvidersArgs {}

impl ProvidersArgs {
    /// Ensure the guest provider exists and list every provider
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let service = match open_service(config_path).await {
            Ok(service) => service,
            Err(code) => return Ok(code),
        };

        if let Err(e) = service.guest_provider().await {
            return Ok(report(&e, "Failed to create guest provider"));
        }
        let providers = match service.list_providers().await {
            Ok(providers) => providers,
            Err(e) => return Ok(report(&e, "Failed to list providers")),
        };

        let listed: Vec<_> = providers
            .iter()
            .map(|p| {
                json!({
                    "uuid": p.id,
                    "name": p.name,
                    "guest": p.is_guest(),
                    "date_created": p.date_created.to_rfc3339(),
                })
            })
            .collect();
        print_json(&json!(listed))?;
        Ok(EXIT_OK)
    }
}
