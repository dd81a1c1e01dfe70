//! Validate config command implementation
//!
//! Loads and validates the configuration file and, on request, checks that
//! the configured store is reachable.

use super::{report, EXIT_CONFIG, EXIT_CONNECTION, EXIT_OK};
use crate::adapters::store::create_store;
use crate::config::schema::StoreTarget;
use crate::config::{load_config, redact_url_password};
use crate::domain::FieldsyncError;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also connect to the store and apply its schema
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Bookmark Buffer: {} ms", config.sync.buffer_millis);
        println!(
            "  Page Sizes: patients={} observations={} orders={}",
            config.sync.patients_page_size,
            config.sync.observations_page_size,
            config.sync.orders_page_size
        );
        println!("  Include Voided: {}", config.sync.include_voided);
        match config.store_target {
            StoreTarget::Memory => {
                println!("  Store: memory (data is not persisted)");
                match config.memory.fixtures_path {
                    Some(ref path) => println!("  Fixtures: {path}"),
                    None => println!("  Fixtures: none (store starts empty)"),
                }
            }
            StoreTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Store: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_url_password(pg_config.connection_string.expose_secret().as_ref())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }
        println!();

        if !self.check_connection {
            return Ok(EXIT_OK);
        }

        let stores = match create_store(&config).await {
            Ok(stores) => stores,
            Err(e) => return Ok(report(&e, "Failed to create store")),
        };
        if let Err(e) = stores.admin.test_connection().await {
            report(&FieldsyncError::Store(e), "Store is not reachable");
            return Ok(EXIT_CONNECTION);
        }
        if let Err(e) = stores.admin.ensure_schema().await {
            return Ok(report(&FieldsyncError::Store(e), "Failed to apply schema"));
        }

        println!("✅ Connected to {} store", stores.admin.backend_name());
        Ok(EXIT_OK)
    }
}
