//! Init command implementation
//!
//! Writes a starter `fieldsync.toml`. With `--memory` it also writes a
//! `fixtures.json` next to it so the in-memory store has a patient to work
//! with.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

const SAMPLE_FIXTURES: &str = r#"{
  "patients": [
    {
      "uuid": "patient-1",
      "content": {"given_name": "Amara", "family_name": "Okafor"},
      "date_created": "2024-01-01T00:00:00Z",
      "date_modified": "2024-01-01T00:00:00Z"
    }
  ],
  "observations": [
    {
      "uuid": "observation-1",
      "patient_id": "patient-1",
      "observed_at": "2024-01-02T08:00:00Z",
      "concept": "weight_kg",
      "value": 61.5,
      "date_modified": "2024-01-02T08:00:00Z"
    }
  ]
}
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "fieldsync.toml")]
    pub output: String,

    /// Target the in-memory store instead of PostgreSQL
    #[arg(long)]
    pub memory: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let fixtures = self.fixtures_path();
        if self.memory && !fixtures.exists() {
            if let Err(e) = fs::write(&fixtures, SAMPLE_FIXTURES) {
                println!("❌ Failed to write fixtures file {}", fixtures.display());
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
            println!("✅ Fixtures file created: {}", fixtures.display());
        }

        let contents = Self::generate_config(self.memory, &fixtures.to_string_lossy());
        match fs::write(&self.output, contents) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                if !self.memory {
                    println!("  1. Set FIELDSYNC_DATABASE_URL (or add it to .env)");
                } else {
                    println!("  1. Add patients to the fixtures file; the memory store is rebuilt on every run");
                }
                println!("  2. Validate configuration: fieldsync validate-config --check-connection");
                println!("  3. Fetch changes: fieldsync sync observations");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    fn fixtures_path(&self) -> PathBuf {
        Path::new(&self.output).with_file_name("fixtures.json")
    }

    fn generate_config(memory: bool, fixtures_path: &str) -> String {
        let store_target = if memory { "memory" } else { "postgresql" };
        let postgresql_lines = [
            "[postgresql]",
            "connection_string = \"${FIELDSYNC_DATABASE_URL}\"",
            "max_connections = 10",
            "connection_timeout_seconds = 30",
            "statement_timeout_seconds = 60",
            "ssl_mode = \"prefer\"",
        ];
        let prefix = if memory { "# " } else { "" };
        let fixtures_prefix = if memory { "" } else { "# " };
        let fixtures_path = toml::Value::String(fixtures_path.to_string());
        let postgresql: String = postgresql_lines
            .iter()
            .map(|line| format!("{prefix}{line}\n"))
            .collect();

        format!(
            r#"# Fieldsync Configuration File

# development | staging | production
environment = "development"

# postgresql | memory
store_target = "{store_target}"

[application]
log_level = "info"

[sync]
# Bookmarks are held this far behind the server clock so rows from
# transactions still committing are picked up on the next call
buffer_millis = 30000
observations_page_size = 100
patients_page_size = 100
orders_page_size = 100
include_voided = true

{postgresql}
# The memory store keeps nothing between runs; seed it with patients and
# observations from a JSON file
[memory]
{fixtures_prefix}fixtures_path = {fixtures_path}

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{create_store, OrderStore};
    use crate::config::load_config;
    use crate::domain::PatientId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generated_memory_config_loads() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("fieldsync.toml");
        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            memory: true,
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        let config = load_config(&output).unwrap();
        assert_eq!(config.sync.buffer_millis, 30_000);

        // The sample fixtures give the store a patient to order for
        let stores = create_store(&config).await.unwrap();
        let patient = PatientId::new("patient-1").unwrap();
        assert!(stores.orders.patient_exists(&patient).await.unwrap());

        // A second run without --force refuses to overwrite
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
    }

    #[test]
    fn test_postgresql_config_leaves_fixtures_commented() {
        let config = InitArgs::generate_config(false, "fixtures.json");
        assert!(config.contains("# fixtures_path = \"fixtures.json\""));
        assert!(config.contains("\nconnection_string = "));
    }
}
