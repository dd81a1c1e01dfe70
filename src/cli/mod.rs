//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Fieldsync - incremental sync and order revision chains
#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(version, about, long_about = None)]
#[command(author = "Fieldsync Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fieldsync.toml", env = "FIELDSYNC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FIELDSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch records changed since a bookmark
    Sync(commands::sync::SyncArgs),

    /// Create, read, update and delete orders
    Orders(commands::orders::OrdersArgs),

    /// Ensure the guest provider exists and list providers
    Providers(commands::providers::ProvidersArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::orders::OrdersCommand;
    use crate::domain::RecordKind;

    #[test]
    fn test_cli_parse_sync() {
        let cli = Cli::parse_from(["fieldsync", "sync", "observations", "--max-results", "2"]);
        assert_eq!(cli.config, "fieldsync.toml");
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.kind, RecordKind::Observations);
                assert_eq!(args.max_results, Some(2));
                assert!(!args.exclude_voided);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["fieldsync", "sync", "encounters"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config_and_log_level() {
        let cli = Cli::parse_from([
            "fieldsync",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "providers",
        ]);
        assert_eq!(cli.config, "custom.toml");
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Providers(_)));
    }

    #[test]
    fn test_cli_parse_order_update() {
        let cli = Cli::parse_from([
            "fieldsync",
            "orders",
            "update",
            "abc",
            r#"{"start_millis":null}"#,
            "--expect-revision",
            "def",
        ]);
        match cli.command {
            Commands::Orders(args) => match args.command {
                OrdersCommand::Update {
                    uuid,
                    expect_revision,
                    ..
                } => {
                    assert_eq!(uuid, "abc");
                    assert_eq!(expect_revision.as_deref(), Some("def"));
                }
                other => panic!("unexpected orders command {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_validate_config_and_init() {
        let cli = Cli::parse_from(["fieldsync", "validate-config", "--check-connection"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));

        let cli = Cli::parse_from(["fieldsync", "init", "--memory"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
