//! Orders command implementation

use super::{open_service, print_json, report, EXIT_CLIENT, EXIT_OK};
use crate::core::chain::ResolvedOrder;
use crate::domain::{PatientId, RevisionId};
use clap::{Args, Subcommand};
use serde_json::{json, Value};

/// Arguments for the orders command
#[derive(Args, Debug)]
pub struct OrdersArgs {
    /// Order operation
    #[command(subcommand)]
    pub command: OrdersCommand,
}

/// Order operations
#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    /// List the current version of every live order
    List {
        /// Only orders for this patient
        #[arg(long)]
        patient: Option<String>,
    },

    /// Show the current version of one order
    Get {
        /// Stable id (or any revision id) of the order
        uuid: String,
    },

    /// Create an order from a JSON body
    Create {
        /// JSON with patient_uuid, instructions and optional uuid, start_millis, stop_millis
        body: String,
    },

    /// Apply a partial JSON update to an order
    Update {
        /// Stable id (or any revision id) of the order
        uuid: String,

        /// JSON with the fields to change
        body: String,

        /// Refuse the update unless this is still the current revision, as
        /// printed under "revision" by get, create and update
        #[arg(long)]
        expect_revision: Option<String>,
    },

    /// Delete an order
    Delete {
        /// Stable id (or any revision id) of the order
        uuid: String,

        /// Void reason stored on every revision
        #[arg(long, default_value = "Deleted by client")]
        reason: String,
    },
}

fn revision_id(raw: &str) -> Result<RevisionId, i32> {
    RevisionId::new(raw).map_err(|e| {
        eprintln!("❌ Invalid order id '{raw}': {e}");
        EXIT_CLIENT
    })
}

fn json_body(raw: &str) -> Result<Value, i32> {
    serde_json::from_str(raw).map_err(|e| {
        eprintln!("❌ Body is not valid JSON: {e}");
        EXIT_CLIENT
    })
}

impl OrdersArgs {
    /// Execute the orders command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let service = match open_service(config_path).await {
            Ok(service) => service,
            Err(code) => return Ok(code),
        };

        let outcome: Result<Value, i32> = match &self.command {
            OrdersCommand::List { patient } => {
                let patient = match patient.as_deref().map(PatientId::new).transpose() {
                    Ok(patient) => patient,
                    Err(e) => {
                        eprintln!("❌ Invalid patient id: {e}");
                        return Ok(EXIT_CLIENT);
                    }
                };
                service
                    .list_orders(patient.as_ref())
                    .await
                    .map(|orders| Value::Array(orders.iter().map(ResolvedOrder::to_json).collect()))
                    .map_err(|e| report(&e, "Failed to list orders"))
            }
            OrdersCommand::Get { uuid } => match revision_id(uuid) {
                Ok(id) => service
                    .get_order(&id)
                    .await
                    .map(|order| order.to_json())
                    .map_err(|e| report(&e, "Failed to load order")),
                Err(code) => Err(code),
            },
            OrdersCommand::Create { body } => match json_body(body) {
                Ok(body) => service
                    .create_order(&body)
                    .await
                    .map(|order| order.to_json())
                    .map_err(|e| report(&e, "Failed to create order")),
                Err(code) => Err(code),
            },
            OrdersCommand::Update {
                uuid,
                body,
                expect_revision,
            } => {
                let parsed = revision_id(uuid).and_then(|id| {
                    let expected = expect_revision.as_deref().map(revision_id).transpose()?;
                    Ok((id, json_body(body)?, expected))
                });
                match parsed {
                    Ok((id, body, expected)) => service
                        .update_order(&id, &body, expected.as_ref())
                        .await
                        .map(|order| order.to_json())
                        .map_err(|e| report(&e, "Failed to update order")),
                    Err(code) => Err(code),
                }
            }
            OrdersCommand::Delete { uuid, reason } => match revision_id(uuid) {
                Ok(id) => service
                    .delete_order(&id, reason)
                    .await
                    .map(|stable_id| json!({ "uuid": stable_id, "voided": true }))
                    .map_err(|e| report(&e, "Failed to delete order")),
                Err(code) => Err(code),
            },
        };

        match outcome {
            Ok(value) => {
                print_json(&value)?;
                Ok(EXIT_OK)
            }
            Err(code) => Ok(code),
        }
    }
}
