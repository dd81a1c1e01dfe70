//! Provider domain model

use super::ids::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed id of the shared guest provider
pub const GUEST_PROVIDER_ID: &str = "fieldsync_provider_guest";

/// Display name of the shared guest provider
pub const GUEST_PROVIDER_NAME: &str = "Guest User";

/// A care provider that can place orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Provider id
    pub id: ProviderId,

    /// Display name
    pub name: String,

    /// When the provider was first stored
    pub date_created: DateTime<Utc>,
}

impl Provider {
    /// Creates a new provider
    pub fn new(id: ProviderId, name: impl Into<String>, date_created: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            date_created,
        }
    }

    /// Whether this is the shared guest provider
    pub fn is_guest(&self) -> bool {
        self.id.as_str() == GUEST_PROVIDER_ID
    }
}
