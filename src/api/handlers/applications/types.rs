//! Request/response types for application endpoints.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    /// RFC 3339, UTC.
    pub created_at: String,
}

/// A stored application row.
#[derive(Debug, Clone)]
pub(super) struct ApplicationRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for ApplicationResponse {
    fn from(record: ApplicationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            full_name: record.full_name,
            email: record.email,
            phone: record.phone,
            description: record.description,
            created_at: record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Validated, normalized submission ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NewApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
}
