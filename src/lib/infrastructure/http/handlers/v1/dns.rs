//! DNS record handlers

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::dns::{DnsRecordKind, PlannedRecord};

pub mod create_dkim;
pub mod create_mx;
pub mod create_spf;
pub mod list_records;
pub mod verify;

/// A newly planned record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlannedRecordResponse {
    /// Record id
    pub id: Uuid,

    /// Owner name to publish under
    #[schema(example = "example.com")]
    pub name: String,

    /// Record kind
    pub kind: DnsRecordKind,

    /// Record data to publish
    #[schema(example = "10 mx.example.com")]
    pub value: String,

    /// What was planned
    #[schema(example = "Created MX record for example.com pointing to mx.example.com with priority 10")]
    pub message: String,
}

impl From<PlannedRecord> for PlannedRecordResponse {
    fn from(planned: PlannedRecord) -> Self {
        Self {
            id: planned.record.id,
            name: planned.record.name,
            kind: planned.record.kind,
            value: planned.record.value,
            message: planned.message,
        }
    }
}
