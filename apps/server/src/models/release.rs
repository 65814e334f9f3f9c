//! Release DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::release;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReleaseRequest {
    pub version: String,
    pub description: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReleaseResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version: String,
    pub description: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<release::Model> for ReleaseResponse {
    fn from(r: release::Model) -> Self {
        Self {
            id: r.id,
            project_id: r.project_id,
            version: r.version,
            description: r.description,
            released_at: r.released_at,
            created_at: r.created_at,
        }
    }
}
