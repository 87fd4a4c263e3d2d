use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GraphNodeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GraphRelationshipRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_node_id: Uuid,
    pub target_node_id: Uuid,
    pub relationship_type: String,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}
