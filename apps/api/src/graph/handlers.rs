use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::graph::models::{
    merge_properties, normalize_relationship_type, validate_label, validate_properties,
    CreateNodeRequest, CreateRelationshipRequest, Graph, Neighborhood, NodesQuery,
    UpdateNodeRequest,
};
use crate::graph::repository::{
    count_owned_nodes, delete_node, delete_relationship, fetch_graph, fetch_neighborhood,
    fetch_node, fetch_node_for_update, insert_node, insert_relationship, list_nodes, update_node,
};
use crate::graph::sync::{project_profile, replace_synced_graph, SyncReport};
use crate::models::graph::{GraphNodeRow, GraphRelationshipRow};
use crate::profile::repository::fetch_profile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SyncRequest {
    pub user_id: Uuid,
}

fn node_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Node {id} not found"))
}

/// POST /api/v1/graph/nodes
pub async fn handle_create_node(
    State(state): State<AppState>,
    Json(req): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<GraphNodeRow>), AppError> {
    let label = validate_label(&req.label)?;
    let properties = Value::Object(validate_properties(req.properties)?);
    let node = insert_node(&state.db, req.user_id, &label, &properties).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// GET /api/v1/graph/nodes
pub async fn handle_list_nodes(
    State(state): State<AppState>,
    Query(params): Query<NodesQuery>,
) -> Result<Json<Vec<GraphNodeRow>>, AppError> {
    let label = params.label.as_deref().map(str::trim).filter(|l| !l.is_empty());
    Ok(Json(list_nodes(&state.db, params.user_id, label).await?))
}

/// GET /api/v1/graph/nodes/:id
pub async fn handle_get_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GraphNodeRow>, AppError> {
    let node = fetch_node(&state.db, id, params.user_id)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    Ok(Json(node))
}

/// PATCH /api/v1/graph/nodes/:id
///
/// Top-level property merge; `null` removes a key.
pub async fn handle_update_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNodeRequest>,
) -> Result<Json<GraphNodeRow>, AppError> {
    let label = req.label.as_deref().map(validate_label).transpose()?;
    let patch = validate_properties(req.properties)?;

    let mut tx = state.db.begin().await?;
    let existing = fetch_node_for_update(&mut *tx, id, req.user_id)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    let properties = merge_properties(&existing.properties, patch);
    let label = label.unwrap_or(existing.label);
    let node = update_node(&mut *tx, id, &label, &properties).await?;
    tx.commit().await?;
    Ok(Json(node))
}

/// DELETE /api/v1/graph/nodes/:id
pub async fn handle_delete_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if delete_node(&state.db, id, params.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(node_not_found(id))
    }
}

/// GET /api/v1/graph/nodes/:id/neighbors
pub async fn handle_neighbors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Neighborhood>, AppError> {
    let node = fetch_node(&state.db, id, params.user_id)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    Ok(Json(fetch_neighborhood(&state.db, node).await?))
}

/// POST /api/v1/graph/relationships
pub async fn handle_create_relationship(
    State(state): State<AppState>,
    Json(req): Json<CreateRelationshipRequest>,
) -> Result<(StatusCode, Json<GraphRelationshipRow>), AppError> {
    let relationship_type = normalize_relationship_type(&req.relationship_type)?;
    let properties = Value::Object(validate_properties(req.properties)?);

    let mut ids = vec![req.source_node_id, req.target_node_id];
    ids.dedup();
    let owned = count_owned_nodes(&state.db, req.user_id, &ids).await?;
    if owned != ids.len() as i64 {
        return Err(AppError::NotFound(
            "Source or target node not found".to_string(),
        ));
    }

    let rel = insert_relationship(
        &state.db,
        req.user_id,
        req.source_node_id,
        req.target_node_id,
        &relationship_type,
        &properties,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(rel)))
}

/// DELETE /api/v1/graph/relationships/:id
pub async fn handle_delete_relationship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if delete_relationship(&state.db, id, params.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Relationship {id} not found")))
    }
}

/// GET /api/v1/graph
pub async fn handle_get_graph(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Graph>, AppError> {
    Ok(Json(fetch_graph(&state.db, params.user_id).await?))
}

/// POST /api/v1/graph/sync
pub async fn handle_sync(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncReport>, AppError> {
    let profile = fetch_profile(&state.db, req.user_id).await?;
    let projection = project_profile(req.user_id, &profile);

    let mut tx = state.db.begin().await?;
    let report = replace_synced_graph(&mut *tx, req.user_id, &projection).await?;
    tx.commit().await?;

    info!(
        "Synced profile graph for user {}: {} nodes, {} relationships ({} replaced)",
        req.user_id, report.nodes_created, report.relationships_created, report.nodes_removed
    );
    Ok(Json(report))
}
