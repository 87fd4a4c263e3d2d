//! Property-graph storage on two relational tables. Every query is scoped
//! by `user_id`.

use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::graph::models::{Graph, Neighborhood};
use crate::graph::sync::SYNC_SOURCE;
use crate::models::graph::{GraphNodeRow, GraphRelationshipRow};

pub async fn insert_node<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    label: &str,
    properties: &Value,
) -> Result<GraphNodeRow, sqlx::Error> {
    sqlx::query_as::<_, GraphNodeRow>(
        "INSERT INTO graph_nodes (user_id, label, properties) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(label)
    .bind(properties)
    .fetch_one(executor)
    .await
}

pub async fn fetch_node<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<GraphNodeRow>, sqlx::Error> {
    sqlx::query_as::<_, GraphNodeRow>("SELECT * FROM graph_nodes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn fetch_node_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<GraphNodeRow>, sqlx::Error> {
    sqlx::query_as::<_, GraphNodeRow>(
        "SELECT * FROM graph_nodes WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_nodes(
    pool: &PgPool,
    user_id: Uuid,
    label: Option<&str>,
) -> Result<Vec<GraphNodeRow>, sqlx::Error> {
    sqlx::query_as::<_, GraphNodeRow>(
        r#"
        SELECT * FROM graph_nodes
        WHERE user_id = $1 AND ($2::text IS NULL OR label = $2)
        ORDER BY label, created_at
        "#,
    )
    .bind(user_id)
    .bind(label)
    .fetch_all(pool)
    .await
}

pub async fn update_node<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    label: &str,
    properties: &Value,
) -> Result<GraphNodeRow, sqlx::Error> {
    sqlx::query_as::<_, GraphNodeRow>(
        r#"
        UPDATE graph_nodes
        SET label = $2, properties = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(label)
    .bind(properties)
    .fetch_one(executor)
    .await
}

/// Deletes a node; its relationships go with it.
pub async fn delete_node(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM graph_nodes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_synced_nodes<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM graph_nodes WHERE user_id = $1 AND properties->>'source' = $2",
    )
    .bind(user_id)
    .bind(SYNC_SOURCE)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Counts how many of `ids` are nodes owned by `user_id`.
pub async fn count_owned_nodes(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM graph_nodes WHERE user_id = $1 AND id = ANY($2)",
    )
    .bind(user_id)
    .bind(ids)
    .fetch_one(pool)
    .await
}

pub async fn insert_relationship<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    source_node_id: Uuid,
    target_node_id: Uuid,
    relationship_type: &str,
    properties: &Value,
) -> Result<GraphRelationshipRow, sqlx::Error> {
    sqlx::query_as::<_, GraphRelationshipRow>(
        r#"
        INSERT INTO graph_relationships
            (user_id, source_node_id, target_node_id, relationship_type, properties)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(source_node_id)
    .bind(target_node_id)
    .bind(relationship_type)
    .bind(properties)
    .fetch_one(executor)
    .await
}

pub async fn delete_relationship(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM graph_relationships WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Nodes one hop away from `node`, in either direction.
pub async fn fetch_neighborhood(
    pool: &PgPool,
    node: GraphNodeRow,
) -> Result<Neighborhood, sqlx::Error> {
    let relationships = sqlx::query_as::<_, GraphRelationshipRow>(
        r#"
        SELECT * FROM graph_relationships
        WHERE user_id = $1 AND (source_node_id = $2 OR target_node_id = $2)
        ORDER BY created_at
        "#,
    )
    .bind(node.user_id)
    .bind(node.id)
    .fetch_all(pool)
    .await?;

    let mut neighbor_ids: Vec<Uuid> = relationships
        .iter()
        .map(|r| {
            if r.source_node_id == node.id {
                r.target_node_id
            } else {
                r.source_node_id
            }
        })
        .filter(|id| *id != node.id)
        .collect();
    neighbor_ids.sort();
    neighbor_ids.dedup();

    let neighbors = sqlx::query_as::<_, GraphNodeRow>(
        "SELECT * FROM graph_nodes WHERE user_id = $1 AND id = ANY($2) ORDER BY label, created_at",
    )
    .bind(node.user_id)
    .bind(&neighbor_ids)
    .fetch_all(pool)
    .await?;

    Ok(Neighborhood {
        node,
        neighbors,
        relationships,
    })
}

pub async fn fetch_graph(pool: &PgPool, user_id: Uuid) -> Result<Graph, sqlx::Error> {
    let nodes = list_nodes(pool, user_id, None).await?;
    let relationships = sqlx::query_as::<_, GraphRelationshipRow>(
        "SELECT * FROM graph_relationships WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(Graph {
        nodes,
        relationships,
    })
}
