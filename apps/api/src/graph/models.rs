use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::graph::sync::SYNC_SOURCE;
use crate::models::graph::{GraphNodeRow, GraphRelationshipRow};

pub const MAX_LABEL_CHARS: usize = 64;

#[derive(Deserialize)]
pub struct CreateNodeRequest {
    pub user_id: Uuid,
    pub label: String,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateNodeRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Deserialize)]
pub struct CreateRelationshipRequest {
    pub user_id: Uuid,
    pub source_node_id: Uuid,
    pub target_node_id: Uuid,
    pub relationship_type: String,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Deserialize)]
pub struct NodesQuery {
    pub user_id: Uuid,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNodeRow>,
    pub relationships: Vec<GraphRelationshipRow>,
}

#[derive(Debug, Serialize)]
pub struct Neighborhood {
    pub node: GraphNodeRow,
    pub neighbors: Vec<GraphNodeRow>,
    pub relationships: Vec<GraphRelationshipRow>,
}

pub fn validate_label(label: &str) -> Result<String, AppError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(AppError::Validation("label is required".to_string()));
    }
    if label.chars().count() > MAX_LABEL_CHARS {
        return Err(AppError::Validation(format!(
            "label must be at most {MAX_LABEL_CHARS} characters"
        )));
    }
    Ok(label.to_string())
}

/// Absent properties become an empty object; anything but an object is
/// rejected. The sync marker is reserved: a re-sync deletes every node
/// carrying it.
pub fn validate_properties(properties: Option<Value>) -> Result<Map<String, Value>, AppError> {
    let map = match properties {
        None | Some(Value::Null) => return Ok(Map::new()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AppError::Validation(
                "properties must be a JSON object".to_string(),
            ))
        }
    };
    if map.get("source").and_then(Value::as_str) == Some(SYNC_SOURCE) {
        return Err(AppError::Validation(format!(
            "properties.source '{SYNC_SOURCE}' is reserved for profile sync"
        )));
    }
    Ok(map)
}

/// Shallow merge of `patch` into `existing`. A `null` in the patch removes
/// the key.
pub fn merge_properties(existing: &Value, patch: Map<String, Value>) -> Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

/// `"works at"`, `"worksAt"` and `"works-at"` all become `WORKS_AT`.
pub fn normalize_relationship_type(raw: &str) -> Result<String, AppError> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.extend(c.to_uppercase());
        } else {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    if words.is_empty() {
        return Err(AppError::Validation(
            "relationship_type must contain letters or digits".to_string(),
        ));
    }
    Ok(words.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relationship_type_normalization() {
        assert_eq!(normalize_relationship_type("works at").unwrap(), "WORKS_AT");
        assert_eq!(normalize_relationship_type("worksAt").unwrap(), "WORKS_AT");
        assert_eq!(normalize_relationship_type(" works-at ").unwrap(), "WORKS_AT");
        assert_eq!(normalize_relationship_type("HAS_SKILL").unwrap(), "HAS_SKILL");
        assert_eq!(normalize_relationship_type("mentored2021").unwrap(), "MENTORED2021");
        assert!(normalize_relationship_type(" -- ").is_err());
    }

    #[test]
    fn test_merge_properties_removes_nulls() {
        let existing = json!({"name": "Acme", "city": "Berlin", "size": 10});
        let patch = json!({"city": null, "size": 50, "sector": "fintech"});
        let merged = merge_properties(&existing, patch.as_object().cloned().unwrap());
        assert_eq!(merged, json!({"name": "Acme", "size": 50, "sector": "fintech"}));
    }

    #[test]
    fn test_properties_must_be_object() {
        assert!(validate_properties(None).unwrap().is_empty());
        assert!(validate_properties(Some(json!({"a": 1}))).is_ok());
        assert!(validate_properties(Some(json!([1, 2]))).is_err());
        assert!(validate_properties(Some(json!("x"))).is_err());
        assert!(validate_properties(Some(json!({"source": "linkedin"}))).is_ok());
    }

    #[test]
    fn test_sync_marker_is_reserved() {
        let err = validate_properties(Some(json!({"name": "Acme", "source": "profile_sync"})));
        assert!(matches!(err, Err(AppError::Validation(_))));
        // clearing the marker through a patch stays allowed
        assert!(validate_properties(Some(json!({"source": null}))).is_ok());
    }

    #[test]
    fn test_label_validation() {
        assert_eq!(validate_label("  Company ").unwrap(), "Company");
        assert!(validate_label("   ").is_err());
        assert!(validate_label(&"L".repeat(MAX_LABEL_CHARS + 1)).is_err());
    }
}
