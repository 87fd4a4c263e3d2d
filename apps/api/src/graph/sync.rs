//! Projects a stored profile into graph nodes and relationships.
//!
//! The projection is pure; `replace_synced_graph` swaps it in atomically.
//! Nodes written here carry `"source": "profile_sync"` so a re-sync only
//! touches its own output.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::graph::repository::{delete_synced_nodes, insert_node, insert_relationship};
use crate::profile::models::Profile;

pub const SYNC_SOURCE: &str = "profile_sync";

pub const PERSON: &str = "Person";
pub const COMPANY: &str = "Company";
pub const SKILL: &str = "Skill";
pub const INSTITUTION: &str = "Institution";
pub const PROJECT: &str = "Project";
pub const ACHIEVEMENT: &str = "Achievement";

pub const WORKED_AT: &str = "WORKED_AT";
pub const HAS_SKILL: &str = "HAS_SKILL";
pub const STUDIED_AT: &str = "STUDIED_AT";
pub const BUILT: &str = "BUILT";
pub const USES_TECHNOLOGY: &str = "USES_TECHNOLOGY";
pub const ACHIEVED: &str = "ACHIEVED";

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub label: &'static str,
    pub properties: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSpec {
    /// Indexes into `GraphProjection::nodes`.
    pub source: usize,
    pub target: usize,
    pub relationship_type: &'static str,
    pub properties: Value,
}

#[derive(Debug, Default)]
pub struct GraphProjection {
    pub nodes: Vec<NodeSpec>,
    pub relationships: Vec<RelationshipSpec>,
    node_index: HashMap<(&'static str, String), usize>,
    edge_index: HashSet<(usize, usize, &'static str)>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub nodes_removed: u64,
    pub nodes_created: usize,
    pub relationships_created: usize,
}

fn props(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = Map::new();
    map.insert("source".to_string(), Value::String(SYNC_SOURCE.to_string()));
    for (key, value) in pairs {
        if !value.is_null() {
            map.insert(key.to_string(), value);
        }
    }
    Value::Object(map)
}

impl GraphProjection {
    /// Returns the node for `(label, name)`, matching names case-insensitively.
    fn node(&mut self, label: &'static str, name: &str, extra: Vec<(&str, Value)>) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let key = (label, name.to_lowercase());
        if let Some(&i) = self.node_index.get(&key) {
            return Some(i);
        }
        let mut pairs = vec![("name", json!(name))];
        pairs.extend(extra);
        self.nodes.push(NodeSpec {
            label,
            properties: props(pairs),
        });
        let i = self.nodes.len() - 1;
        self.node_index.insert(key, i);
        Some(i)
    }

    fn relate(&mut self, source: usize, target: usize, relationship_type: &'static str, extra: Vec<(&str, Value)>) {
        self.relationships.push(RelationshipSpec {
            source,
            target,
            relationship_type,
            properties: props(extra),
        });
    }

    /// Like `relate`, but at most one edge of this type between two nodes.
    fn relate_once(&mut self, source: usize, target: usize, relationship_type: &'static str, extra: Vec<(&str, Value)>) {
        if self.edge_index.insert((source, target, relationship_type)) {
            self.relate(source, target, relationship_type, extra);
        }
    }
}

/// Builds the graph for one profile. Node 0 is always the `Person`.
pub fn project_profile(user_id: Uuid, profile: &Profile) -> GraphProjection {
    let mut graph = GraphProjection::default();
    graph.nodes.push(NodeSpec {
        label: PERSON,
        properties: props(vec![("user_id", json!(user_id))]),
    });
    let person = 0;

    // Several roles at one company share the Company node but keep one
    // WORKED_AT edge each.
    for exp in &profile.experiences {
        if let Some(company) = graph.node(COMPANY, &exp.company, vec![("location", json!(exp.location))]) {
            graph.relate(
                person,
                company,
                WORKED_AT,
                vec![
                    ("position", json!(exp.position)),
                    ("start_date", json!(exp.start_date)),
                    ("end_date", json!(exp.end_date)),
                    ("is_current", json!(exp.is_current)),
                ],
            );
        }
    }

    for skill in &profile.skills {
        if let Some(node) = graph.node(SKILL, &skill.name, vec![("category", json!(skill.category))]) {
            graph.relate_once(
                person,
                node,
                HAS_SKILL,
                vec![
                    ("proficiency_level", json!(skill.proficiency_level)),
                    ("years_experience", json!(skill.years_experience)),
                ],
            );
        }
    }

    for edu in &profile.education {
        if let Some(institution) = graph.node(INSTITUTION, &edu.institution, vec![]) {
            graph.relate(
                person,
                institution,
                STUDIED_AT,
                vec![
                    ("degree", json!(edu.degree)),
                    ("field_of_study", json!(edu.field_of_study)),
                    ("start_date", json!(edu.start_date)),
                    ("end_date", json!(edu.end_date)),
                ],
            );
        }
    }

    for project in &profile.projects {
        let Some(node) = graph.node(
            PROJECT,
            &project.title,
            vec![
                ("description", json!(project.description)),
                ("project_url", json!(project.project_url)),
                ("repository_url", json!(project.repository_url)),
            ],
        ) else {
            continue;
        };
        graph.relate_once(person, node, BUILT, vec![]);
        for tech in &project.technologies {
            if let Some(skill) = graph.node(SKILL, tech, vec![]) {
                graph.relate_once(node, skill, USES_TECHNOLOGY, vec![]);
            }
        }
    }

    for achievement in &profile.achievements {
        if let Some(node) = graph.node(
            ACHIEVEMENT,
            &achievement.title,
            vec![
                ("category", json!(achievement.category)),
                ("issuer", json!(achievement.issuer)),
            ],
        ) {
            graph.relate_once(
                person,
                node,
                ACHIEVED,
                vec![("date_achieved", json!(achievement.date_achieved))],
            );
        }
    }

    graph
}

/// Replaces the user's previously synced nodes with `projection`. Manual
/// nodes are untouched, but every relationship touching a removed node
/// cascades with it, including manual edges such as a hand-made
/// `MENTORED` from a manual node to a synced Person. Those edges do not
/// survive a re-sync. Run inside a transaction.
pub async fn replace_synced_graph(
    conn: &mut PgConnection,
    user_id: Uuid,
    projection: &GraphProjection,
) -> Result<SyncReport, sqlx::Error> {
    let nodes_removed = delete_synced_nodes(&mut *conn, user_id).await?;

    let mut ids = Vec::with_capacity(projection.nodes.len());
    for node in &projection.nodes {
        let row = insert_node(&mut *conn, user_id, node.label, &node.properties).await?;
        ids.push(row.id);
    }
    for rel in &projection.relationships {
        insert_relationship(
            &mut *conn,
            user_id,
            ids[rel.source],
            ids[rel.target],
            rel.relationship_type,
            &rel.properties,
        )
        .await?;
    }

    Ok(SyncReport {
        nodes_removed,
        nodes_created: ids.len(),
        relationships_created: projection.relationships.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::models::profile::{AchievementRow, ExperienceRow, ProjectRow, UserSkillRow};

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn experience(company: &str, position: &str) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            company: company.into(),
            position: position.into(),
            location: None,
            start_date: date(2020, 1),
            end_date: None,
            is_current: true,
            description: None,
            achievements: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn skill(name: &str) -> UserSkillRow {
        UserSkillRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            skill_id: Uuid::new_v4(),
            name: name.into(),
            category: Some("language".into()),
            proficiency_level: 4,
            years_experience: Some(3.0),
            created_at: Utc::now(),
        }
    }

    fn project(title: &str, technologies: &[&str]) -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            title: title.into(),
            description: None,
            technologies: technologies.iter().map(|t| t.to_string()).collect(),
            start_date: None,
            end_date: None,
            project_url: None,
            repository_url: Some("https://example.com/repo".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn labels(graph: &GraphProjection, label: &str) -> usize {
        graph.nodes.iter().filter(|n| n.label == label).count()
    }

    fn edges(graph: &GraphProjection, kind: &str) -> usize {
        graph
            .relationships
            .iter()
            .filter(|r| r.relationship_type == kind)
            .count()
    }

    #[test]
    fn test_empty_profile_projects_person_only() {
        let graph = project_profile(Uuid::new_v4(), &Profile::default());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, PERSON);
        assert_eq!(graph.nodes[0].properties["source"], SYNC_SOURCE);
        assert!(graph.relationships.is_empty());
    }

    #[test]
    fn test_companies_dedup_case_insensitively_but_keep_roles() {
        let profile = Profile {
            experiences: vec![
                experience("Acme", "Engineer"),
                experience(" ACME ", "Senior Engineer"),
                experience("", "Freelancer"),
            ],
            ..Default::default()
        };
        let graph = project_profile(Uuid::new_v4(), &profile);
        assert_eq!(labels(&graph, COMPANY), 1);
        assert_eq!(edges(&graph, WORKED_AT), 2);
        assert_eq!(graph.nodes[1].properties["name"], "Acme");
        assert!(graph.nodes[1].properties.get("location").is_none());
    }

    #[test]
    fn test_project_technologies_reuse_skill_nodes() {
        let profile = Profile {
            skills: vec![skill("Rust"), skill("PostgreSQL")],
            projects: vec![
                project("Ledger", &["rust", "Kafka", "RUST"]),
                project("ledger", &["PostgreSQL"]),
            ],
            ..Default::default()
        };
        let graph = project_profile(Uuid::new_v4(), &profile);
        assert_eq!(labels(&graph, SKILL), 3);
        assert_eq!(labels(&graph, PROJECT), 1);
        assert_eq!(edges(&graph, HAS_SKILL), 2);
        assert_eq!(edges(&graph, BUILT), 1);
        assert_eq!(edges(&graph, USES_TECHNOLOGY), 3);

        let rust = graph
            .nodes
            .iter()
            .find(|n| n.properties["name"] == "Rust")
            .unwrap();
        assert_eq!(rust.properties["category"], "language");
    }

    #[test]
    fn test_relationship_indexes_point_at_nodes() {
        let profile = Profile {
            experiences: vec![experience("Acme", "Engineer")],
            achievements: vec![AchievementRow {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                title: "Hackathon winner".into(),
                description: None,
                category: Some("award".into()),
                issuer: None,
                date_achieved: Some(date(2022, 5)),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            ..Default::default()
        };
        let graph = project_profile(Uuid::new_v4(), &profile);
        for rel in &graph.relationships {
            assert_eq!(rel.source, 0);
            assert!(rel.target < graph.nodes.len());
            assert_eq!(rel.properties["source"], SYNC_SOURCE);
        }
        let achieved = graph
            .relationships
            .iter()
            .find(|r| r.relationship_type == ACHIEVED)
            .unwrap();
        assert_eq!(achieved.properties["date_achieved"], "2022-05-01");
        assert_eq!(graph.nodes[achieved.target].label, ACHIEVEMENT);
    }
}
