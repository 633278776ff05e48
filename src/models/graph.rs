//! Generic graph projection returned by `PersistenceManager::find_graph`.

use serde::Serialize;

use crate::graph::{Node, Properties, Relationship};

/// A node in a projected graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Backend-assigned node ID.
    pub id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
}

/// A directed edge in a projected graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    /// Backend-assigned relationship ID.
    pub id: String,
    /// Start node ID.
    pub source: String,
    /// End node ID.
    pub target: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: Properties,
}

/// Nodes and edges collected from a query, each listed once by ID in order
/// of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl From<&Node> for GraphNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            labels: node.labels.clone(),
            properties: node.properties.clone(),
        }
    }
}

impl From<&Relationship> for GraphEdge {
    fn from(rel: &Relationship) -> Self {
        Self {
            id: rel.id.clone(),
            source: rel.start_id.clone(),
            target: rel.end_id.clone(),
            rel_type: rel.rel_type.clone(),
            properties: rel.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edge_serializes_type_field() {
        let rel = Relationship::new("r1", "n1", "n2", "WROTE").with_property("year", 2024i64);
        let edge = GraphEdge::from(&rel);

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "r1",
                "source": "n1",
                "target": "n2",
                "type": "WROTE",
                "properties": {"year": 2024}
            })
        );
    }

    #[test]
    fn test_node_serializes_properties_in_order() {
        let node = Node::new("n1")
            .with_label("User")
            .with_property("userId", "u1")
            .with_property("name", "Alice");

        let json = serde_json::to_string(&GraphNode::from(&node)).unwrap();
        assert_eq!(
            json,
            r#"{"id":"n1","labels":["User"],"properties":{"userId":"u1","name":"Alice"}}"#
        );
    }
}
