//! Persistence manager: repository factory, relationships and graph projection.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::AppError;
use crate::graph::{
    IntoStatement, NodePattern, PropertyMap, QueryBuilder, QueryRunner, RelPattern, Row,
    Statement, Value,
};
use crate::mapping::{EntityMetadata, GraphEntity, MetadataCache};
use crate::models::{GraphEdge, GraphNode, GraphResult};
use crate::repositories::Repository;

/// Entry point of the mapping layer.
///
/// Owns the query runner and the metadata cache. Repositories it hands out
/// share both.
///
/// # Example
///
/// ```ignore
/// let manager = PersistenceManager::new(client);
///
/// let users = manager.repository_for::<User>()?;
/// users.save(&alice).await?;
///
/// manager.create_relation(&alice, &post, "WROTE", PropertyMap::new()).await?;
/// let graph = manager.find_graph(query).await?;
/// ```
pub struct PersistenceManager {
    runner: Arc<dyn QueryRunner>,
    metadata: MetadataCache,
}

impl PersistenceManager {
    pub fn new(runner: impl QueryRunner + 'static) -> Self {
        Self::from_shared(Arc::new(runner))
    }

    /// Creates a manager over a runner that is shared elsewhere.
    pub fn from_shared(runner: Arc<dyn QueryRunner>) -> Self {
        Self {
            runner,
            metadata: MetadataCache::new(),
        }
    }

    pub fn runner(&self) -> Arc<dyn QueryRunner> {
        Arc::clone(&self.runner)
    }

    /// Cached metadata for `T`, resolved on first use.
    pub fn metadata_for<T: GraphEntity>(&self) -> Result<Arc<EntityMetadata>, AppError> {
        Ok(self.metadata.get_or_resolve::<T>()?)
    }

    pub fn repository_for<T: GraphEntity>(&self) -> Result<Repository<T>, AppError> {
        let metadata = self.metadata_for::<T>()?;
        Ok(Repository::with_metadata(self.runner(), metadata))
    }

    /// Creates a `(from)-[:rel_type]->(to)` relationship between two
    /// persisted records, matched by their primary keys.
    ///
    /// Neither node is created; when one does not exist nothing is written.
    /// An empty or malformed `rel_type` fails with [`AppError::Build`].
    pub async fn create_relation<A: GraphEntity, B: GraphEntity>(
        &self,
        from: &A,
        to: &B,
        rel_type: &str,
        properties: PropertyMap,
    ) -> Result<(), AppError> {
        let from_node = self.key_pattern("a", from)?;
        let to_node = self.key_pattern("b", to)?;

        let statement = QueryBuilder::new()
            .match_path(from_node)
            .match_path(to_node)
            .create(NodePattern::bound("a").relates_to(
                RelPattern::new("r", rel_type).with_properties(properties),
                NodePattern::bound("b"),
            ))
            .build()?;

        tracing::debug!(rel_type, query = %statement, "creating relationship");
        self.runner.run(&statement).await?;
        Ok(())
    }

    fn key_pattern<T: GraphEntity>(&self, alias: &str, entity: &T) -> Result<NodePattern, AppError> {
        let metadata = self.metadata_for::<T>()?;
        let key = entity.read_field(&metadata.primary_key_field)?;
        Ok(NodePattern::new(alias, metadata.label.as_str())
            .with_property(metadata.primary_key_property.as_str(), key))
    }

    /// Collects every node and relationship a query returns.
    ///
    /// Values nested in lists and maps are included. Each element appears
    /// once, in order of first appearance. A query that returns no rows
    /// fails with [`AppError::NotFound`].
    pub async fn find_graph(&self, query: impl IntoStatement) -> Result<GraphResult, AppError> {
        let statement = query.into_statement()?;
        let rows = self.runner.run(&statement).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound("graph".to_string()));
        }
        Ok(collect_graph(&rows))
    }

    /// Runs a statement as-is and returns its rows.
    pub async fn run(&self, query: impl IntoStatement) -> Result<Vec<Row>, AppError> {
        let statement: Statement = query.into_statement()?;
        self.runner.run(&statement).await
    }
}

#[derive(Default)]
struct GraphCollector {
    result: GraphResult,
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<String>,
}

impl GraphCollector {
    fn visit(&mut self, value: &Value) {
        match value {
            Value::Node(node) => {
                if self.seen_nodes.insert(node.id.clone()) {
                    self.result.nodes.push(GraphNode::from(node));
                }
            }
            Value::Relationship(rel) => {
                if self.seen_edges.insert(rel.id.clone()) {
                    self.result.edges.push(GraphEdge::from(rel));
                }
            }
            Value::List(items) => items.iter().for_each(|item| self.visit(item)),
            Value::Map(map) => map.values().for_each(|item| self.visit(item)),
            _ => {}
        }
    }
}

fn collect_graph(rows: &[Row]) -> GraphResult {
    let mut collector = GraphCollector::default();
    for value in rows.iter().flat_map(Row::values) {
        collector.visit(value);
    }
    collector.result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use serde_json::json;

    use crate::graph::backends::memory::MemoryGraph;
    use crate::graph::{Node, Relationship};
    use crate::GraphEntity;

    #[derive(GraphEntity, Default, Debug, Clone, PartialEq)]
    struct User {
        #[graph("pk,property:userId")]
        user_id: String,
        #[graph("property:name")]
        name: String,
    }

    #[derive(GraphEntity, Default, Debug, Clone, PartialEq)]
    struct Post {
        #[graph("pk,property:postId")]
        post_id: String,
        #[graph("property:title")]
        title: String,
    }

    /// Returns the same rows for every statement.
    struct FixedRunner(Vec<Row>);

    #[async_trait]
    impl QueryRunner for FixedRunner {
        async fn run(&self, _statement: &Statement) -> Result<Vec<Row>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn any_query() -> Statement {
        Statement::new("MATCH (u)-[r]->(p) RETURN u, r, p").with_columns(["u", "r", "p"])
    }

    #[test]
    fn test_repository_for_reuses_cached_metadata() {
        let manager = PersistenceManager::new(MemoryGraph::new());

        let first = manager.repository_for::<User>().unwrap();
        let second = manager.repository_for::<User>().unwrap();
        assert!(std::ptr::eq(first.metadata(), second.metadata()));
        assert_eq!(manager.metadata_for::<Post>().unwrap().label, "Post");
    }

    #[tokio::test]
    async fn test_find_graph_deduplicates_fan_out() {
        let alice = Node::new("n1").with_label("User");
        let p1 = Node::new("n2").with_label("Post");
        let p2 = Node::new("n3").with_label("Post");
        let rows = vec![
            Row::default()
                .with("u", alice.clone())
                .with("r", Relationship::new("r1", "n1", "n2", "WROTE"))
                .with("p", p1),
            Row::default()
                .with("u", alice)
                .with("r", Relationship::new("r2", "n1", "n3", "WROTE"))
                .with("p", p2),
        ];
        let manager = PersistenceManager::new(FixedRunner(rows));

        let graph = manager.find_graph(any_query()).await.unwrap();

        let node_ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let edge_ids: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(node_ids, vec!["n1", "n2", "n3"]);
        assert_eq!(edge_ids, vec!["r1", "r2"]);
        assert_eq!(graph.edges[0].source, "n1");
        assert_eq!(graph.edges[0].target, "n2");
    }

    #[tokio::test]
    async fn test_find_graph_walks_nested_values() {
        let mut map = IndexMap::new();
        map.insert("owner".to_string(), Value::Node(Node::new("n9")));
        let rows = vec![Row::default()
            .with("path", Value::List(vec![Node::new("n1").into(), Node::new("n1").into()]))
            .with("meta", Value::Map(map))
            .with("title", "ignored")];
        let manager = PersistenceManager::new(FixedRunner(rows));

        let graph = manager.find_graph(any_query()).await.unwrap();
        let node_ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(node_ids, vec!["n1", "n9"]);
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn test_find_graph_without_rows_is_not_found() {
        let manager = PersistenceManager::new(FixedRunner(Vec::new()));

        let err = manager.find_graph(any_query()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_relation_between_different_types() {
        let graph = Arc::new(MemoryGraph::new());
        let manager = PersistenceManager::from_shared(graph.clone());
        let alice = User {
            user_id: "u1".into(),
            name: "Alice".into(),
        };
        let post = Post {
            post_id: "p1".into(),
            title: "Hello".into(),
        };
        manager.repository_for::<User>().unwrap().save(&alice).await.unwrap();
        manager.repository_for::<Post>().unwrap().save(&post).await.unwrap();

        let mut properties = PropertyMap::new();
        properties.insert("year".to_string(), json!(2024));
        manager
            .create_relation(&alice, &post, "WROTE", properties)
            .await
            .unwrap();

        assert_eq!(graph.relationship_count().await, 1);
        assert_eq!(manager.metadata.len(), 2);
    }

    #[tokio::test]
    async fn test_create_relation_does_not_create_nodes() {
        let graph = Arc::new(MemoryGraph::new());
        let manager = PersistenceManager::from_shared(graph.clone());
        let ghost = User::default();
        let post = Post {
            post_id: "p1".into(),
            title: String::new(),
        };

        manager
            .create_relation(&ghost, &post, "WROTE", PropertyMap::new())
            .await
            .unwrap();

        assert_eq!(graph.node_count().await, 0);
        assert_eq!(graph.relationship_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_relation_rejects_empty_type() {
        let manager = PersistenceManager::new(MemoryGraph::new());

        let err = manager
            .create_relation(&User::default(), &Post::default(), "", PropertyMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Build(_)));
    }
}
