//! End-to-end repository and manager behavior against the in-memory graph.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use neopersist::graph::backends::memory::MemoryGraph;
use neopersist::graph::{NodePattern, PropertyMap, QueryBuilder, RelPattern};
use neopersist::mapping::MetadataError;
use neopersist::{AppError, EntityMetadata, GraphEntity, PersistenceManager};
use serde::{Deserialize, Serialize};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
enum Role {
    #[default]
    Member,
    Admin,
}

#[derive(GraphEntity, Default, Debug, Clone, PartialEq)]
struct User {
    #[graph("pk,property:userId")]
    user_id: String,
    #[graph("property:name")]
    name: String,
    #[graph("property:role")]
    role: Role,
    #[graph("property:joinedAt")]
    joined_at: Option<DateTime<Utc>>,
    // Not persisted
    session: Option<String>,
}

#[derive(GraphEntity, Default, Debug, Clone, PartialEq)]
#[graph(label = "Article")]
struct Post {
    #[graph("pk,property:postId")]
    post_id: String,
    #[graph("property:type")]
    r#type: String,
}

#[derive(GraphEntity, Default)]
struct Dashed {
    #[graph("pk,property:user-id")]
    user_id: String,
}

#[derive(GraphEntity, Default)]
struct NoKey {
    #[graph("property:name")]
    name: String,
}

fn user(id: &str, name: &str) -> User {
    User {
        user_id: id.to_string(),
        name: name.to_string(),
        ..User::default()
    }
}

fn setup() -> (Arc<MemoryGraph>, PersistenceManager) {
    init_tracing();
    let graph = Arc::new(MemoryGraph::new());
    let manager = PersistenceManager::from_shared(graph.clone());
    (graph, manager)
}

#[test]
fn test_derived_metadata() {
    let meta = EntityMetadata::for_type::<Post>().unwrap();
    assert_eq!(meta.label, "Article");
    assert_eq!(meta.primary_key_property, "postId");
    assert_eq!(meta.property_for("type"), Some("type"));

    let meta = EntityMetadata::for_type::<User>().unwrap();
    assert_eq!(meta.label, "User");
    assert_eq!(meta.field_to_property.len(), 4);
    assert!(!meta.field_to_property.contains_key("session"));
}

#[test]
fn test_missing_primary_key_surfaces_from_manager() {
    let (_, manager) = setup();
    let err = manager
        .repository_for::<NoKey>()
        .err()
        .expect("type without a primary key must be rejected");
    assert!(matches!(
        err,
        AppError::Metadata(MetadataError::MissingPrimaryKey { .. })
    ));
}

#[test]
fn test_invalid_property_name_fails_at_construction() {
    let (_, manager) = setup();
    let err = manager
        .repository_for::<Dashed>()
        .err()
        .expect("dashed property name must be rejected");
    assert!(matches!(
        err,
        AppError::Metadata(MetadataError::InvalidPropertyName { .. })
    ));
}

#[tokio::test]
async fn test_save_then_update_same_key() {
    let (graph, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();

    users.save(&user("u1", "Alice")).await.unwrap();
    users.save(&user("u1", "Alicia")).await.unwrap();

    assert_eq!(graph.node_count().await, 1);
    assert_eq!(users.find_by_id("u1").await.unwrap(), user("u1", "Alicia"));
}

#[tokio::test]
async fn test_round_trip_of_structured_fields() {
    let (_, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    let joined = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let admin = User {
        role: Role::Admin,
        joined_at: Some(joined),
        session: Some("not stored".to_string()),
        ..user("u1", "Alice")
    };

    users.save(&admin).await.unwrap();
    let found = users.find_by_id("u1").await.unwrap();

    assert_eq!(found.role, Role::Admin);
    assert_eq!(found.joined_at, Some(joined));
    assert_eq!(found.session, None);
}

#[tokio::test]
async fn test_clearing_optional_field_removes_property() {
    let (graph, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    let mut alice = User {
        joined_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ..user("u1", "Alice")
    };
    users.save(&alice).await.unwrap();

    alice.joined_at = None;
    users.save(&alice).await.unwrap();

    let nodes = graph.nodes_with_label("User").await;
    assert!(nodes[0].property("joinedAt").is_none());
    assert_eq!(users.find_by_id("u1").await.unwrap().joined_at, None);
}

#[tokio::test]
async fn test_find_by_id_lifecycle() {
    let (_, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();

    assert!(users.find_by_id("u1").await.unwrap_err().is_not_found());
    assert!(!users.exists("u1").await.unwrap());

    users.save(&user("u1", "Alice")).await.unwrap();
    assert_eq!(users.find_by_id("u1").await.unwrap(), user("u1", "Alice"));
    assert!(users.exists("u1").await.unwrap());

    users.delete("u1").await.unwrap();
    assert!(users.find_by_id("u1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_detaches_relationships() {
    let (graph, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    let alice = user("u1", "Alice");
    let bob = user("u2", "Bob");
    users.save(&alice).await.unwrap();
    users.save(&bob).await.unwrap();
    manager
        .create_relation(&alice, &bob, "FOLLOWS", PropertyMap::new())
        .await
        .unwrap();
    assert_eq!(graph.relationship_count().await, 1);

    users.delete("u1").await.unwrap();

    assert_eq!(graph.relationship_count().await, 0);
    assert_eq!(users.find_by_id("u2").await.unwrap(), bob);

    let from_deleted = QueryBuilder::new()
        .match_path(NodePattern::new("a", "User").with_property("userId", "u1").relates_to(
            RelPattern::new("r", "").undirected(),
            NodePattern::new("b", ""),
        ))
        .return_items(["a", "r", "b"]);
    assert!(manager.find_graph(from_deleted).await.unwrap_err().is_not_found());

    let into_bob = QueryBuilder::new()
        .match_path(NodePattern::new("b", "User").with_property("userId", "u2").relates_to(
            RelPattern::new("r", "FOLLOWS").incoming(),
            NodePattern::new("a", ""),
        ))
        .return_items(["count(r) AS total"]);
    assert_eq!(users.count_with_query(into_bob).await.unwrap(), 0);
}

#[tokio::test]
async fn test_lookups_and_counts() {
    let (_, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    assert!(users.find_all().await.unwrap().is_empty());
    assert_eq!(users.count().await.unwrap(), 0);

    users.save(&user("u1", "Alice")).await.unwrap();
    users.save(&user("u2", "Bob")).await.unwrap();
    users.save(&user("u3", "Alice")).await.unwrap();

    assert_eq!(users.find_all().await.unwrap().len(), 3);
    assert_eq!(users.count().await.unwrap(), 3);

    let alices = users.find_by_property("name", "Alice").await.unwrap();
    let ids: Vec<_> = alices.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u3"]);
    assert_eq!(users.count_by_property("name", "Alice").await.unwrap(), 2);

    let err = users.find_by_property("nickname", "Al").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_find_one_with_two_matches_is_consistency_error() {
    let (_, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    users.save(&user("u1", "Alice")).await.unwrap();
    users.save(&user("u2", "Alice")).await.unwrap();

    let query = QueryBuilder::new()
        .match_path(NodePattern::new("n", "User").with_property("name", "Alice"))
        .return_items(["n"]);
    let err = users.find_one(query).await.unwrap_err();

    assert!(matches!(err, AppError::Consistency { expected: 1, found: 2 }));
}

#[tokio::test]
async fn test_custom_projection_order_and_count() {
    let (_, manager) = setup();
    let users = manager.repository_for::<User>().unwrap();
    for (id, name) in [("u1", "Carol"), ("u2", "Alice"), ("u3", "Bob")] {
        users.save(&user(id, name)).await.unwrap();
    }

    let query = QueryBuilder::new()
        .match_path(NodePattern::new("u", "User"))
        .return_items(["u.userId", "u.name AS name"])
        .order_by("name")
        .limit(2);
    let names: Vec<_> = users
        .find(query)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let first = users
        .find_first(
            QueryBuilder::new()
                .match_path(NodePattern::new("u", "User"))
                .return_items(["u"])
                .order_by_desc("u.name"),
        )
        .await
        .unwrap();
    assert_eq!(first.name, "Carol");

    let total = users
        .count_with_query(
            QueryBuilder::new()
                .match_path(NodePattern::new("u", "User"))
                .return_items(["count(u) AS total"]),
        )
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_find_graph_over_fan_out() {
    let (_, manager) = setup();
    let alice = user("u1", "Alice");
    manager.repository_for::<User>().unwrap().save(&alice).await.unwrap();
    let posts = manager.repository_for::<Post>().unwrap();
    for id in ["p1", "p2", "p3"] {
        let post = Post {
            post_id: id.to_string(),
            r#type: "note".to_string(),
        };
        posts.save(&post).await.unwrap();
        let mut props = PropertyMap::new();
        props.insert("draft".to_string(), serde_json::json!(false));
        manager
            .create_relation(&alice, &post, "WROTE", props)
            .await
            .unwrap();
    }

    let query = QueryBuilder::new()
        .match_path(NodePattern::new("u", "User").relates_to(
            RelPattern::new("r", "WROTE"),
            NodePattern::new("p", "Article"),
        ))
        .return_items(["u", "r", "p"]);
    let graph = manager.find_graph(query).await.unwrap();

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);
    assert_eq!(graph.nodes[0].labels, vec!["User"]);
    assert!(graph.edges.iter().all(|e| e.source == graph.nodes[0].id));

    let empty = QueryBuilder::new()
        .match_path(NodePattern::new("u", "Nobody"))
        .return_items(["u"]);
    assert!(manager.find_graph(empty).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_concurrent_repository_creation() {
    let (_, manager) = setup();
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let users = manager.repository_for::<User>()?;
                users.save(&user(&format!("u{}", i), "Racer")).await?;
                Ok::<_, AppError>(users.metadata().clone())
            })
        })
        .collect();

    let mut resolved = Vec::new();
    for handle in handles {
        resolved.push(handle.await.unwrap().unwrap());
    }

    assert!(resolved.iter().all(|meta| *meta == resolved[0]));
    let users = manager.repository_for::<User>().unwrap();
    assert_eq!(users.count().await.unwrap(), 16);
}
