//! Neopersist - object-to-graph mapping for property graph databases.
//!
//! Typed records declare their node mapping with `#[derive(GraphEntity)]`;
//! repositories then provide CRUD, lookups, counts and result hydration on
//! top of any [`graph::QueryRunner`].
//!
//! # Example
//!
//! ```ignore
//! use neopersist::graph::backends::memory::MemoryGraph;
//! use neopersist::{GraphEntity, PersistenceManager};
//!
//! #[derive(GraphEntity, Default, Debug, Clone, PartialEq)]
//! struct User {
//!     #[graph("pk,property:userId")]
//!     user_id: String,
//!     #[graph("property:name")]
//!     name: String,
//! }
//!
//! let manager = PersistenceManager::new(MemoryGraph::new());
//! let users = manager.repository_for::<User>()?;
//! users.save(&User { user_id: "u1".into(), name: "Alice".into() }).await?;
//! let alice = users.find_by_id("u1").await?;
//! ```

// Lets the derive macro's `::neopersist::` paths resolve inside this crate.
extern crate self as neopersist;

pub mod config;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod models;
pub mod repositories;
pub mod services;

pub use error::AppError;
pub use mapping::{EntityMetadata, GraphEntity, MetadataCache};
pub use models::{GraphEdge, GraphNode, GraphResult};
pub use ogm_macros::GraphEntity;
pub use repositories::Repository;
pub use services::PersistenceManager;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
