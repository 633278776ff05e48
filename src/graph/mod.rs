//! Graph abstraction layer for backend-agnostic database access.
//!
//! The mapping layer talks to databases through a single trait,
//! [`QueryRunner`], which executes a [`Statement`] and returns ordered
//! [`Row`]s of typed [`Value`]s. Statements are either assembled with
//! [`QueryBuilder`] or written by hand with [`Statement::new`] / [`cypher!`].
//!
//! # Usage
//!
//! ```ignore
//! use neopersist::graph::{NodePattern, QueryBuilder, QueryRunner};
//!
//! let statement = QueryBuilder::new()
//!     .match_path(NodePattern::new("n", "User").with_property("userId", "u1"))
//!     .return_items(["n"])
//!     .build()?;
//!
//! let rows = runner.run(&statement).await?;
//! ```
//!
//! # Backends
//!
//! - [`backends::postgres`] - PostgreSQL + Apache AGE
//! - [`backends::memory`] - In-process graph for tests and prototyping

mod cypher;
mod macros;
mod query;
mod row;
mod traits;
mod value;

pub mod backends;

// Re-export core types
pub use cypher::{extract_return_columns, ParseError};
pub use query::{
    BuildError, Clause, Direction, Expr, IntoStatement, NodePattern, PathPattern, PropertyMap,
    QueryBuilder, RelPattern, ReturnItem, SetItem, SortItem, Statement,
};
pub use row::{Params, Row};
pub use traits::QueryRunner;
pub use value::{Node, Properties, Relationship, Value};

pub(crate) use query::is_identifier;

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::cypher;
