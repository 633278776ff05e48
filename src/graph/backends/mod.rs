//! Backend implementations for different graph databases.
//!
//! Each backend implements [`QueryRunner`](crate::graph::QueryRunner).
//!
//! # Available Backends
//!
//! | Backend | Module | Executes |
//! |---------|--------|----------|
//! | PostgreSQL + Apache AGE | [`postgres`] | Any Cypher AGE accepts |
//! | In-memory | [`memory`] | Builder statements only |
//!
//! # Implementing a Backend
//!
//! 1. Create a runner struct (e.g., `PostgresClient`)
//! 2. Implement `QueryRunner::run`, returning every row in order
//! 3. Translate the wire format into [`Value`](crate::graph::Value), mapping
//!    nodes and relationships to their dedicated variants

pub mod memory;
pub mod postgres;
