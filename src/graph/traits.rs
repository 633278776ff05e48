//! Core trait for graph database abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::query::Statement;
use crate::graph::row::Row;

/// Executes statements against a graph database.
///
/// This is the only seam between the mapping layer and a database. A runner
/// returns the full, ordered result set; an empty result is `Ok(vec![])`.
/// Runners own connection handling, retries and timeouts. Dropping the
/// returned future cancels the call.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Executes a statement and returns every row it produced.
    ///
    /// Use this for reads and writes alike; writes without a RETURN clause
    /// yield no rows.
    async fn run(&self, statement: &Statement) -> Result<Vec<Row>, AppError>;
}

// Forward QueryRunner through shared handles
#[async_trait]
impl<R: QueryRunner + ?Sized> QueryRunner for Arc<R> {
    async fn run(&self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        (**self).run(statement).await
    }
}
