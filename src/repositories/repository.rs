//! Generic repository for one record type.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::{IntoStatement, NodePattern, QueryBuilder, QueryRunner, Row, Statement};
use crate::mapping::{EntityMetadata, GraphEntity};
use crate::repositories::hydrate::hydrate;

/// Typed CRUD and query hydration for records of type `T`.
///
/// Every statement targets nodes labelled with the type's label and keys
/// them by the primary-key property. Repositories are immutable and cheap
/// to clone.
///
/// # Example
///
/// ```ignore
/// let users = manager.repository_for::<User>()?;
///
/// users.save(&alice).await?;
/// let found = users.find_by_id("u1").await?;
/// let admins = users.find_by_property("role", "admin").await?;
/// ```
pub struct Repository<T> {
    runner: Arc<dyn QueryRunner>,
    metadata: Arc<EntityMetadata>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            metadata: Arc::clone(&self.metadata),
            _entity: PhantomData,
        }
    }
}

impl<T: GraphEntity> Repository<T> {
    /// Creates a repository, resolving `T`'s metadata without caching.
    pub fn new(runner: Arc<dyn QueryRunner>) -> Result<Self, AppError> {
        let metadata = EntityMetadata::for_type::<T>()?;
        Ok(Self::with_metadata(runner, Arc::new(metadata)))
    }

    /// Creates a repository from already resolved metadata.
    pub fn with_metadata(runner: Arc<dyn QueryRunner>, metadata: Arc<EntityMetadata>) -> Self {
        Self {
            runner,
            metadata,
            _entity: PhantomData,
        }
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn node(&self, alias: &str) -> NodePattern {
        NodePattern::new(alias, self.metadata.label.as_str())
    }

    fn keyed_node(&self, alias: &str, id: JsonValue) -> NodePattern {
        self.node(alias)
            .with_property(self.metadata.primary_key_property.as_str(), id)
    }

    fn ensure_mapped(&self, property: &str) -> Result<(), AppError> {
        if self.metadata.is_mapped_property(property) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "'{}' is not a mapped property of {}",
                property, self.metadata.label
            )))
        }
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        tracing::debug!(label = %self.metadata.label, query = %statement, "repository query");
        self.runner.run(statement).await
    }

    /// Like [`fetch`](Self::fetch), treating a runner's not-found as no rows.
    async fn fetch_many(&self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        match self.fetch(statement).await {
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    fn hydrate_all(&self, rows: &[Row]) -> Result<Vec<T>, AppError> {
        rows.iter().map(|row| hydrate(row, &self.metadata)).collect()
    }

    fn exactly_one(&self, rows: &[Row]) -> Result<T, AppError> {
        match rows {
            [] => Err(AppError::NotFound(self.metadata.label.clone())),
            [row] => hydrate(row, &self.metadata),
            _ => Err(AppError::Consistency {
                expected: 1,
                found: rows.len(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Upserts `entity` by primary key.
    ///
    /// Saving twice with the same key updates the existing node. Null field
    /// values remove the corresponding property.
    pub async fn save(&self, entity: &T) -> Result<(), AppError> {
        let key = entity.read_field(&self.metadata.primary_key_field)?;
        if key.is_null() {
            return Err(AppError::Validation(format!(
                "primary key '{}' of {} is null",
                self.metadata.primary_key_field, self.metadata.label
            )));
        }

        let mut builder = QueryBuilder::new().merge(self.keyed_node("n", key));
        for (field, property) in self.metadata.non_key_mappings() {
            builder = builder.set("n", property, entity.read_field(field)?);
        }
        let statement = builder.return_items(["n"]).build()?;

        self.fetch(&statement).await?;
        Ok(())
    }

    /// Deletes the node with this key together with its relationships.
    ///
    /// Deleting a key that does not exist is not an error.
    pub async fn delete(&self, id: impl Into<JsonValue>) -> Result<(), AppError> {
        let statement = QueryBuilder::new()
            .match_path(self.keyed_node("n", id.into()))
            .detach_delete("n")
            .build()?;

        self.fetch(&statement).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Finds the record with this key.
    ///
    /// Returns [`AppError::NotFound`] when no node matches and
    /// [`AppError::Consistency`] when several do.
    pub async fn find_by_id(&self, id: impl Into<JsonValue>) -> Result<T, AppError> {
        let statement = QueryBuilder::new()
            .match_path(self.keyed_node("n", id.into()))
            .return_items(["n"])
            .build()?;

        let rows = self.fetch(&statement).await?;
        self.exactly_one(&rows)
    }

    pub async fn exists(&self, id: impl Into<JsonValue>) -> Result<bool, AppError> {
        let statement = QueryBuilder::new()
            .match_path(self.keyed_node("n", id.into()))
            .return_items(["count(n) AS count"])
            .build()?;

        Ok(self.count_rows(&statement).await? > 0)
    }

    /// All records of this type. Empty when none exist.
    pub async fn find_all(&self) -> Result<Vec<T>, AppError> {
        let statement = QueryBuilder::new()
            .match_path(self.node("n"))
            .return_items(["n"])
            .build()?;

        let rows = self.fetch_many(&statement).await?;
        self.hydrate_all(&rows)
    }

    /// Records whose `property` equals `value`.
    ///
    /// `property` must be a mapped property name; otherwise no query runs
    /// and [`AppError::Validation`] is returned.
    pub async fn find_by_property(
        &self,
        property: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Vec<T>, AppError> {
        self.ensure_mapped(property)?;
        let statement = QueryBuilder::new()
            .match_path(self.node("n").with_property(property, value))
            .return_items(["n"])
            .build()?;

        let rows = self.fetch_many(&statement).await?;
        self.hydrate_all(&rows)
    }

    /// Runs a custom query and hydrates every row.
    ///
    /// Rows may return whole nodes or projected columns named after mapped
    /// properties (`name` or `u.name`).
    pub async fn find(&self, query: impl IntoStatement) -> Result<Vec<T>, AppError> {
        let statement = query.into_statement()?;
        let rows = self.fetch_many(&statement).await?;
        self.hydrate_all(&rows)
    }

    /// Runs a custom query that must return exactly one row.
    pub async fn find_one(&self, query: impl IntoStatement) -> Result<T, AppError> {
        let statement = query.into_statement()?;
        let rows = self.fetch(&statement).await?;
        self.exactly_one(&rows)
    }

    /// Runs a custom query and hydrates its first row.
    pub async fn find_first(&self, query: impl IntoStatement) -> Result<T, AppError> {
        let statement = query.into_statement()?;
        let rows = self.fetch(&statement).await?;
        match rows.first() {
            Some(row) => hydrate(row, &self.metadata),
            None => Err(AppError::NotFound(self.metadata.label.clone())),
        }
    }

    // ------------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------------

    pub async fn count(&self) -> Result<i64, AppError> {
        let statement = QueryBuilder::new()
            .match_path(self.node("n"))
            .return_items(["count(n) AS count"])
            .build()?;

        self.count_rows(&statement).await
    }

    /// Number of records whose `property` equals `value`.
    pub async fn count_by_property(
        &self,
        property: &str,
        value: impl Into<JsonValue>,
    ) -> Result<i64, AppError> {
        self.ensure_mapped(property)?;
        let statement = QueryBuilder::new()
            .match_path(self.node("n").with_property(property, value))
            .return_items(["count(n) AS count"])
            .build()?;

        self.count_rows(&statement).await
    }

    /// Runs a custom count query.
    ///
    /// The query must project a single integer column. No rows count as 0;
    /// more than one row is a [`AppError::Consistency`] error.
    pub async fn count_with_query(&self, query: impl IntoStatement) -> Result<i64, AppError> {
        let statement = query.into_statement()?;
        self.count_rows(&statement).await
    }

    async fn count_rows(&self, statement: &Statement) -> Result<i64, AppError> {
        let rows = self.fetch_many(statement).await?;
        let row = match rows.as_slice() {
            [] => return Ok(0),
            [row] => row,
            _ => {
                return Err(AppError::Consistency {
                    expected: 1,
                    found: rows.len(),
                })
            }
        };

        let mut values = row.values();
        match (values.next(), values.next()) {
            (Some(value), None) => value.as_i64().ok_or_else(|| {
                AppError::Validation(format!(
                    "count query returned a non-integer value: {:?}",
                    value
                ))
            }),
            _ => Err(AppError::Validation(format!(
                "count query must return a single column, got {}",
                row.len()
            ))),
        }
    }
}
