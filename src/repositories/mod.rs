//! Data access layer for mapped record types.
//!
//! [`Repository<T>`] provides typed CRUD, lookups and counts for one
//! `GraphEntity` type and hydrates query results back into records.

mod hydrate;
mod repository;

pub use repository::Repository;
