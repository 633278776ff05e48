//! Cross-entity services built on top of repositories.

mod persistence;

pub use persistence::PersistenceManager;
