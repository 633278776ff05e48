//! Derive macros for neopersist graph mappings.
//!
//! This crate provides `#[derive(GraphEntity)]`, which turns a plain struct
//! into a record the repository layer can persist as a graph node.
//!
//! Generated code references `::neopersist::...` paths, so the consuming
//! crate must depend on `neopersist` under that name.

use proc_macro::TokenStream;

mod graph_entity;

/// Derive macro declaring how a struct maps onto a graph node.
///
/// Each participating field carries a directive string: a comma-separated
/// list where `pk` marks the primary key and `property:<name>` names the
/// node property backing the field. Fields without `#[graph]` are not
/// mapped. The node label defaults to the struct name and can be overridden
/// on the struct.
///
/// Directives are validated when metadata is resolved, not at expansion
/// time, so a malformed mapping surfaces as a `MetadataError`.
///
/// # Requirements
///
/// - The struct must have named fields and implement `Default`
/// - Mapped field types must implement `Serialize` and `DeserializeOwned`
///
/// # Example
///
/// ```ignore
/// use neopersist::GraphEntity;
///
/// #[derive(GraphEntity, Default, Debug, Clone)]
/// #[graph(label = "Person")]
/// pub struct User {
///     #[graph("pk,property:userId")]
///     pub user_id: String,
///     #[graph("property:name")]
///     pub name: String,
///     // not persisted
///     pub session_token: Option<String>,
/// }
/// ```
#[proc_macro_derive(GraphEntity, attributes(graph))]
pub fn derive_graph_entity(input: TokenStream) -> TokenStream {
    graph_entity::derive_graph_entity_impl(input)
}
