//! Macro for convenient raw Cypher statements.

/// Builds a raw [`Statement`](crate::graph::Statement) with optional parameters.
///
/// # Usage
///
/// ```ignore
/// use neopersist::cypher;
///
/// // Statement without parameters
/// let statement = cypher!("MATCH (n) RETURN n");
///
/// // Statement with parameters
/// let statement = cypher!("MATCH (n) WHERE n.id = $id RETURN n", id = entity_id);
///
/// // Multiple parameters
/// let statement = cypher!(
///     "MATCH (n) WHERE n.id = $id AND n.name = $name RETURN n",
///     id = entity_id,
///     name = entity_name
/// );
///
/// let rows = manager.run(statement).await?;
/// ```
#[macro_export]
macro_rules! cypher {
    // Statement without parameters
    ($query:expr) => {
        $crate::graph::Statement::new($query)
    };
    // Statement with parameters
    ($query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $crate::graph::Statement::new($query)$(.param(stringify!($name), $value))+
    };
}
