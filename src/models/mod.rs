//! Result models handed to callers.

mod graph;

pub use graph::{GraphEdge, GraphNode, GraphResult};
