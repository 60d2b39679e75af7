//! Community detection traits.

use crate::error::Result;
use crate::graph::{AttributeHandler, Graph};

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a graph.
    ///
    /// Returns a mapping from vertex id to community id; ids are
    /// consecutive from 0.
    fn detect<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<Vec<usize>>;
}
