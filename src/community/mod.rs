//! Community detection algorithms for graphs.
//!
//! Given a graph, find groups of vertices that are densely connected
//! inside and sparsely connected to each other.
//!
//! ## The Modularity Objective
//!
//! Both detectors are judged by **modularity** Q, which compares the edges
//! inside communities with the number expected in a random graph with the
//! same degree sequence:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - (k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = number of edges
//! - A_ij = number of edges between i and j
//! - k_i = degree of vertex i
//! - δ(c_i, c_j) = 1 if i and j are in the same community
//!
//! See [`crate::metrics::modularity`].
//!
//! ## Algorithms
//!
//! ### Edge Betweenness (Girvan-Newman)
//!
//! Divisive. Edges between communities carry many shortest paths, so the
//! edge with the highest betweenness is removed, betweenness is recomputed,
//! and so on until no edges are left. Slow, O(m² n), but the removal
//! order gives a complete [`Dendrogram`](crate::hierarchy::Dendrogram).
//!
//! ### Leading Eigenvector
//!
//! Spectral and divisive. Each community is split in two by the signs of
//! the leading eigenvector of its modularity matrix, and splitting stops
//! when no community has a vector with mixed signs. Two drivers are
//! available, plus [`leading_eigenvector_step`] for callers that want to
//! choose which community to split next.
//!
//! ## Usage
//!
//! ```rust
//! use modgraph::graph::Graph;
//! use modgraph::community::{CommunityDetection, LeadingEigenvector};
//!
//! // two triangles joined by one edge
//! let g = Graph::from_edges(6, false, &[0, 1, 1, 2, 2, 0, 3, 4, 4, 5, 5, 3, 2, 3]).unwrap();
//! let communities = LeadingEigenvector::new().with_seed(1).detect(&g).unwrap();
//! assert_eq!(communities, vec![0, 0, 0, 1, 1, 1]);
//! ```
//!
//! ## References
//!
//! - Girvan & Newman (2002). "Community structure in social and biological networks."
//! - Newman (2006). "Finding community structure in networks using the
//!   eigenvectors of matrices." Phys. Rev. E 74, 036104.
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

mod edge_betweenness;
mod leading_eigenvector;
mod traits;

pub use edge_betweenness::{edge_betweenness_merges, EdgeBetweenness, EdgeBetweennessResult};
pub use leading_eigenvector::{
    leading_eigenvector_step, LeadingEigenvector, LeadingEigenvectorNaive, LeadingEigenvectorResult,
    StepOutcome,
};
pub use traits::CommunityDetection;
