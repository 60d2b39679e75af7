//! # modgraph
//!
//! Graph storage and community structure: an indexed edge list graph,
//! divisive community detection (edge betweenness, leading eigenvector),
//! motif census, and a reverse-communication eigensolver for operators given
//! only as matrix-vector products.
//!
//! **Default build** includes community detection and motifs. `petgraph`
//! interop and `serde` derives are opt-in via feature flags.
//!
//! ```rust
//! use modgraph::community::{CommunityDetection, EdgeBetweenness};
//! use modgraph::{metrics::modularity, Graph};
//!
//! // two triangles joined by one edge
//! let g = Graph::from_edges(6, false, &[0, 1, 1, 2, 2, 0, 3, 4, 4, 5, 5, 3, 2, 3]).unwrap();
//! let membership = EdgeBetweenness::new().detect(&g).unwrap();
//! assert_eq!(membership[0], membership[2]);
//! assert_ne!(membership[2], membership[3]);
//! assert!(modularity(&g, &membership).unwrap() > 0.3);
//! ```

#[cfg(feature = "community")]
pub mod community;
pub mod eigen;
/// Error types used across `modgraph`.
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod interrupt;
pub mod metrics;
#[cfg(feature = "motifs")]
pub mod motifs;

#[cfg(all(test, feature = "community", feature = "motifs"))]
mod scenario_tests;

pub use error::{Error, Result};
pub use graph::{AttributeHandler, Direction, EdgeSelector, Graph, VertexSelector};
pub use hierarchy::{community_to_membership, Dendrogram};
pub use interrupt::Interrupt;
pub use metrics::modularity;

pub use eigen::{
    solve_nonsymmetric, solve_symmetric, EigenOptions, EigenStorage, MatVec, Mode, NonSymmetricEigen,
    SolverDiagnostic, SymmetricEigen, Which,
};

#[cfg(feature = "community")]
pub use community::{
    CommunityDetection, EdgeBetweenness, LeadingEigenvector, LeadingEigenvectorNaive,
};

#[cfg(feature = "motifs")]
pub use motifs::{Motifs, Sample};
