use thiserror::Error;

use crate::eigen::SolverDiagnostic;

/// Result alias for `modgraph`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph storage, community detection and the eigensolver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed input or an argument outside its domain.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Vertex id outside `0..vertex_count`.
    #[error("invalid vertex {vertex} (graph has {vertex_count} vertices)")]
    InvalidVertex {
        /// Offending id.
        vertex: usize,
        /// Vertex count at the time of the call.
        vertex_count: usize,
    },

    /// Edge id outside `0..edge_count`.
    #[error("invalid edge {edge} (graph has {edge_count} edges)")]
    InvalidEdge {
        /// Offending id.
        edge: usize,
        /// Edge count at the time of the call.
        edge_count: usize,
    },

    /// No edge joins the two vertices.
    #[error("no edge between {from} and {to}")]
    NotFound {
        /// Tail vertex.
        from: usize,
        /// Head vertex.
        to: usize,
    },

    /// An allocation could not be satisfied.
    #[error("out of memory while {context}")]
    OutOfMemory {
        /// Operation that was allocating.
        context: &'static str,
    },

    /// Caller-provided eigensolver storage is smaller than the problem.
    #[error("insufficient storage for {what}: need {required}, have {available}")]
    InsufficientStorage {
        /// Buffer or dimension that is too small.
        what: &'static str,
        /// Requested size.
        required: usize,
        /// Preallocated size.
        available: usize,
    },

    /// The matrix-vector callback reported failure.
    #[error("matrix-vector operator failed: {0}")]
    OperatorFailure(#[source] Box<Error>),

    /// The iterative eigensolver stopped with a non-success status.
    #[error("eigensolver: {0}")]
    Solver(SolverDiagnostic),

    /// A power iteration collapsed to the zero vector.
    #[error("iteration diverged: {context}")]
    Diverged {
        /// Where it happened.
        context: &'static str,
    },

    /// Cooperative cancellation was requested.
    #[error("interrupted")]
    Interrupted,

    /// An attribute handler refused a lifecycle event.
    #[error("attribute handler: {0}")]
    Attribute(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            message: message.into(),
        }
    }
}

impl From<SolverDiagnostic> for Error {
    fn from(d: SolverDiagnostic) -> Self {
        Error::Solver(d)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory {
            context: "reserving graph storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = Error::InvalidVertex {
            vertex: 9,
            vertex_count: 4,
        };
        assert_eq!(e.to_string(), "invalid vertex 9 (graph has 4 vertices)");

        let e = Error::invalid("edges", "odd number of endpoints");
        assert!(e.to_string().contains("edges"));
    }

    #[test]
    fn operator_failure_keeps_source() {
        use std::error::Error as _;
        let e = Error::OperatorFailure(Box::new(Error::Interrupted));
        assert_eq!(e.source().map(|s| s.to_string()), Some("interrupted".into()));
    }
}
