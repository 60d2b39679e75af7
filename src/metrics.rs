//! Partition quality.
//!
//! # Modularity
//!
//! Newman-Girvan modularity compares the fraction of edge ends that stay
//! inside a community with what a random graph with the same degrees would
//! give:
//!
//! ```text
//! Q = sum_c [ e_c / 2m - (a_c / 2m)^2 ]
//! ```
//!
//! - `m`: number of edges
//! - `e_c`: twice the number of edges with both ends in `c`
//! - `a_c`: number of edge ends attached to vertices of `c`
//!
//! Edge direction is ignored. A single community always scores 0; values
//! above roughly 0.3 usually indicate real structure.
//!
//! # Example
//!
//! ```rust
//! use modgraph::graph::Graph;
//! use modgraph::metrics::modularity;
//!
//! // two triangles joined by one edge
//! let g = Graph::from_edges(6, false, &[0, 1, 1, 2, 2, 0, 3, 4, 4, 5, 5, 3, 2, 3]).unwrap();
//! let q = modularity(&g, &[0, 0, 0, 1, 1, 1]).unwrap();
//! assert!((q - 5.0 / 14.0).abs() < 1e-12);
//! ```

use crate::error::{Error, Result};
use crate::graph::{AttributeHandler, Graph};

/// Modularity of `membership` on `graph`.
///
/// `membership[v]` is the community of vertex `v`; ids need not be
/// consecutive. A graph without edges has modularity 0.
pub fn modularity<A: AttributeHandler>(graph: &Graph<A>, membership: &[usize]) -> Result<f64> {
    let n = graph.vertex_count();
    if membership.len() != n {
        return Err(Error::invalid(
            "membership",
            format!("length {} does not match vertex count {n}", membership.len()),
        ));
    }
    let m = graph.edge_count();
    if m == 0 {
        return Ok(0.0);
    }

    let types = membership.iter().max().map_or(0, |&c| c + 1);
    let mut e = vec![0.0; types];
    let mut a = vec![0.0; types];
    for (from, to) in graph.edges() {
        let (c1, c2) = (membership[from], membership[to]);
        if c1 == c2 {
            e[c1] += 2.0;
        }
        a[c1] += 1.0;
        a[c2] += 1.0;
    }

    let two_m = 2.0 * m as f64;
    Ok(e
        .iter()
        .zip(&a)
        .map(|(&ec, &ac)| ec / two_m - (ac / two_m) * (ac / two_m))
        .sum())
}
