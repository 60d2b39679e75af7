//! Export to dense and flat representations.

use faer::Mat;

use super::{AttributeHandler, Graph};

/// Which triangle of an undirected adjacency matrix to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdjacencyKind {
    /// Entries at `(min, max)`.
    Upper,
    /// Entries at `(max, min)`.
    Lower,
    /// Symmetric matrix.
    #[default]
    Both,
}

impl<A: AttributeHandler> Graph<A> {
    /// Dense `n x n` adjacency matrix; parallel edges add up.
    ///
    /// Directed graphs always fill `(from, to)` and ignore `kind`. A self
    /// loop contributes 1 to its diagonal cell in every mode.
    pub fn adjacency_matrix(&self, kind: AdjacencyKind) -> Mat<f64> {
        let n = self.vertex_count();
        let mut m = Mat::<f64>::zeros(n, n);
        for (from, to) in self.edges() {
            if self.is_directed() {
                m[(from, to)] += 1.0;
                continue;
            }
            let (lo, hi) = (from.min(to), from.max(to));
            match kind {
                AdjacencyKind::Upper => m[(lo, hi)] += 1.0,
                AdjacencyKind::Lower => m[(hi, lo)] += 1.0,
                AdjacencyKind::Both => {
                    m[(lo, hi)] += 1.0;
                    if lo != hi {
                        m[(hi, lo)] += 1.0;
                    }
                }
            }
        }
        m
    }

    /// Flat edge list.
    ///
    /// Row-wise gives `[f0, t0, f1, t1, ..]`; `by_column` gives
    /// `[f0, f1, .., t0, t1, ..]`.
    pub fn edge_list(&self, by_column: bool) -> Vec<usize> {
        let m = self.edge_count();
        let mut out = vec![0; 2 * m];
        for (e, (from, to)) in self.edges().enumerate() {
            if by_column {
                out[e] = from;
                out[m + e] = to;
            } else {
                out[2 * e] = from;
                out[2 * e + 1] = to;
            }
        }
        out
    }
}
