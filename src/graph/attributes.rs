//! Lifecycle hooks for data that lives beside a [`Graph`](super::Graph).
//!
//! The graph never reads attribute values. It only forwards structural
//! events together with the index maps an external store needs to keep its
//! rows aligned with vertex and edge ids.

use crate::error::Result;

/// Receives structural events from the owning graph.
///
/// Maps passed to the delete hooks are indexed by the *old* id and hold the
/// new id of a surviving element, or `None` if it was removed.
///
/// Hooks that return `Result` run before the graph commits the change, so an
/// `Err` aborts the mutation and leaves the graph as it was.
pub trait AttributeHandler: Clone {
    /// Called once when the graph is created.
    fn on_init(&mut self, _vertex_count: usize) -> Result<()> {
        Ok(())
    }

    /// Called when the graph is dropped.
    fn on_destroy(&mut self) {}

    /// Produce the handler for a copied graph.
    fn on_copy(&self) -> Result<Self> {
        Ok(self.clone())
    }

    /// `count` isolated vertices are about to be appended.
    fn on_add_vertices(&mut self, _count: usize) -> Result<()> {
        Ok(())
    }

    /// Vertices (and their incident edges) are about to be removed.
    fn on_delete_vertices(
        &mut self,
        _vertex_map: &[Option<usize>],
        _edge_map: &[Option<usize>],
    ) -> Result<()> {
        Ok(())
    }

    /// Edges given as a flat `[from, to, from, to, ..]` list are about to be appended.
    fn on_add_edges(&mut self, _pairs: &[usize]) -> Result<()> {
        Ok(())
    }

    /// Edges are about to be removed.
    fn on_delete_edges(&mut self, _edge_map: &[Option<usize>]) -> Result<()> {
        Ok(())
    }

    /// Edge ids are about to be reordered; new edge `i` is old edge `order[i]`.
    fn on_permute_edges(&mut self, _order: &[usize]) -> Result<()> {
        Ok(())
    }
}

/// No attributes.
impl AttributeHandler for () {}

#[cfg(test)]
pub(crate) mod recording {
    //! A handler that keeps one row per vertex and per edge, for tests.

    use super::AttributeHandler;
    use crate::error::{Error, Result};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct RowStore {
        pub vertices: Vec<usize>,
        pub edges: Vec<(usize, usize)>,
        pub refuse_edges: bool,
        pub copies: usize,
    }

    impl AttributeHandler for RowStore {
        fn on_init(&mut self, vertex_count: usize) -> Result<()> {
            self.vertices = (0..vertex_count).collect();
            Ok(())
        }

        fn on_copy(&self) -> Result<Self> {
            let mut c = self.clone();
            c.copies += 1;
            Ok(c)
        }

        fn on_add_vertices(&mut self, count: usize) -> Result<()> {
            let base = self.vertices.len();
            self.vertices.extend(base..base + count);
            Ok(())
        }

        fn on_delete_vertices(
            &mut self,
            vertex_map: &[Option<usize>],
            edge_map: &[Option<usize>],
        ) -> Result<()> {
            self.vertices = keep(&self.vertices, vertex_map);
            self.edges = keep(&self.edges, edge_map);
            Ok(())
        }

        fn on_add_edges(&mut self, pairs: &[usize]) -> Result<()> {
            if self.refuse_edges {
                return Err(Error::Attribute("edge rows are frozen".into()));
            }
            self.edges
                .extend(pairs.chunks_exact(2).map(|p| (p[0], p[1])));
            Ok(())
        }

        fn on_delete_edges(&mut self, edge_map: &[Option<usize>]) -> Result<()> {
            self.edges = keep(&self.edges, edge_map);
            Ok(())
        }

        fn on_permute_edges(&mut self, order: &[usize]) -> Result<()> {
            self.edges = order.iter().map(|&old| self.edges[old]).collect();
            Ok(())
        }
    }

    fn keep<T: Copy>(rows: &[T], map: &[Option<usize>]) -> Vec<T> {
        let survivors = map.iter().flatten().count();
        let mut out = vec![None; survivors];
        for (row, new) in rows.iter().zip(map) {
            if let Some(new) = new {
                out[*new] = Some(*row);
            }
        }
        out.into_iter().flatten().collect()
    }
}
