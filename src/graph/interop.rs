//! Conversion from `petgraph`.

use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

use super::Graph;
use crate::error::{Error, Result};

impl<N, E, Ty: EdgeType> TryFrom<&petgraph::Graph<N, E, Ty>> for Graph {
    type Error = Error;

    /// Node indices become vertex ids; edge indices become edge ids.
    ///
    /// Fails only when the edge columns cannot be allocated.
    fn try_from(pg: &petgraph::Graph<N, E, Ty>) -> Result<Self> {
        let mut g = Graph::new(pg.node_count(), Ty::is_directed());
        let flat: Vec<usize> = pg
            .edge_references()
            .flat_map(|e| [e.source().index(), e.target().index()])
            .collect();
        g.add_edges(&flat)?;
        Ok(g)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::Direction;
    use petgraph::graph::{DiGraph, UnGraph};

    #[test]
    fn converts_undirected() {
        let mut pg = UnGraph::<(), ()>::new_undirected();
        let a = pg.add_node(());
        let b = pg.add_node(());
        let c = pg.add_node(());
        pg.add_edge(a, b, ());
        pg.add_edge(c, b, ());
        let g: Graph = Graph::try_from(&pg).unwrap();
        assert!(!g.is_directed());
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn converts_directed() {
        let mut pg = DiGraph::<&str, f64>::new();
        let a = pg.add_node("a");
        let b = pg.add_node("b");
        pg.add_edge(b, a, 0.5);
        let g: Graph = Graph::try_from(&pg).unwrap();
        assert!(g.is_directed());
        assert_eq!(g.neighbors(1, Direction::Out).unwrap(), vec![0]);
    }

    #[test]
    fn conversion_keeps_every_edge() {
        let mut pg = UnGraph::<(), ()>::new_undirected();
        let nodes: Vec<_> = (0..4).map(|_| pg.add_node(())).collect();
        for w in nodes.windows(2) {
            pg.add_edge(w[0], w[1], ());
        }
        pg.add_edge(nodes[0], nodes[0], ());
        let g: Graph = Graph::try_from(&pg).unwrap();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), pg.edge_count());
        assert_eq!(g.edge(3).unwrap(), (0, 0));
    }
}
