//! Per-vertex neighbour and incident-edge lists.
//!
//! Algorithms that repeatedly walk neighbourhoods, or that delete edges
//! logically while they run, work on one of these views instead of the
//! graph itself. The views own their lists, so mutating them never touches
//! the graph.

use super::{AttributeHandler, Direction, Graph};
use crate::error::Result;

/// Neighbour vertex ids of every vertex, materialized up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyList {
    lists: Vec<Vec<usize>>,
}

impl AdjacencyList {
    /// Collect neighbours for `mode` (forced to `All` on undirected graphs).
    pub fn new<A: AttributeHandler>(graph: &Graph<A>, mode: Direction) -> Result<Self> {
        let lists = (0..graph.vertex_count())
            .map(|v| graph.neighbors(v, mode))
            .collect::<Result<_>>()?;
        Ok(Self { lists })
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether the view covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Neighbours of `v`. Panics if `v` is out of range.
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.lists[v]
    }

    /// Mutable neighbour list of `v`.
    pub fn neighbors_mut(&mut self, v: usize) -> &mut Vec<usize> {
        &mut self.lists[v]
    }

    /// Drop one occurrence of `u` from the list of `v` by swapping in the last entry.
    pub fn remove_neighbor(&mut self, v: usize, u: usize) -> bool {
        swap_remove_value(&mut self.lists[v], u)
    }
}

/// Incident edge ids of every vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidenceList {
    lists: Vec<Vec<usize>>,
}

impl IncidenceList {
    /// Collect incident edges for `mode` (forced to `All` on undirected graphs).
    pub fn new<A: AttributeHandler>(graph: &Graph<A>, mode: Direction) -> Result<Self> {
        let lists = (0..graph.vertex_count())
            .map(|v| graph.incident(v, mode))
            .collect::<Result<_>>()?;
        Ok(Self { lists })
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether the view covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Edges incident on `v`.
    pub fn edges(&self, v: usize) -> &[usize] {
        &self.lists[v]
    }

    /// Drop one occurrence of edge `e` from the list of `v` by swapping in the last entry.
    pub fn remove_edge(&mut self, v: usize, e: usize) -> bool {
        swap_remove_value(&mut self.lists[v], e)
    }
}

fn swap_remove_value(list: &mut Vec<usize>, value: usize) -> bool {
    match list.iter().position(|&x| x == value) {
        Some(pos) => {
            list.swap_remove(pos);
            true
        }
        None => false,
    }
}

/// Neighbour lists built on first access and cached for the view's lifetime.
///
/// Useful when only a few vertices will be visited. With `simplify`, self
/// loops and repeated neighbours are dropped when a list is built.
#[derive(Debug)]
pub struct LazyAdjacencyList<'g, A: AttributeHandler = ()> {
    graph: &'g Graph<A>,
    mode: Direction,
    simplify: bool,
    cache: Vec<Option<Vec<usize>>>,
}

impl<'g, A: AttributeHandler> LazyAdjacencyList<'g, A> {
    /// An empty cache over `graph`.
    pub fn new(graph: &'g Graph<A>, mode: Direction, simplify: bool) -> Self {
        Self {
            graph,
            mode,
            simplify,
            cache: vec![None; graph.vertex_count()],
        }
    }

    /// Neighbours of `v`, building the list on first access.
    pub fn neighbors(&mut self, v: usize) -> Result<&[usize]> {
        self.graph.check_vertex(v)?;
        let slot = &mut self.cache[v];
        if slot.is_none() {
            let mut list = self.graph.neighbors(v, self.mode)?;
            if self.simplify {
                list.retain(|&u| u != v);
                list.sort_unstable();
                list.dedup();
            }
            *slot = Some(list);
        }
        Ok(slot.as_deref().unwrap_or(&[]))
    }

    /// Number of vertices whose list has been built.
    pub fn materialized(&self) -> usize {
        self.cache.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle_with_loop() -> Graph {
        Graph::from_edges(3, false, &[0, 1, 1, 2, 2, 0, 1, 1, 0, 1]).unwrap()
    }

    #[test]
    fn adjacency_matches_graph() {
        let g = triangle_with_loop();
        let adj = AdjacencyList::new(&g, Direction::All).unwrap();
        assert_eq!(adj.len(), 3);
        for v in 0..3 {
            assert_eq!(adj.neighbors(v), g.neighbors(v, Direction::All).unwrap());
        }
    }

    #[test]
    fn removal_swaps_with_last() {
        let g = Graph::from_edges(4, true, &[0, 1, 0, 2, 0, 3]).unwrap();
        let mut adj = AdjacencyList::new(&g, Direction::Out).unwrap();
        assert!(adj.remove_neighbor(0, 1));
        assert_eq!(adj.neighbors(0), &[3, 2]);
        assert!(!adj.remove_neighbor(0, 1));

        let mut inc = IncidenceList::new(&g, Direction::Out).unwrap();
        assert!(inc.remove_edge(0, 0));
        assert_eq!(inc.edges(0), &[2, 1]);
        assert!(inc.edges(3).is_empty());
    }

    #[test]
    fn lazy_builds_on_demand() {
        let g = triangle_with_loop();
        let mut lazy = LazyAdjacencyList::new(&g, Direction::All, false);
        assert_eq!(lazy.materialized(), 0);
        let mut raw = lazy.neighbors(1).unwrap().to_vec();
        raw.sort_unstable();
        assert_eq!(raw, vec![0, 0, 1, 1, 2]);
        assert_eq!(lazy.materialized(), 1);
        assert!(lazy.neighbors(7).is_err());

        let mut simple = LazyAdjacencyList::new(&g, Direction::All, true);
        assert_eq!(simple.neighbors(1).unwrap(), &[0, 2]);
    }
}
