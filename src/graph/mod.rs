//! Indexed edge list graph storage.
//!
//! Edges live in two parallel columns (`from`, `to`) in insertion order, so an
//! edge id is simply its position. Two permutations of the edge ids, one
//! ordered by tail and one ordered by head, plus per-vertex offsets into them
//! (CSR style) give O(1) access to the out- and in-edges of any vertex:
//!
//! ```text
//! from      = [0, 2, 0, 1]          out_order = [0, 2, 3, 1]
//! to        = [1, 0, 2, 2]          out_start = [0, 2, 3, 4]
//!                                   (vertex 0 owns out_order[0..2] = edges 0, 2)
//! ```
//!
//! Mutations are all-or-nothing: an error (allocation failure, invalid id, an
//! attribute handler refusing the change) leaves the graph unchanged.
//! Deletions build replacement columns and move-assign them over the old
//! ones. `add_edges` appends to the columns in place and truncates them back
//! to their old length if rebuilding the index or the handler fails.
//!
//! Undirected graphs use the same layout. Their edges are stored as given
//! and reported with `(min, max)` endpoints.
//!
//! ```rust
//! use modgraph::{Direction, Graph};
//!
//! let mut g = Graph::new(4, false);
//! g.add_edges(&[0, 1, 1, 2, 2, 3]).unwrap();
//! assert_eq!(g.neighbors(1, Direction::All).unwrap(), vec![2, 0]);
//! assert_eq!(g.edge(0).unwrap(), (0, 1));
//! ```

pub mod adjacency;
mod attributes;
pub mod conversion;
#[cfg(feature = "petgraph")]
mod interop;
mod selector;

pub use attributes::AttributeHandler;
pub use selector::{EdgeSelector, VertexSelector};

#[cfg(test)]
pub(crate) use attributes::recording;

use crate::error::{Error, Result};

/// Edge direction relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Edges leaving the vertex.
    Out,
    /// Edges entering the vertex.
    In,
    /// Both; the out part is listed first.
    All,
}

impl Direction {
    fn has_out(self) -> bool {
        matches!(self, Direction::Out | Direction::All)
    }

    fn has_in(self) -> bool {
        matches!(self, Direction::In | Direction::All)
    }
}

/// A graph in indexed edge list form.
///
/// `A` receives lifecycle events; the default `()` carries no attributes.
#[derive(Debug)]
pub struct Graph<A: AttributeHandler = ()> {
    n: usize,
    directed: bool,
    from: Vec<usize>,
    to: Vec<usize>,
    out_order: Vec<usize>,
    in_order: Vec<usize>,
    out_start: Vec<usize>,
    in_start: Vec<usize>,
    attr: A,
}

/// Sorted edge permutations with their vertex offsets.
struct Index {
    out_order: Vec<usize>,
    in_order: Vec<usize>,
    out_start: Vec<usize>,
    in_start: Vec<usize>,
}

impl Index {
    fn build(n: usize, from: &[usize], to: &[usize]) -> Result<Self> {
        let (out_order, out_start) = order_by(n, from)?;
        let (in_order, in_start) = order_by(n, to)?;
        Ok(Self {
            out_order,
            in_order,
            out_start,
            in_start,
        })
    }
}

/// Stable counting sort of edge ids by `key`, plus the offsets of each key.
fn order_by(n: usize, key: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut start = Vec::new();
    start.try_reserve_exact(n + 1)?;
    start.resize(n + 1, 0);
    for &k in key {
        start[k + 1] += 1;
    }
    for v in 0..n {
        start[v + 1] += start[v];
    }

    let mut next = Vec::new();
    next.try_reserve_exact(n)?;
    next.extend_from_slice(&start[..n]);

    let mut order = Vec::new();
    order.try_reserve_exact(key.len())?;
    order.resize(key.len(), 0);
    for (e, &k) in key.iter().enumerate() {
        order[next[k]] = e;
        next[k] += 1;
    }
    Ok((order, start))
}

impl Graph<()> {
    /// An empty graph with `vertex_count` isolated vertices.
    pub fn new(vertex_count: usize, directed: bool) -> Self {
        Self {
            n: vertex_count,
            directed,
            from: Vec::new(),
            to: Vec::new(),
            out_order: Vec::new(),
            in_order: Vec::new(),
            out_start: vec![0; vertex_count + 1],
            in_start: vec![0; vertex_count + 1],
            attr: (),
        }
    }

    /// Build a graph from a flat `[from, to, ..]` list.
    pub fn from_edges(vertex_count: usize, directed: bool, edges: &[usize]) -> Result<Self> {
        let mut g = Self::new(vertex_count, directed);
        g.add_edges(edges)?;
        Ok(g)
    }
}

impl<A: AttributeHandler> Graph<A> {
    /// An empty graph whose structural events are forwarded to `attr`.
    pub fn with_attributes(vertex_count: usize, directed: bool, mut attr: A) -> Result<Self> {
        attr.on_init(vertex_count)?;
        Ok(Self {
            n: vertex_count,
            directed,
            from: Vec::new(),
            to: Vec::new(),
            out_order: Vec::new(),
            in_order: Vec::new(),
            out_start: vec![0; vertex_count + 1],
            in_start: vec![0; vertex_count + 1],
            attr,
        })
    }

    /// Deep copy; the handler decides how its own state is copied.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            n: self.n,
            directed: self.directed,
            from: self.from.clone(),
            to: self.to.clone(),
            out_order: self.out_order.clone(),
            in_order: self.in_order.clone(),
            out_start: self.out_start.clone(),
            in_start: self.in_start.clone(),
            attr: self.attr.on_copy()?,
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.n
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.from.len()
    }

    /// Whether edges are directed.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// The attribute handler.
    pub fn attributes(&self) -> &A {
        &self.attr
    }

    /// Mutable access to the attribute handler.
    pub fn attributes_mut(&mut self) -> &mut A {
        &mut self.attr
    }

    pub(crate) fn check_vertex(&self, v: usize) -> Result<()> {
        if v < self.n {
            Ok(())
        } else {
            Err(Error::InvalidVertex {
                vertex: v,
                vertex_count: self.n,
            })
        }
    }

    fn check_edge(&self, e: usize) -> Result<()> {
        if e < self.from.len() {
            Ok(())
        } else {
            Err(Error::InvalidEdge {
                edge: e,
                edge_count: self.from.len(),
            })
        }
    }

    fn commit(&mut self, index: Index) {
        self.out_order = index.out_order;
        self.in_order = index.in_order;
        self.out_start = index.out_start;
        self.in_start = index.in_start;
    }

    /// Append edges given as a flat `[from, to, from, to, ..]` list.
    ///
    /// New edges get consecutive ids after the existing ones.
    pub fn add_edges(&mut self, edges: &[usize]) -> Result<()> {
        if edges.len() % 2 != 0 {
            return Err(Error::invalid(
                "edges",
                format!("odd number of endpoints ({})", edges.len()),
            ));
        }
        if let Some(&v) = edges.iter().find(|&&v| v >= self.n) {
            return Err(Error::InvalidVertex {
                vertex: v,
                vertex_count: self.n,
            });
        }

        let old = self.from.len();
        let added = edges.len() / 2;
        self.from.try_reserve(added)?;
        self.to.try_reserve(added)?;
        for pair in edges.chunks_exact(2) {
            self.from.push(pair[0]);
            self.to.push(pair[1]);
        }

        let staged = Index::build(self.n, &self.from, &self.to)
            .and_then(|index| self.attr.on_add_edges(edges).map(|()| index));
        match staged {
            Ok(index) => {
                self.commit(index);
                Ok(())
            }
            Err(e) => {
                self.from.truncate(old);
                self.to.truncate(old);
                Err(e)
            }
        }
    }

    /// Append a single edge and return its id.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<usize> {
        self.add_edges(&[from, to])?;
        Ok(self.from.len() - 1)
    }

    /// Append `count` isolated vertices. Adding zero vertices is a no-op.
    pub fn add_vertices(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let m = self.from.len();
        let new_len = self.n + count + 1;
        self.out_start
            .try_reserve(new_len - self.out_start.len())?;
        self.in_start.try_reserve(new_len - self.in_start.len())?;
        self.attr.on_add_vertices(count)?;
        self.out_start.resize(new_len, m);
        self.in_start.resize(new_len, m);
        self.n += count;
        Ok(())
    }

    /// Remove edges. Remaining edges keep their relative order; ids are compacted.
    pub fn delete_edges(&mut self, edges: &EdgeSelector) -> Result<()> {
        let m = self.from.len();
        let mut doomed = vec![false; m];
        for e in edges.resolve(m)? {
            doomed[e] = true;
        }

        let mut edge_map = Vec::with_capacity(m);
        let mut from = Vec::new();
        let mut to = Vec::new();
        for e in 0..m {
            if doomed[e] {
                edge_map.push(None);
            } else {
                edge_map.push(Some(from.len()));
                from.push(self.from[e]);
                to.push(self.to[e]);
            }
        }

        let index = Index::build(self.n, &from, &to)?;
        self.attr.on_delete_edges(&edge_map)?;
        self.from = from;
        self.to = to;
        self.commit(index);
        Ok(())
    }

    /// Remove vertices and every edge touching them.
    ///
    /// Surviving vertices are renumbered densely, keeping their relative order.
    pub fn delete_vertices(&mut self, vertices: &VertexSelector) -> Result<()> {
        let mut doomed = vec![false; self.n];
        for v in vertices.resolve(self.n)? {
            doomed[v] = true;
        }

        let mut vertex_map = Vec::with_capacity(self.n);
        let mut survivors = 0;
        for &gone in &doomed {
            if gone {
                vertex_map.push(None);
            } else {
                vertex_map.push(Some(survivors));
                survivors += 1;
            }
        }

        let m = self.from.len();
        let mut edge_map = Vec::with_capacity(m);
        let mut from = Vec::new();
        let mut to = Vec::new();
        for e in 0..m {
            match (vertex_map[self.from[e]], vertex_map[self.to[e]]) {
                (Some(f), Some(t)) => {
                    edge_map.push(Some(from.len()));
                    from.push(f);
                    to.push(t);
                }
                _ => edge_map.push(None),
            }
        }

        let index = Index::build(survivors, &from, &to)?;
        self.attr.on_delete_vertices(&vertex_map, &edge_map)?;
        self.n = survivors;
        self.from = from;
        self.to = to;
        self.commit(index);
        Ok(())
    }

    /// Reorder edge ids: new edge `i` is old edge `order[i]`.
    pub fn permute_edges(&mut self, order: &[usize]) -> Result<()> {
        let m = self.from.len();
        if order.len() != m {
            return Err(Error::invalid(
                "order",
                format!("expected {m} entries, got {}", order.len()),
            ));
        }
        let mut seen = vec![false; m];
        for &e in order {
            self.check_edge(e)?;
            if std::mem::replace(&mut seen[e], true) {
                return Err(Error::invalid("order", format!("edge {e} listed twice")));
            }
        }

        let from: Vec<usize> = order.iter().map(|&e| self.from[e]).collect();
        let to: Vec<usize> = order.iter().map(|&e| self.to[e]).collect();
        let index = Index::build(self.n, &from, &to)?;
        self.attr.on_permute_edges(order)?;
        self.from = from;
        self.to = to;
        self.commit(index);
        Ok(())
    }

    fn effective(&self, mode: Direction) -> Direction {
        if self.directed {
            mode
        } else {
            Direction::All
        }
    }

    /// Edge ids leaving `v`, ordered by id.
    pub(crate) fn out_edges(&self, v: usize) -> &[usize] {
        &self.out_order[self.out_start[v]..self.out_start[v + 1]]
    }

    /// Edge ids entering `v`, ordered by id.
    pub(crate) fn in_edges(&self, v: usize) -> &[usize] {
        &self.in_order[self.in_start[v]..self.in_start[v + 1]]
    }

    /// Stored `(from, to)` without canonicalization.
    pub(crate) fn raw_edge(&self, e: usize) -> (usize, usize) {
        (self.from[e], self.to[e])
    }

    /// Adjacent vertices. Undirected graphs always use [`Direction::All`].
    ///
    /// A self loop shows up twice under `All`.
    pub fn neighbors(&self, v: usize, mode: Direction) -> Result<Vec<usize>> {
        self.check_vertex(v)?;
        let mode = self.effective(mode);
        let mut out = Vec::with_capacity(self.degree_unchecked(v, mode));
        if mode.has_out() {
            out.extend(self.out_edges(v).iter().map(|&e| self.to[e]));
        }
        if mode.has_in() {
            out.extend(self.in_edges(v).iter().map(|&e| self.from[e]));
        }
        Ok(out)
    }

    /// Incident edge ids, in the same order as [`Graph::neighbors`].
    pub fn incident(&self, v: usize, mode: Direction) -> Result<Vec<usize>> {
        self.check_vertex(v)?;
        let mode = self.effective(mode);
        let mut out = Vec::with_capacity(self.degree_unchecked(v, mode));
        if mode.has_out() {
            out.extend_from_slice(self.out_edges(v));
        }
        if mode.has_in() {
            out.extend_from_slice(self.in_edges(v));
        }
        Ok(out)
    }

    fn degree_unchecked(&self, v: usize, mode: Direction) -> usize {
        let mut d = 0;
        if mode.has_out() {
            d += self.out_start[v + 1] - self.out_start[v];
        }
        if mode.has_in() {
            d += self.in_start[v + 1] - self.in_start[v];
        }
        d
    }

    /// Number of incident edge ends. With `loops == false` self loops are not counted.
    pub fn degree(&self, v: usize, mode: Direction, loops: bool) -> Result<usize> {
        self.check_vertex(v)?;
        let mode = self.effective(mode);
        let mut d = self.degree_unchecked(v, mode);
        if !loops {
            if mode.has_out() {
                d -= self.out_edges(v).iter().filter(|&&e| self.to[e] == v).count();
            }
            if mode.has_in() {
                d -= self.in_edges(v).iter().filter(|&&e| self.from[e] == v).count();
            }
        }
        Ok(d)
    }

    /// [`Graph::degree`] for each selected vertex.
    pub fn degrees(&self, vertices: &VertexSelector, mode: Direction, loops: bool) -> Result<Vec<usize>> {
        vertices
            .resolve(self.n)?
            .into_iter()
            .map(|v| self.degree(v, mode, loops))
            .collect()
    }

    /// Endpoints of edge `e`; `(min, max)` for undirected graphs.
    pub fn edge(&self, e: usize) -> Result<(usize, usize)> {
        self.check_edge(e)?;
        Ok(self.canonical(e))
    }

    fn canonical(&self, e: usize) -> (usize, usize) {
        let (f, t) = (self.from[e], self.to[e]);
        if !self.directed && f > t {
            (t, f)
        } else {
            (f, t)
        }
    }

    /// All edges as `(from, to)` in id order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.from.len()).map(move |e| self.canonical(e))
    }

    fn find_edge(&self, from: usize, to: usize, directed: bool, skip: &dyn Fn(usize) -> bool) -> Option<usize> {
        let forward = self
            .out_edges(from)
            .iter()
            .copied()
            .find(|&e| self.to[e] == to && !skip(e));
        if forward.is_some() || (self.directed && directed) {
            return forward;
        }
        self.in_edges(from)
            .iter()
            .copied()
            .find(|&e| self.from[e] == to && !skip(e))
    }

    /// Id of an edge joining `from` and `to`.
    ///
    /// With `directed == false`, or in an undirected graph, either orientation matches.
    pub fn edge_id(&self, from: usize, to: usize, directed: bool) -> Result<usize> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        self.find_edge(from, to, directed, &|_| false)
            .ok_or(Error::NotFound { from, to })
    }

    /// Ids for a flat list of vertex pairs. Each edge is matched at most once,
    /// so repeated pairs resolve to distinct parallel edges.
    pub fn edge_ids(&self, pairs: &[usize], directed: bool) -> Result<Vec<usize>> {
        if pairs.len() % 2 != 0 {
            return Err(Error::invalid(
                "pairs",
                format!("odd number of endpoints ({})", pairs.len()),
            ));
        }
        let mut used = vec![false; self.from.len()];
        let mut ids = Vec::with_capacity(pairs.len() / 2);
        for pair in pairs.chunks_exact(2) {
            let (from, to) = (pair[0], pair[1]);
            self.check_vertex(from)?;
            self.check_vertex(to)?;
            let e = self
                .find_edge(from, to, directed, &|e| used[e])
                .ok_or(Error::NotFound { from, to })?;
            used[e] = true;
            ids.push(e);
        }
        Ok(ids)
    }
}

impl<A: AttributeHandler> Drop for Graph<A> {
    fn drop(&mut self) {
        self.attr.on_destroy();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::recording::RowStore;
    use super::*;
    use proptest::prelude::*;

    fn assert_index(g: &Graph<impl AttributeHandler>) {
        let m = g.edge_count();
        for start in [&g.out_start, &g.in_start] {
            assert_eq!(start.len(), g.vertex_count() + 1);
            assert_eq!(start[0], 0);
            assert_eq!(start[g.vertex_count()], m);
            assert!(start.windows(2).all(|w| w[0] <= w[1]));
        }
        for e in 0..m {
            let (f, t) = g.raw_edge(e);
            assert!(g.out_edges(f).contains(&e));
            assert!(g.in_edges(t).contains(&e));
        }
    }

    #[test]
    fn add_edges_builds_sorted_index() {
        let g = Graph::from_edges(3, true, &[0, 1, 2, 0, 0, 2, 1, 2]).unwrap();
        assert_eq!(g.out_order, vec![0, 2, 3, 1]);
        assert_eq!(g.out_start, vec![0, 2, 3, 4]);
        assert_eq!(g.neighbors(0, Direction::Out).unwrap(), vec![1, 2]);
        assert_eq!(g.neighbors(2, Direction::In).unwrap(), vec![0, 1]);
        assert_eq!(g.neighbors(2, Direction::All).unwrap(), vec![0, 0, 1]);
        assert_index(&g);
    }

    #[test]
    fn add_edges_rejects_bad_input_without_change() {
        let mut g = Graph::from_edges(3, false, &[0, 1]).unwrap();
        assert!(matches!(
            g.add_edges(&[0, 1, 2]),
            Err(Error::InvalidArgument { name: "edges", .. })
        ));
        assert!(matches!(
            g.add_edges(&[0, 3]),
            Err(Error::InvalidVertex { vertex: 3, .. })
        ));
        assert_eq!(g.edge_count(), 1);
        assert_index(&g);
    }

    #[test]
    fn refused_edges_roll_back() {
        let store = RowStore::default();
        let mut g = Graph::with_attributes(3, false, store).unwrap();
        g.add_edges(&[0, 1]).unwrap();
        g.attributes_mut().refuse_edges = true;
        assert!(matches!(g.add_edges(&[1, 2]), Err(Error::Attribute(_))));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors(2, Direction::All).unwrap(), Vec::<usize>::new());
        assert_eq!(g.attributes().edges, vec![(0, 1)]);
    }

    #[test]
    fn undirected_forces_all_and_canonical_endpoints() {
        let g = Graph::from_edges(3, false, &[2, 0, 1, 2]).unwrap();
        assert_eq!(g.edge(0).unwrap(), (0, 2));
        assert_eq!(g.neighbors(2, Direction::Out).unwrap(), vec![0, 1]);
        assert_eq!(g.incident(2, Direction::In).unwrap(), vec![0, 1]);
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 2), (1, 2)]);
        assert!(matches!(g.edge(2), Err(Error::InvalidEdge { edge: 2, .. })));
        assert!(matches!(
            g.neighbors(3, Direction::All),
            Err(Error::InvalidVertex { .. })
        ));
    }

    #[test]
    fn self_loops_and_degree() {
        let g = Graph::from_edges(2, false, &[0, 0, 0, 1]).unwrap();
        assert_eq!(g.degree(0, Direction::All, true).unwrap(), 3);
        assert_eq!(g.degree(0, Direction::All, false).unwrap(), 1);
        assert_eq!(g.neighbors(0, Direction::All).unwrap().len(), 3);

        let d = Graph::from_edges(2, true, &[0, 0, 0, 1]).unwrap();
        assert_eq!(d.degree(0, Direction::Out, true).unwrap(), 2);
        assert_eq!(d.degree(0, Direction::Out, false).unwrap(), 1);
        assert_eq!(d.degree(0, Direction::In, true).unwrap(), 1);
        assert_eq!(
            d.degrees(&VertexSelector::All, Direction::All, true).unwrap(),
            vec![3, 1]
        );
    }

    #[test]
    fn edge_lookup() {
        let g = Graph::from_edges(3, true, &[0, 1, 1, 2, 0, 1]).unwrap();
        assert_eq!(g.edge_id(0, 1, true).unwrap(), 0);
        assert_eq!(g.edge_id(2, 1, false).unwrap(), 1);
        assert!(matches!(
            g.edge_id(2, 1, true),
            Err(Error::NotFound { from: 2, to: 1 })
        ));
        assert_eq!(g.edge_ids(&[0, 1, 0, 1, 1, 2], true).unwrap(), vec![0, 2, 1]);
        assert!(g.edge_ids(&[0, 1, 0, 1, 0, 1], true).is_err());

        let u = Graph::from_edges(3, false, &[2, 1]).unwrap();
        assert_eq!(u.edge_id(1, 2, true).unwrap(), 0);
    }

    #[test]
    fn add_zero_vertices_is_noop() {
        let mut g = Graph::from_edges(3, true, &[0, 1, 1, 2]).unwrap();
        let before = (g.out_start.clone(), g.in_start.clone(), g.out_order.clone());
        g.add_vertices(0).unwrap();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!((g.out_start.clone(), g.in_start.clone(), g.out_order.clone()), before);
    }

    #[test]
    fn adding_then_deleting_trailing_vertices_round_trips() {
        let mut g = Graph::from_edges(4, false, &[0, 1, 1, 2, 2, 3, 3, 0]).unwrap();
        let edges: Vec<_> = g.edges().collect();
        g.add_vertices(3).unwrap();
        assert_eq!(g.vertex_count(), 7);
        assert_eq!(g.degree(6, Direction::All, true).unwrap(), 0);
        assert_index(&g);
        g.delete_vertices(&VertexSelector::Ids(vec![4, 5, 6])).unwrap();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edges().collect::<Vec<_>>(), edges);
        assert_index(&g);
    }

    #[test]
    fn delete_vertices_renumbers_and_notifies() {
        let mut g = Graph::with_attributes(4, true, RowStore::default()).unwrap();
        g.add_edges(&[0, 1, 1, 2, 2, 3, 3, 1]).unwrap();
        g.delete_vertices(&VertexSelector::Ids(vec![2, 2])).unwrap();
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (2, 1)]);
        assert_eq!(g.attributes().vertices, vec![0, 1, 3]);
        assert_eq!(g.attributes().edges, vec![(0, 1), (3, 1)]);
        assert_index(&g);
    }

    #[test]
    fn delete_edges_compacts() {
        let mut g = Graph::with_attributes(3, false, RowStore::default()).unwrap();
        g.add_edges(&[0, 1, 1, 2, 2, 0]).unwrap();
        g.delete_edges(&EdgeSelector::Ids(vec![1, 1])).unwrap();
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (0, 2)]);
        assert_eq!(g.attributes().edges, vec![(0, 1), (2, 0)]);
        assert!(g.delete_edges(&EdgeSelector::Single(2)).is_err());
        assert_index(&g);
    }

    #[test]
    fn permute_edges_reorders_ids() {
        let mut g = Graph::with_attributes(3, true, RowStore::default()).unwrap();
        g.add_edges(&[0, 1, 1, 2, 2, 0]).unwrap();
        g.permute_edges(&[2, 0, 1]).unwrap();
        assert_eq!(g.edge(0).unwrap(), (2, 0));
        assert_eq!(g.attributes().edges, vec![(2, 0), (0, 1), (1, 2)]);
        assert!(g.permute_edges(&[0, 0, 1]).is_err());
        assert_index(&g);
    }

    #[test]
    fn try_clone_copies_handler() {
        let mut g = Graph::with_attributes(2, false, RowStore::default()).unwrap();
        g.add_edge(0, 1).unwrap();
        let c = g.try_clone().unwrap();
        assert_eq!(c.attributes().copies, 1);
        assert_eq!(c.edges().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        AddEdges(Vec<(usize, usize)>),
        AddVertices(usize),
        DeleteEdges(Vec<usize>),
        DeleteVertices(Vec<usize>),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::collection::vec((0usize..12, 0usize..12), 0..8).prop_map(Op::AddEdges),
            (0usize..3).prop_map(Op::AddVertices),
            proptest::collection::vec(0usize..20, 0..4).prop_map(Op::DeleteEdges),
            proptest::collection::vec(0usize..12, 0..3).prop_map(Op::DeleteVertices),
        ]
    }

    proptest! {
        #[test]
        fn index_survives_mutation_sequences(
            directed in any::<bool>(),
            ops in proptest::collection::vec(op(), 1..20),
        ) {
            let mut g = Graph::new(6, directed);
            for op in ops {
                let n = g.vertex_count();
                let m = g.edge_count();
                match op {
                    Op::AddEdges(pairs) if n > 0 => {
                        let flat: Vec<usize> = pairs.iter().flat_map(|&(a, b)| [a % n, b % n]).collect();
                        g.add_edges(&flat).unwrap();
                    }
                    Op::AddVertices(k) => g.add_vertices(k).unwrap(),
                    Op::DeleteEdges(ids) if m > 0 => {
                        let ids = ids.into_iter().map(|e| e % m).collect();
                        g.delete_edges(&EdgeSelector::Ids(ids)).unwrap();
                    }
                    Op::DeleteVertices(ids) if n > 0 => {
                        let ids = ids.into_iter().map(|v| v % n).collect();
                        g.delete_vertices(&VertexSelector::Ids(ids)).unwrap();
                    }
                    _ => {}
                }
                assert_index(&g);
                for v in 0..g.vertex_count() {
                    for mode in [Direction::Out, Direction::In, Direction::All] {
                        prop_assert_eq!(
                            g.neighbors(v, mode).unwrap().len(),
                            g.degree(v, mode, true).unwrap()
                        );
                    }
                }
            }
        }
    }
}
