//! Motif census by RAND-ESU subgraph enumeration.
//!
//! A motif is a small connected induced subgraph. The census counts every
//! connected induced subgraph of 3 or 4 vertices and bins it by
//! isomorphism class, see [`isoclass`].
//!
//! ## ESU
//!
//! Enumeration grows subgraphs from a root vertex `v`. The extension set
//! holds candidates that may join the current subgraph: at first the
//! neighbours of `v` with a larger id, later also the *exclusive*
//! neighbours of each new member, i.e. vertices not yet in the subgraph or
//! adjacent to it. Every connected subgraph is found exactly once, from
//! its smallest vertex.
//!
//! ## Sampling
//!
//! RAND-ESU (Wernicke 2006) prunes the search tree: a child at depth `d`
//! (the subgraph would grow to `d + 1` vertices) is skipped with
//! probability `cut_prob[d]`. All zeros gives the full census. Neighbourhoods
//! are always taken undirected; on directed graphs edge directions only
//! matter for the class.
//!
//! ## Usage
//!
//! ```rust
//! use modgraph::graph::Graph;
//! use modgraph::motifs::Motifs;
//!
//! // a triangle with a pendant vertex
//! let g = Graph::from_edges(4, false, &[0, 1, 1, 2, 2, 0, 2, 3]).unwrap();
//! let hist = Motifs::new(3).census(&g).unwrap();
//! // classes: empty, one edge, path, triangle
//! assert_eq!(hist, vec![0.0, 0.0, 2.0, 1.0]);
//! ```
//!
//! ## References
//!
//! - Wernicke (2006). "Efficient detection of network motifs."
//!   IEEE/ACM TCBB 3(4), 347-359.
//! - Wernicke & Rasche (2006). "FANMOD: a tool for fast network motif
//!   detection." Bioinformatics 22(9), 1152-1153.

mod isoclass;

pub use isoclass::{class_count, isoclass};

use rand::prelude::*;

use crate::error::{Error, Result};
use crate::graph::adjacency::AdjacencyList;
use crate::graph::{AttributeHandler, Direction, Graph};
use crate::interrupt::{poll, Interrupt};
use isoclass::ClassTable;

/// Roots used by [`Motifs::estimate`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sample {
    /// This many distinct vertices drawn uniformly.
    Random(usize),
    /// These vertices.
    Vertices(Vec<usize>),
}

/// Motif census configuration.
#[derive(Debug, Clone)]
pub struct Motifs {
    /// Motif size, 3 or 4.
    size: usize,
    /// Per-depth pruning probabilities; zeros when unset.
    cut_prob: Option<Vec<f64>>,
    /// Random seed.
    seed: Option<u64>,
    interrupt: Option<Interrupt>,
}

impl Motifs {
    /// Full census of motifs with `size` vertices.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cut_prob: None,
            seed: None,
            interrupt: None,
        }
    }

    /// Prune the search tree; one probability per depth, `size` in total.
    pub fn with_cut_prob(mut self, cut_prob: Vec<f64>) -> Self {
        self.cut_prob = Some(cut_prob);
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check `interrupt` once per root vertex.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Number of motifs found in each isomorphism class.
    ///
    /// Classes of disconnected graphs are always 0.
    pub fn census<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<Vec<f64>> {
        self.census_with_rng(graph, &mut self.rng())
    }

    /// [`Motifs::census`] with a caller-supplied generator.
    pub fn census_with_rng<A, R>(&self, graph: &Graph<A>, rng: &mut R) -> Result<Vec<f64>>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        let table = ClassTable::new(self.size, graph.is_directed())?;
        let out = AdjacencyList::new(graph, Direction::Out)?;
        let mut hist = vec![0.0; table.len()];

        let mut esu = Esu::new(graph, self.size, self.cut_probabilities()?)?;
        for root in 0..graph.vertex_count() {
            poll(self.interrupt.as_ref())?;
            esu.grow(root, true, rng, &mut |sub| {
                hist[table.class(motif_code(&table, &out, sub))] += 1.0;
            });
        }
        log::debug!(
            "motif census: size {}, {} subgraphs",
            self.size,
            hist.iter().sum::<f64>()
        );
        Ok(hist)
    }

    /// Total number of motifs, without classifying them.
    pub fn count<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<u64> {
        self.count_with_rng(graph, &mut self.rng())
    }

    /// [`Motifs::count`] with a caller-supplied generator.
    pub fn count_with_rng<A, R>(&self, graph: &Graph<A>, rng: &mut R) -> Result<u64>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        ClassTable::new(self.size, graph.is_directed())?;
        let mut esu = Esu::new(graph, self.size, self.cut_probabilities()?)?;
        let mut total = 0u64;
        for root in 0..graph.vertex_count() {
            poll(self.interrupt.as_ref())?;
            esu.grow(root, true, rng, &mut |_| total += 1);
        }
        Ok(total)
    }

    /// Estimate the total number of motifs from a vertex sample.
    ///
    /// Counts every motif through each sampled vertex, then scales by
    /// `n / |sample|` and divides by the motif size, since each motif is
    /// seen once from each of its vertices.
    pub fn estimate<A: AttributeHandler>(&self, graph: &Graph<A>, sample: &Sample) -> Result<f64> {
        self.estimate_with_rng(graph, sample, &mut self.rng())
    }

    /// [`Motifs::estimate`] with a caller-supplied generator.
    pub fn estimate_with_rng<A, R>(&self, graph: &Graph<A>, sample: &Sample, rng: &mut R) -> Result<f64>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        ClassTable::new(self.size, graph.is_directed())?;
        let n = graph.vertex_count();
        let roots = match sample {
            Sample::Random(k) => {
                if *k > n {
                    return Err(Error::invalid("sample", format!("{k} vertices from a graph of {n}")));
                }
                rand::seq::index::sample(rng, n, *k).into_vec()
            }
            Sample::Vertices(ids) => {
                for &v in ids {
                    graph.check_vertex(v)?;
                }
                ids.clone()
            }
        };
        if roots.is_empty() {
            return Err(Error::invalid("sample", "sample is empty"));
        }

        let mut esu = Esu::new(graph, self.size, self.cut_probabilities()?)?;
        let mut found = 0u64;
        for &root in &roots {
            poll(self.interrupt.as_ref())?;
            esu.grow(root, false, rng, &mut |_| found += 1);
        }
        Ok(found as f64 * n as f64 / roots.len() as f64 / self.size as f64)
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        }
    }

    fn cut_probabilities(&self) -> Result<Vec<f64>> {
        match &self.cut_prob {
            None => Ok(vec![0.0; self.size]),
            Some(p) if p.len() != self.size => Err(Error::invalid(
                "cut_prob",
                format!("{} probabilities for motifs of size {}", p.len(), self.size),
            )),
            Some(p) if p.iter().any(|x| !(0.0..=1.0).contains(x)) => {
                Err(Error::invalid("cut_prob", "probabilities must lie in [0, 1]"))
            }
            Some(p) => Ok(p.clone()),
        }
    }
}

/// Adjacency code of the subgraph induced by `sub`, in `sub` order.
fn motif_code(table: &ClassTable, out: &AdjacencyList, sub: &[usize]) -> usize {
    let mut code = 0;
    for (i, &v) in sub.iter().enumerate() {
        for &u in out.neighbors(v) {
            if let Some(j) = sub.iter().position(|&w| w == u) {
                if j != i {
                    code |= table.bit(i, j);
                }
            }
        }
    }
    code
}

/// ESU enumeration state, reused across roots.
struct Esu {
    adj: AdjacencyList,
    size: usize,
    cut_prob: Vec<f64>,
    /// How many subgraph members each vertex is, or is adjacent to.
    covered: Vec<usize>,
    sub: Vec<usize>,
}

impl Esu {
    fn new<A: AttributeHandler>(graph: &Graph<A>, size: usize, cut_prob: Vec<f64>) -> Result<Self> {
        Ok(Self {
            adj: AdjacencyList::new(graph, Direction::All)?,
            size,
            cut_prob,
            covered: vec![0; graph.vertex_count()],
            sub: Vec::with_capacity(size),
        })
    }

    fn keep<R: Rng + ?Sized>(&self, depth: usize, rng: &mut R) -> bool {
        let p = self.cut_prob[depth];
        p == 0.0 || rng.random::<f64>() >= p
    }

    /// Enumerate motifs containing `root`; with `smallest`, only those
    /// whose other members have larger ids.
    fn grow<R, F>(&mut self, root: usize, smallest: bool, rng: &mut R, visit: &mut F)
    where
        R: Rng + ?Sized,
        F: FnMut(&[usize]),
    {
        if !self.keep(0, rng) {
            return;
        }
        let mut ext: Vec<usize> = self
            .adj
            .neighbors(root)
            .iter()
            .copied()
            .filter(|&u| u != root && (!smallest || u > root))
            .collect();
        ext.sort_unstable();
        ext.dedup();

        self.enter(root);
        self.extend(ext, root, smallest, rng, visit);
        self.leave(root);
    }

    fn extend<R, F>(&mut self, mut ext: Vec<usize>, root: usize, smallest: bool, rng: &mut R, visit: &mut F)
    where
        R: Rng + ?Sized,
        F: FnMut(&[usize]),
    {
        let depth = self.sub.len();
        while let Some(w) = ext.pop() {
            if !self.keep(depth, rng) {
                continue;
            }
            if depth + 1 == self.size {
                self.sub.push(w);
                visit(&self.sub);
                self.sub.pop();
                continue;
            }

            let mut fresh: Vec<usize> = self
                .adj
                .neighbors(w)
                .iter()
                .copied()
                .filter(|&u| self.covered[u] == 0 && (!smallest || u > root))
                .collect();
            fresh.sort_unstable();
            fresh.dedup();
            let mut next = ext.clone();
            next.extend(fresh);

            self.enter(w);
            self.extend(next, root, smallest, rng, visit);
            self.leave(w);
        }
    }

    fn enter(&mut self, v: usize) {
        self.sub.push(v);
        self.covered[v] += 1;
        for &u in self.adj.neighbors(v) {
            self.covered[u] += 1;
        }
    }

    fn leave(&mut self, v: usize) {
        self.sub.pop();
        self.covered[v] -= 1;
        for &u in self.adj.neighbors(v) {
            self.covered[u] -= 1;
        }
    }
}
