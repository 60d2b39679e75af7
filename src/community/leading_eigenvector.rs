//! Newman's leading eigenvector method.
//!
//! Starting from one community holding every vertex, each step takes a
//! community and computes the leading eigenvector of its generalized
//! modularity matrix by power iteration. Vertices are split by the sign of
//! their entry; a community whose vector has a single sign is indivisible.
//!
//! For a community `g` with `k_i` the degree of vertex `i`, `k_i^g` the
//! number of its neighbours inside `g`, `d_g` the total degree of `g` and
//! `m` the edge count:
//!
//! ```text
//! B_ij = A_ij - k_i k_j / 2m - delta_ij (k_i^g - k_i d_g / 2m)
//! ```
//!
//! The diagonal of the `k k^T / 2m` term is left out of the operator, so it
//! works on the adjacency structure without forming `B`.
//!
//! Two drivers are provided. [`LeadingEigenvector`] evaluates the modularity
//! matrix against the whole graph. [`LeadingEigenvectorNaive`] cuts the
//! edges between the halves after every split and treats each community as
//! a graph of its own, which is cheaper but optimizes a different quantity.
//!
//! Power iteration converges to the eigenvalue of largest magnitude. When
//! that one is negative the iteration is restarted on `B - lambda I`, which
//! moves the positive end of the spectrum to the top.

use rand::prelude::*;

use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use crate::graph::adjacency::{AdjacencyList, LazyAdjacencyList};
use crate::graph::{AttributeHandler, Direction, Graph};
use crate::hierarchy::Dendrogram;
use crate::interrupt::{poll, Interrupt};

/// Restarts allowed after a negative leading eigenvalue.
const MAX_SHIFTS: usize = 3;

/// Leading eigenvector community detection.
#[derive(Debug, Clone)]
pub struct LeadingEigenvector {
    /// Maximum number of split attempts; capped at `n - 1`.
    steps: usize,
    /// Random seed for the power iteration start vectors.
    seed: Option<u64>,
    interrupt: Option<Interrupt>,
}

/// Leading eigenvector detection on communities cut out of the graph.
#[derive(Debug, Clone)]
pub struct LeadingEigenvectorNaive {
    steps: usize,
    seed: Option<u64>,
    interrupt: Option<Interrupt>,
}

/// Output of a leading eigenvector run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeadingEigenvectorResult {
    /// Community of each vertex.
    pub membership: Vec<usize>,
    /// How the final communities re-join when the splits are undone,
    /// last split first. Leaves are the final community ids.
    pub merges: Dendrogram,
    /// Number of successful splits.
    pub splits: usize,
}

/// Output of [`leading_eigenvector_step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Whether the community was divided.
    pub split: bool,
    /// Unit eigenvector over the community's vertices, in vertex id order.
    /// Its first non-zero entry is positive.
    pub eigenvector: Vec<f64>,
    /// Estimated leading eigenvalue.
    pub eigenvalue: f64,
}

impl LeadingEigenvector {
    /// Split until no community is divisible.
    pub fn new() -> Self {
        Self {
            steps: usize::MAX,
            seed: None,
            interrupt: None,
        }
    }

    /// Limit the number of split attempts.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check `interrupt` before each split attempt and power iteration step.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Run with a generator seeded from `with_seed`, or the thread generator.
    pub fn run<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<LeadingEigenvectorResult> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.run_with_rng(graph, &mut rng)
    }
}

impl Default for LeadingEigenvector {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for LeadingEigenvector {
    fn detect<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<Vec<usize>> {
        self.run(graph).map(|r| r.membership)
    }
}

impl LeadingEigenvectorNaive {
    /// Split until no community is divisible.
    pub fn new() -> Self {
        Self {
            steps: usize::MAX,
            seed: None,
            interrupt: None,
        }
    }

    /// Limit the number of split attempts.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check `interrupt` before each split attempt and power iteration step.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Run with a generator seeded from `with_seed`, or the thread generator.
    pub fn run<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<LeadingEigenvectorResult> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.run_with_rng(graph, &mut rng)
    }
}

impl Default for LeadingEigenvectorNaive {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for LeadingEigenvectorNaive {
    fn detect<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<Vec<usize>> {
        self.run(graph).map(|r| r.membership)
    }
}

impl LeadingEigenvector {
    /// Run with a caller-supplied generator.
    pub fn run_with_rng<A, R>(&self, graph: &Graph<A>, rng: &mut R) -> Result<LeadingEigenvectorResult>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        let n = graph.vertex_count();
        let m = graph.edge_count() as f64;
        warn_directed(graph);

        let adj = AdjacencyList::new(graph, Direction::All)?;
        let mut membership = vec![0usize; n];
        let mut tracker = SplitTracker::new(n, self.steps);
        let mut local = vec![0usize; n];

        while let Some(comm) = tracker.next_community() {
            poll(self.interrupt.as_ref())?;

            let idx = members(&membership, comm);
            if idx.len() == 1 {
                continue;
            }
            for (j, &v) in idx.iter().enumerate() {
                local[v] = j;
            }
            let comm_degree: usize = idx.iter().map(|&v| adj.neighbors(v).len()).sum();
            if comm_degree == 0 {
                log::trace!("community {comm} has no edges");
                continue;
            }

            let leading = power_iteration(idx.len(), tracker.niter, rng, self.interrupt.as_ref(), |x, y| {
                modularity_product(&adj, &membership, &local, comm, &idx, comm_degree as f64, m, x, y);
            })?;

            tracker.split(&mut membership, comm, &idx, &leading.vector);
        }

        tracker.finish(membership)
    }

    /// Try to split one community of an existing partition.
    ///
    /// `membership` is rewritten in place when the split succeeds; the
    /// vertices on the non-positive side move to a new community whose id
    /// is one past the current maximum.
    pub fn step<A, R>(
        &self,
        graph: &Graph<A>,
        membership: &mut [usize],
        community: usize,
        rng: &mut R,
    ) -> Result<StepOutcome>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        let n = graph.vertex_count();
        if membership.len() != n {
            return Err(Error::invalid(
                "membership",
                format!("length {} does not match vertex count {n}", membership.len()),
            ));
        }
        let idx = members(membership, community);
        if idx.is_empty() {
            return Err(Error::invalid("community", format!("community {community} has no vertices")));
        }
        warn_directed(graph);

        let communities = membership.iter().max().map_or(0, |&c| c + 1);
        let m = graph.edge_count() as f64;

        let mut lazy = LazyAdjacencyList::new(graph, Direction::All, false);
        let mut neighbors = Vec::with_capacity(idx.len());
        for &v in &idx {
            neighbors.push(lazy.neighbors(v)?.to_vec());
        }
        let comm_degree: usize = neighbors.iter().map(Vec::len).sum();
        if comm_degree == 0 {
            return Ok(StepOutcome {
                split: false,
                eigenvector: vec![0.0; idx.len()],
                eigenvalue: 0.0,
            });
        }

        let mut local = vec![usize::MAX; n];
        for (j, &v) in idx.iter().enumerate() {
            local[v] = j;
        }
        let niter = n.max(1000);
        let leading = power_iteration(idx.len(), niter, rng, self.interrupt.as_ref(), |x, y| {
            for (j, neis) in neighbors.iter().enumerate() {
                let mut kig = 0.0;
                let mut sum = 0.0;
                for &nei in neis {
                    if local[nei] != usize::MAX {
                        kig += 1.0;
                        sum += x[local[nei]];
                    }
                }
                y[j] = sum - kig * x[j];
            }
            correct_degree_terms(neighbors.iter().map(Vec::len), comm_degree as f64, m, x, y);
        })?;

        let below = leading.vector.iter().filter(|&&x| x <= 0.0).count();
        let split = below > 0 && below < idx.len();
        if split {
            for (j, &v) in idx.iter().enumerate() {
                if leading.vector[j] <= 0.0 {
                    membership[v] = communities;
                }
            }
            log::debug!("split community {community}: {} / {below} vertices", idx.len() - below);
        }

        Ok(StepOutcome {
            split,
            eigenvector: leading.vector,
            eigenvalue: leading.eigenvalue,
        })
    }
}

/// Split one community of `membership` with a default detector.
pub fn leading_eigenvector_step<A, R>(
    graph: &Graph<A>,
    membership: &mut [usize],
    community: usize,
    rng: &mut R,
) -> Result<StepOutcome>
where
    A: AttributeHandler,
    R: Rng + ?Sized,
{
    LeadingEigenvector::new().step(graph, membership, community, rng)
}

impl LeadingEigenvectorNaive {
    /// Run with a caller-supplied generator.
    pub fn run_with_rng<A, R>(&self, graph: &Graph<A>, rng: &mut R) -> Result<LeadingEigenvectorResult>
    where
        A: AttributeHandler,
        R: Rng + ?Sized,
    {
        let n = graph.vertex_count();
        warn_directed(graph);

        // neighbour lists hold positions within the owning community
        let mut adj = AdjacencyList::new(graph, Direction::All)?;
        let mut membership = vec![0usize; n];
        let mut tracker = SplitTracker::new(n, self.steps);
        let mut renumber = vec![0usize; n];

        while let Some(comm) = tracker.next_community() {
            poll(self.interrupt.as_ref())?;

            let idx = members(&membership, comm);
            if idx.len() == 1 {
                continue;
            }
            let sumdeg: usize = idx.iter().map(|&v| adj.neighbors(v).len()).sum();
            if sumdeg == 0 {
                log::trace!("community {comm} has no internal edges");
                continue;
            }

            let leading = power_iteration(idx.len(), tracker.niter, rng, self.interrupt.as_ref(), |x, y| {
                let sumdeg = sumdeg as f64;
                let mut ktx = 0.0;
                for (j, &v) in idx.iter().enumerate() {
                    let neis = adj.neighbors(v);
                    y[j] = neis.iter().map(|&nei| x[nei]).sum();
                    ktx += x[j] * neis.len() as f64;
                }
                ktx /= sumdeg;
                for (j, &v) in idx.iter().enumerate() {
                    let deg = adj.neighbors(v).len() as f64;
                    y[j] = y[j] - ktx * deg + deg * deg * x[j] / sumdeg;
                }
            })?;

            let x = &leading.vector;
            let (mut below, mut above) = (0, 0);
            for (j, &xj) in x.iter().enumerate() {
                if xj <= 0.0 {
                    renumber[j] = below;
                    below += 1;
                } else {
                    renumber[j] = above;
                    above += 1;
                }
            }
            if below == 0 || above == 0 {
                continue;
            }

            // drop edges across the cut, renumber the rest
            for (j, &v) in idx.iter().enumerate() {
                let side = x[j] <= 0.0;
                let list = adj.neighbors_mut(v);
                let mut k = 0;
                while k < list.len() {
                    let nei = list[k];
                    if (x[nei] <= 0.0) == side {
                        list[k] = renumber[nei];
                        k += 1;
                    } else {
                        list.swap_remove(k);
                    }
                }
            }

            tracker.split(&mut membership, comm, &idx, x);
        }

        tracker.finish(membership)
    }
}

fn warn_directed<A: AttributeHandler>(graph: &Graph<A>) {
    if graph.is_directed() {
        log::warn!("leading eigenvector detection ignores edge directions");
    }
}

fn members(membership: &[usize], comm: usize) -> Vec<usize> {
    membership
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == comm)
        .map(|(v, _)| v)
        .collect()
}

/// Split queue, step budget and split history shared by both drivers.
struct SplitTracker {
    queue: Vec<usize>,
    steps: usize,
    taken: usize,
    niter: usize,
    communities: usize,
    history: Vec<(usize, usize)>,
}

impl SplitTracker {
    fn new(n: usize, steps: usize) -> Self {
        Self {
            queue: vec![0],
            steps: steps.min(n.saturating_sub(1)),
            taken: 0,
            niter: n.max(1000),
            communities: 1,
            history: Vec::new(),
        }
    }

    /// Next community to try, depth first.
    fn next_community(&mut self) -> Option<usize> {
        if self.taken >= self.steps {
            return None;
        }
        let comm = self.queue.pop()?;
        self.taken += 1;
        Some(comm)
    }

    /// Apply the sign split of `x` to `comm`, if both sides are non-empty.
    fn split(&mut self, membership: &mut [usize], comm: usize, idx: &[usize], x: &[f64]) {
        let below = x.iter().filter(|&&v| v <= 0.0).count();
        if below == 0 || below == idx.len() {
            return;
        }
        let new = self.communities;
        self.communities += 1;
        for (j, &v) in idx.iter().enumerate() {
            if x[j] <= 0.0 {
                membership[v] = new;
            }
        }
        self.history.push((comm, new));
        log::trace!("split community {comm}: {} / {below} vertices", idx.len() - below);

        if below > 1 {
            self.queue.push(new);
        }
        if idx.len() - below > 1 {
            self.queue.push(comm);
        }
    }

    /// Replay the splits backwards as merges of the final communities.
    fn finish(self, membership: Vec<usize>) -> Result<LeadingEigenvectorResult> {
        let k = self.communities;
        let mut merged_as = vec![0usize; k];
        let mut dendrogram = Dendrogram::new(k);
        for &(to, from) in self.history.iter().rev() {
            let a = merged_as[to].checked_sub(1).unwrap_or(to);
            let b = merged_as[from].checked_sub(1).unwrap_or(from);
            let id = dendrogram.push(a, b)?;
            merged_as[to] = id + 1;
        }
        log::debug!("leading eigenvector: {} communities after {} attempts", k, self.taken);
        Ok(LeadingEigenvectorResult {
            membership,
            merges: dendrogram,
            splits: self.history.len(),
        })
    }
}

/// `y = B x` on community `comm`, without the shift.
#[allow(clippy::too_many_arguments)]
fn modularity_product(
    adj: &AdjacencyList,
    membership: &[usize],
    local: &[usize],
    comm: usize,
    idx: &[usize],
    comm_degree: f64,
    m: f64,
    x: &[f64],
    y: &mut [f64],
) {
    for (j, &v) in idx.iter().enumerate() {
        let mut kig = 0.0;
        let mut sum = 0.0;
        for &nei in adj.neighbors(v) {
            if membership[nei] == comm {
                kig += 1.0;
                sum += x[local[nei]];
            }
        }
        y[j] = sum - kig * x[j];
    }
    correct_degree_terms(idx.iter().map(|&v| adj.neighbors(v).len()), comm_degree, m, x, y);
}

/// Add the degree-dependent part of the generalized modularity matrix.
fn correct_degree_terms(degrees: impl Iterator<Item = usize> + Clone, comm_degree: f64, m: f64, x: &[f64], y: &mut [f64]) {
    let mut ktx = 0.0;
    for (j, deg) in degrees.clone().enumerate() {
        let deg = deg as f64;
        y[j] += deg * comm_degree / m * x[j] / 2.0;
        ktx += x[j] * deg;
    }
    ktx = ktx / m / 2.0;
    for (j, deg) in degrees.enumerate() {
        let deg = deg as f64;
        y[j] = y[j] - ktx * deg + deg * deg * x[j] / m / 2.0;
    }
}

struct Leading {
    vector: Vec<f64>,
    eigenvalue: f64,
}

/// Shifted power iteration for the leading eigenpair of `apply`.
///
/// The returned vector has unit length and a positive first non-zero entry.
fn power_iteration<R, F>(
    size: usize,
    niter: usize,
    rng: &mut R,
    interrupt: Option<&Interrupt>,
    mut apply: F,
) -> Result<Leading>
where
    R: Rng + ?Sized,
    F: FnMut(&[f64], &mut [f64]),
{
    let mut x = vec![0.0; size];
    let mut y = vec![0.0; size];
    let mut shift = 0.0;
    let mut ratio = 0.0;

    for pass in 0..MAX_SHIFTS {
        x.iter_mut().for_each(|v| *v = rng.random::<f64>());
        normalize(&mut x)?;

        let (mut before, mut after) = (0.0, 0.0);
        for i in 0..niter {
            poll(interrupt)?;
            apply(&x, &mut y);
            for (yj, &xj) in y.iter_mut().zip(&x) {
                *yj -= shift * xj;
            }
            if i + 1 == niter {
                let Some(b) = x.iter().position(|&v| v != 0.0) else {
                    return Err(Error::Diverged {
                        context: "leading eigenvector iterate is zero",
                    });
                };
                before = x[b];
                after = y[b];
            }
            std::mem::swap(&mut x, &mut y);
            normalize(&mut x)?;
        }

        ratio = after / before;
        if ratio >= 0.0 || ratio.is_nan() {
            break;
        }
        if pass + 1 == MAX_SHIFTS {
            log::debug!("leading eigenvalue {} still negative after {MAX_SHIFTS} shifts", ratio + shift);
            break;
        }
        log::trace!("negative leading eigenvalue {}, shifting (pass {pass})", ratio + shift);
        shift += ratio;
    }

    if let Some(&first) = x.iter().find(|&&v| v != 0.0) {
        if first < 0.0 {
            x.iter_mut().for_each(|v| *v = -*v);
        }
    }

    Ok(Leading {
        vector: x,
        eigenvalue: ratio + shift,
    })
}

fn normalize(x: &mut [f64]) -> Result<()> {
    let sumsq: f64 = x.iter().map(|v| v * v).sum();
    if sumsq == 0.0 || !sumsq.is_finite() {
        return Err(Error::Diverged {
            context: "leading eigenvector iterate is zero",
        });
    }
    let norm = sumsq.sqrt();
    x.iter_mut().for_each(|v| *v /= norm);
    Ok(())
}
