//! Girvan-Newman divisive clustering by edge betweenness.
//!
//! Repeatedly removes the edge carrying the most shortest paths. Removing
//! edges eventually disconnects the graph; replaying the removals backwards
//! gives a merge dendrogram over the vertices.

use std::collections::VecDeque;

use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use crate::graph::adjacency::IncidenceList;
use crate::graph::{AttributeHandler, Direction, Graph};
use crate::hierarchy::Dendrogram;
use crate::interrupt::{poll, Interrupt};
use crate::metrics::modularity;

/// Edge betweenness community detection.
#[derive(Debug, Clone)]
pub struct EdgeBetweenness {
    /// Follow edge directions on directed graphs.
    directed: bool,
    /// Build the merge dendrogram.
    merges: bool,
    interrupt: Option<Interrupt>,
}

/// Output of [`EdgeBetweenness::run`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeBetweennessResult {
    /// Edge ids in removal order; a permutation of all edges.
    pub removed: Vec<usize>,
    /// Betweenness of each removed edge at the moment it was removed.
    pub betweenness: Vec<f64>,
    /// Merge dendrogram over the vertices, if requested.
    pub merges: Option<Dendrogram>,
    /// For each merge row, the index into `removed` of the edge that caused it.
    pub bridges: Option<Vec<usize>>,
}

impl EdgeBetweenness {
    /// Directed paths, merges on.
    pub fn new() -> Self {
        Self {
            directed: true,
            merges: true,
            interrupt: None,
        }
    }

    /// Whether shortest paths follow edge directions. Ignored on undirected graphs.
    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Whether to build the merge dendrogram.
    pub fn with_merges(mut self, merges: bool) -> Self {
        self.merges = merges;
        self
    }

    /// Check `interrupt` once per BFS source.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Remove every edge in order of decreasing betweenness.
    pub fn run<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<EdgeBetweennessResult> {
        let n = graph.vertex_count();
        let m = graph.edge_count();
        let directed = self.directed && graph.is_directed();
        let interrupt = self.interrupt.as_ref();

        log::debug!("edge betweenness: n={n}, m={m}, directed={directed}");

        let mut removed = Vec::with_capacity(m);
        let mut betweenness = Vec::with_capacity(m);

        // lists[0] is walked forward by the BFS, lists[back] backwards
        let mut lists = if directed {
            vec![
                IncidenceList::new(graph, Direction::Out)?,
                IncidenceList::new(graph, Direction::In)?,
            ]
        } else {
            vec![IncidenceList::new(graph, Direction::All)?]
        };
        let back = lists.len() - 1;

        let mut distance = vec![0usize; n];
        let mut nrgeo = vec![0.0f64; n];
        let mut tmpscore = vec![0.0f64; n];
        let mut eb = vec![0.0f64; m];
        let mut passive = vec![false; m];
        let mut queue = VecDeque::new();
        let mut stack = Vec::with_capacity(n);

        for _ in 0..m {
            eb.iter_mut().for_each(|x| *x = 0.0);

            for source in 0..n {
                poll(interrupt)?;

                distance.iter_mut().for_each(|x| *x = 0);
                nrgeo.iter_mut().for_each(|x| *x = 0.0);
                tmpscore.iter_mut().for_each(|x| *x = 0.0);
                stack.clear();

                nrgeo[source] = 1.0;
                queue.push_back(source);
                while let Some(act) = queue.pop_front() {
                    stack.push(act);
                    for &edge in lists[0].edges(act) {
                        let nei = other_end(graph, edge, act);
                        if nrgeo[nei] != 0.0 {
                            // already seen; count it only if it is one level down
                            if distance[nei] == distance[act] + 1 {
                                nrgeo[nei] += nrgeo[act];
                            }
                        } else {
                            nrgeo[nei] = nrgeo[act];
                            distance[nei] = distance[act] + 1;
                            queue.push_back(nei);
                        }
                    }
                }

                // accumulate dependencies, farthest vertices first
                while let Some(act) = stack.pop() {
                    for &edge in lists[back].edges(act) {
                        let nei = other_end(graph, edge, act);
                        if nrgeo[nei] != 0.0 && distance[nei] + 1 == distance[act] {
                            let share = (tmpscore[act] + 1.0) * nrgeo[nei] / nrgeo[act];
                            tmpscore[nei] += share;
                            eb[edge] += share;
                        }
                    }
                }
            }

            let Some(maxedge) = (0..m)
                .filter(|&e| !passive[e])
                .fold(None, |best: Option<usize>, e| match best {
                    Some(b) if eb[b] >= eb[e] => Some(b),
                    _ => Some(e),
                })
            else {
                break;
            };

            let score = if directed { eb[maxedge] } else { eb[maxedge] / 2.0 };
            log::trace!("removing edge {maxedge} with betweenness {score}");
            removed.push(maxedge);
            betweenness.push(score);
            passive[maxedge] = true;

            let (from, to) = graph.raw_edge(maxedge);
            lists[back].remove_edge(to, maxedge);
            lists[0].remove_edge(from, maxedge);
        }

        let (merges, bridges) = if self.merges {
            let (d, b) = edge_betweenness_merges(graph, &removed)?;
            (Some(d), Some(b))
        } else {
            (None, None)
        };

        Ok(EdgeBetweennessResult {
            removed,
            betweenness,
            merges,
            bridges,
        })
    }
}

impl Default for EdgeBetweenness {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for EdgeBetweenness {
    /// Cut the dendrogram where modularity peaks; the finest such cut wins ties.
    fn detect<A: AttributeHandler>(&self, graph: &Graph<A>) -> Result<Vec<usize>> {
        let result = self.clone().with_merges(true).run(graph)?;
        let dendrogram = result
            .merges
            .ok_or_else(|| Error::invalid("merges", "dendrogram was not built"))?;

        let mut best: Option<(f64, Vec<usize>)> = None;
        for steps in 0..=dendrogram.len() {
            let (membership, _) = dendrogram.to_membership(steps)?;
            let q = modularity(graph, &membership)?;
            if best.as_ref().map_or(true, |(bq, _)| q > *bq) {
                best = Some((q, membership));
            }
        }
        Ok(best.map(|(_, m)| m).unwrap_or_default())
    }
}

fn other_end<A: AttributeHandler>(graph: &Graph<A>, edge: usize, v: usize) -> usize {
    let (from, to) = graph.raw_edge(edge);
    if from == v {
        to
    } else {
        from
    }
}

/// Merge dendrogram from an edge removal order.
///
/// Walks `removed` backwards, adding each edge back; every edge that joins
/// two different components becomes a merge row. Returns the dendrogram
/// over the graph's vertices and, for each row, the index into `removed`
/// of the edge that produced it.
pub fn edge_betweenness_merges<A: AttributeHandler>(
    graph: &Graph<A>,
    removed: &[usize],
) -> Result<(Dendrogram, Vec<usize>)> {
    let n = graph.vertex_count();
    let m = graph.edge_count();
    if let Some(&edge) = removed.iter().find(|&&e| e >= m) {
        return Err(Error::InvalidEdge { edge, edge_count: m });
    }

    let mut dendrogram = Dendrogram::new(n);
    let mut bridges = Vec::new();
    if n == 0 {
        return Ok((dendrogram, bridges));
    }

    // ptr[c] == 0: c is a root; otherwise the 1-based parent component
    let mut ptr = vec![0usize; 2 * n - 1];
    let root = |ptr: &[usize], mut c: usize| {
        while ptr[c] != 0 {
            c = ptr[c] - 1;
        }
        c
    };

    for (i, &edge) in removed.iter().enumerate().rev() {
        let (from, to) = graph.edge(edge)?;
        let c1 = root(&ptr, from);
        let c2 = root(&ptr, to);
        if c1 == c2 {
            continue;
        }
        let id = dendrogram.push(c1, c2)?;
        bridges.push(i);
        for c in [c1, c2, from, to] {
            ptr[c] = id + 1;
        }
    }

    Ok((dendrogram, bridges))
}
