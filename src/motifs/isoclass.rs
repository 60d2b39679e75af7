//! Isomorphism classes of graphs on three or four vertices.
//!
//! A graph on `k` labelled vertices is encoded as a bit set over vertex
//! pairs: ordered pairs `(i, j)`, `i != j`, for directed graphs and
//! unordered pairs `i < j` otherwise, in lexicographic order. The canonical
//! code of a graph is the smallest code over all relabellings, and classes
//! are numbered by ascending canonical code. The empty graph is therefore
//! class 0 and the complete graph is the last class.

use crate::error::{Error, Result};

/// Lookup table from adjacency code to isomorphism class.
#[derive(Debug, Clone)]
pub(crate) struct ClassTable {
    size: usize,
    directed: bool,
    pairs: Vec<(usize, usize)>,
    class_of: Vec<u16>,
    classes: usize,
}

impl ClassTable {
    pub(crate) fn new(size: usize, directed: bool) -> Result<Self> {
        if size != 3 && size != 4 {
            return Err(Error::invalid("size", format!("motifs of size {size} are not supported, use 3 or 4")));
        }
        let pairs: Vec<(usize, usize)> = (0..size)
            .flat_map(|i| (0..size).map(move |j| (i, j)))
            .filter(|&(i, j)| if directed { i != j } else { i < j })
            .collect();
        let perms = permutations(size);

        let codes = 1usize << pairs.len();
        let mut table = Self {
            size,
            directed,
            pairs,
            class_of: Vec::new(),
            classes: 0,
        };
        let canonical: Vec<usize> = (0..codes)
            .map(|code| perms.iter().map(|p| table.relabel(code, p)).min().unwrap_or(code))
            .collect();

        let mut distinct = canonical.clone();
        distinct.sort_unstable();
        distinct.dedup();
        table.classes = distinct.len();
        table.class_of = canonical
            .iter()
            .map(|c| distinct.binary_search(c).unwrap_or(0) as u16)
            .collect();
        Ok(table)
    }

    /// Number of isomorphism classes.
    pub(crate) fn len(&self) -> usize {
        self.classes
    }

    /// Bit for the pair `(i, j)`; undirected pairs may come in either order.
    pub(crate) fn bit(&self, i: usize, j: usize) -> usize {
        let k = self.size;
        if self.directed {
            1 << (i * (k - 1) + if j > i { j - 1 } else { j })
        } else {
            let (a, b) = if i < j { (i, j) } else { (j, i) };
            // pairs (a, *) start after sum_{r<a} (k - 1 - r) entries
            let start = a * (2 * k - a - 1) / 2;
            1 << (start + b - a - 1)
        }
    }

    pub(crate) fn class(&self, code: usize) -> usize {
        self.class_of[code] as usize
    }

    fn relabel(&self, code: usize, perm: &[usize]) -> usize {
        self.pairs
            .iter()
            .enumerate()
            .filter(|&(b, _)| code & (1 << b) != 0)
            .fold(0, |acc, (_, &(i, j))| acc | self.bit(perm[i], perm[j]))
    }
}

/// All permutations of `0..k` in lexicographic order.
fn permutations(k: usize) -> Vec<Vec<usize>> {
    let mut current: Vec<usize> = (0..k).collect();
    let mut out = vec![current.clone()];
    loop {
        let Some(i) = (1..k).rev().find(|&i| current[i - 1] < current[i]) else {
            return out;
        };
        let j = (i..k).rev().find(|&j| current[j] > current[i - 1]).unwrap_or(i);
        current.swap(i - 1, j);
        current[i..].reverse();
        out.push(current.clone());
    }
}

/// Isomorphism class of the graph on `size` vertices with the given edges.
///
/// Edges are `(from, to)` pairs over `0..size`; self loops are ignored and
/// direction is ignored unless `directed`.
///
/// ```rust
/// use modgraph::motifs::isoclass;
///
/// // undirected classes of size 3: empty, one edge, path, triangle
/// assert_eq!(isoclass(3, false, &[(0, 1), (2, 1)]).unwrap(), 2);
/// assert_eq!(isoclass(3, false, &[(0, 1), (1, 2), (2, 0)]).unwrap(), 3);
/// ```
pub fn isoclass(size: usize, directed: bool, edges: &[(usize, usize)]) -> Result<usize> {
    let table = ClassTable::new(size, directed)?;
    let mut code = 0;
    for &(from, to) in edges {
        if from >= size || to >= size {
            return Err(Error::invalid("edges", format!("({from}, {to}) outside 0..{size}")));
        }
        if from != to {
            code |= table.bit(from, to);
        }
    }
    Ok(table.class(code))
}

/// Number of isomorphism classes for motifs of `size` vertices.
pub fn class_count(size: usize, directed: bool) -> Result<usize> {
    ClassTable::new(size, directed).map(|t| t.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn class_counts() {
        assert_eq!(class_count(3, false).unwrap(), 4);
        assert_eq!(class_count(4, false).unwrap(), 11);
        assert_eq!(class_count(3, true).unwrap(), 16);
        assert_eq!(class_count(4, true).unwrap(), 218);
        assert!(class_count(5, false).is_err());
        assert!(class_count(2, true).is_err());
    }

    #[test]
    fn relabelled_graphs_share_a_class() {
        let path = isoclass(4, false, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        assert_eq!(isoclass(4, false, &[(2, 0), (0, 3), (3, 1)]).unwrap(), path);
        let star = isoclass(4, false, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        assert_ne!(star, path);
        assert_eq!(isoclass(4, false, &[(3, 0), (3, 1), (3, 2)]).unwrap(), star);

        let cycle = isoclass(3, true, &[(0, 1), (1, 2), (2, 0)]).unwrap();
        assert_eq!(isoclass(3, true, &[(1, 0), (0, 2), (2, 1)]).unwrap(), cycle);
        let feed_forward = isoclass(3, true, &[(0, 1), (1, 2), (0, 2)]).unwrap();
        assert_ne!(cycle, feed_forward);
    }

    #[test]
    fn extremes_are_first_and_last() {
        assert_eq!(isoclass(4, false, &[]).unwrap(), 0);
        let all: Vec<(usize, usize)> = (0..4).flat_map(|i| (0..4).map(move |j| (i, j))).collect();
        assert_eq!(isoclass(4, true, &all).unwrap(), 217);
        assert_eq!(isoclass(4, false, &all).unwrap(), 10);
        assert!(isoclass(3, false, &[(0, 3)]).is_err());
    }

    #[test]
    fn undirected_bits_cover_every_pair_once() {
        let t = ClassTable::new(4, false).unwrap();
        let mut seen = 0;
        for i in 0..4 {
            for j in (i + 1)..4 {
                let b = t.bit(i, j);
                assert_eq!(b, t.bit(j, i));
                assert_eq!(seen & b, 0);
                seen |= b;
            }
        }
        assert_eq!(seen, (1 << 6) - 1);
    }

    #[test]
    fn permutations_are_complete() {
        let p = permutations(4);
        assert_eq!(p.len(), 24);
        assert_eq!(p[0], vec![0, 1, 2, 3]);
        assert_eq!(p[23], vec![3, 2, 1, 0]);
    }
}
