//! Merge dendrogram and conversion to flat memberships.

use crate::error::{Error, Result};

/// Binary merge history over `leaves` initial components.
///
/// Row `i` joins two components into a new one with id `leaves + i`. Ids
/// below `leaves` are the leaves themselves. A valid dendrogram consumes
/// every id at most once and only refers to rows that come earlier, so it
/// has at most `leaves - 1` rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dendrogram {
    leaves: usize,
    merges: Vec<[usize; 2]>,
}

impl Dendrogram {
    /// A dendrogram with no merges yet.
    pub fn new(leaves: usize) -> Self {
        Self {
            leaves,
            merges: Vec::new(),
        }
    }

    /// Build from explicit rows, rejecting invalid histories.
    pub fn from_merges(leaves: usize, merges: Vec<[usize; 2]>) -> Result<Self> {
        let d = Self { leaves, merges };
        d.validate()?;
        Ok(d)
    }

    /// Append a merge of `a` and `b`; returns the id of the new component.
    pub fn push(&mut self, a: usize, b: usize) -> Result<usize> {
        let next = self.leaves + self.merges.len();
        if a >= next || b >= next {
            return Err(Error::invalid(
                "merges",
                format!("row ({a}, {b}) refers to a component that does not exist yet"),
            ));
        }
        if a == b {
            return Err(Error::invalid("merges", format!("component {a} merged with itself")));
        }
        if self.merges.iter().flatten().any(|&c| c == a || c == b) {
            return Err(Error::invalid("merges", format!("row ({a}, {b}) reuses a consumed component")));
        }
        self.merges.push([a, b]);
        Ok(next)
    }

    /// Number of leaves.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Number of merge rows.
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Whether no merges were recorded.
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Merge rows in order.
    pub fn merges(&self) -> &[[usize; 2]] {
        &self.merges
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.merges.len() > self.leaves.saturating_sub(1) {
            return Err(Error::invalid(
                "merges",
                format!("{} rows for {} leaves", self.merges.len(), self.leaves),
            ));
        }
        let mut used = vec![false; self.leaves + self.merges.len()];
        for (i, &[a, b]) in self.merges.iter().enumerate() {
            let limit = self.leaves + i;
            for c in [a, b] {
                if c >= limit {
                    return Err(Error::invalid(
                        "merges",
                        format!("row {i} refers to component {c}, which is not created before it"),
                    ));
                }
                if used[c] {
                    return Err(Error::invalid("merges", format!("component {c} is merged twice")));
                }
                used[c] = true;
            }
        }
        Ok(())
    }

    /// Membership after applying the first `steps` merges.
    ///
    /// Returns `(membership, sizes)` with `leaves - steps` components.
    /// Components created by merges are numbered first, in reverse order of
    /// the merge that created them; untouched leaves follow in id order.
    pub fn to_membership(&self, steps: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        if steps > self.merges.len() {
            return Err(Error::invalid(
                "steps",
                format!("{steps} steps but only {} merges", self.merges.len()),
            ));
        }
        let n = self.leaves;
        // 1-based component ids; 0 means "not reached yet"
        let mut assigned = vec![0usize; n];
        let mut tmp = vec![0usize; steps];
        let mut sizes = vec![0usize; n - steps];
        let mut found = 0;

        for i in (0..steps).rev() {
            if tmp[i] == 0 {
                found += 1;
                tmp[i] = found;
            }
            for c in self.merges[i] {
                if c < n {
                    assigned[c] = tmp[i];
                    sizes[tmp[i] - 1] += 1;
                } else {
                    tmp[c - n] = tmp[i];
                }
            }
        }

        let membership = assigned
            .into_iter()
            .map(|a| {
                if a != 0 {
                    a - 1
                } else {
                    sizes[found] += 1;
                    found += 1;
                    found - 1
                }
            })
            .collect();
        Ok((membership, sizes))
    }

    /// Membership with exactly `k` components.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.leaves {
            return Err(Error::invalid("k", format!("{k} components from {} leaves", self.leaves)));
        }
        let steps = self.leaves - k;
        if steps > self.merges.len() {
            return Err(Error::invalid(
                "k",
                format!("{k} components need {steps} merges, only {} recorded", self.merges.len()),
            ));
        }
        self.to_membership(steps).map(|(m, _)| m)
    }
}

/// Membership of `vertex_count` vertices after the first `steps` rows of `merges`.
///
/// Shorthand for [`Dendrogram::from_merges`] followed by
/// [`Dendrogram::to_membership`].
pub fn community_to_membership(
    merges: &[[usize; 2]],
    vertex_count: usize,
    steps: usize,
) -> Result<(Vec<usize>, Vec<usize>)> {
    Dendrogram::from_merges(vertex_count, merges.to_vec())?.to_membership(steps)
}
