//! Merge hierarchies produced by community detection.
//!
//! Both detectors describe their output as a sequence of binary merges. The
//! edge betweenness detector merges vertices as removed edges are added back
//! in reverse order; the leading eigenvector detector reports how its final
//! communities would be re-joined, undoing its splits from last to first.
//!
//! ```text
//!             7            row 0: (0, 1) -> 5
//!           /   \          row 1: (2, 3) -> 6
//!          5     6         row 2: (5, 6) -> 7
//!         / \   / \
//!        0   1 2   3   4   leaves 0..5, leaf 4 never merged
//! ```
//!
//! Applying the first `steps` rows gives a flat partition with
//! `leaves - steps` components, see [`Dendrogram::to_membership`].

mod dendrogram;

pub use dendrogram::{community_to_membership, Dendrogram};
