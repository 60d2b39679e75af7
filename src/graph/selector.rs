use crate::error::{Error, Result};

/// Which vertices an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexSelector {
    /// Every vertex, in id order.
    All,
    /// One vertex.
    Single(usize),
    /// Explicit ids; duplicates are allowed.
    Ids(Vec<usize>),
}

/// Which edges an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeSelector {
    /// Every edge, in id order.
    All,
    /// One edge.
    Single(usize),
    /// Explicit ids; duplicates are allowed.
    Ids(Vec<usize>),
}

impl VertexSelector {
    /// Expand to ids, checking each against `vertex_count`.
    pub(crate) fn resolve(&self, vertex_count: usize) -> Result<Vec<usize>> {
        let check = |v: usize| {
            if v < vertex_count {
                Ok(v)
            } else {
                Err(Error::InvalidVertex {
                    vertex: v,
                    vertex_count,
                })
            }
        };
        match self {
            VertexSelector::All => Ok((0..vertex_count).collect()),
            VertexSelector::Single(v) => Ok(vec![check(*v)?]),
            VertexSelector::Ids(ids) => ids.iter().map(|&v| check(v)).collect(),
        }
    }
}

impl EdgeSelector {
    /// Expand to ids, checking each against `edge_count`.
    pub(crate) fn resolve(&self, edge_count: usize) -> Result<Vec<usize>> {
        let check = |e: usize| {
            if e < edge_count {
                Ok(e)
            } else {
                Err(Error::InvalidEdge { edge: e, edge_count })
            }
        };
        match self {
            EdgeSelector::All => Ok((0..edge_count).collect()),
            EdgeSelector::Single(e) => Ok(vec![check(*e)?]),
            EdgeSelector::Ids(ids) => ids.iter().map(|&e| check(e)).collect(),
        }
    }
}

impl From<usize> for VertexSelector {
    fn from(v: usize) -> Self {
        VertexSelector::Single(v)
    }
}

impl From<Vec<usize>> for VertexSelector {
    fn from(ids: Vec<usize>) -> Self {
        VertexSelector::Ids(ids)
    }
}

impl From<usize> for EdgeSelector {
    fn from(e: usize) -> Self {
        EdgeSelector::Single(e)
    }
}

impl From<Vec<usize>> for EdgeSelector {
    fn from(ids: Vec<usize>) -> Self {
        EdgeSelector::Ids(ids)
    }
}
