use std::fmt::Debug;

use num_traits::{Float, Zero};

use crate::{Error, Result};

/// A directed graph as an ordered sequence of adjacency rows: node `i` maps
/// each neighbor id to a non-negative edge weight.
///
/// Construction enforces the input invariants the solver's correctness proof
/// relies on: no negative weights, no self-loops, no duplicate targets.
/// Row order (insertion order of edges) is preserved, which keeps every
/// downstream computation deterministic.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    rows: Vec<Vec<(usize, W)>>,
}

impl<W> AdjacencyGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// Creates a graph with `nodes` nodes and no edges.
    pub fn new(nodes: usize) -> Self {
        AdjacencyGraph {
            rows: vec![Vec::new(); nodes],
        }
    }

    /// Builds a graph from adjacency rows, validating every edge.
    pub fn from_rows(rows: Vec<Vec<(usize, W)>>) -> Result<Self> {
        let mut graph = AdjacencyGraph::new(rows.len());
        for (from, row) in rows.into_iter().enumerate() {
            for (to, weight) in row {
                graph.add_edge(from, to, weight)?;
            }
        }
        Ok(graph)
    }

    /// Appends a new node and returns its id.
    pub fn add_node(&mut self) -> usize {
        self.rows.push(Vec::new());
        self.rows.len() - 1
    }

    /// Adds a directed edge, rejecting out-of-range endpoints, self-loops,
    /// duplicate targets, and negative weights.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: W) -> Result<()> {
        let len = self.rows.len();
        if from >= len {
            return Err(Error::InvalidNode { node: from, len });
        }
        if to >= len {
            return Err(Error::InvalidNode { node: to, len });
        }
        if from == to || self.rows[from].iter().any(|&(t, _)| t == to) {
            return Err(Error::InvalidEdge(from, to));
        }
        if weight < W::zero() {
            return Err(Error::NegativeWeight(weight.to_f64().unwrap_or(f64::NAN)));
        }
        self.rows[from].push((to, weight));
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn outgoing(&self, node: usize) -> impl Iterator<Item = (usize, W)> + '_ {
        self.rows[node].iter().copied()
    }

    /// Out-degree of a node.
    pub fn out_degree(&self, node: usize) -> usize {
        self.rows[node].len()
    }

    /// Weight of the edge `from -> to`, if present.
    pub fn edge_weight(&self, from: usize, to: usize) -> Option<W> {
        self.rows
            .get(from)?
            .iter()
            .find(|&&(t, _)| t == to)
            .map(|&(_, w)| w)
    }

    pub(crate) fn rows(&self) -> &[Vec<(usize, W)>] {
        &self.rows
    }

    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<(usize, W)>>) -> Self {
        AdjacencyGraph { rows }
    }
}
