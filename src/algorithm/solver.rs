use std::collections::BTreeSet;
use std::fmt::Debug;

use log::debug;
use num_traits::{Float, Zero};

use crate::algorithm::bmssp::RecursiveSolver;
use crate::data_structures::{BucketQueue, Frontier};
use crate::graph::{convert_back, preprocess, AdjacencyGraph, PreprocessedGraph, DEFAULT_PRECISION};
use crate::{Error, Result};

/// Where a solve starts from: one node, or the nearest of a set of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Single(usize),
    MultiSource(BTreeSet<usize>),
}

impl Origin {
    fn ids(&self) -> Result<Vec<usize>> {
        match self {
            Origin::Single(id) => Ok(vec![*id]),
            Origin::MultiSource(ids) => {
                if ids.is_empty() {
                    return Err(Error::EmptyOrigin);
                }
                Ok(ids.iter().copied().collect())
            }
        }
    }
}

impl From<usize> for Origin {
    fn from(id: usize) -> Self {
        Origin::Single(id)
    }
}

impl FromIterator<usize> for Origin {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Origin::MultiSource(iter.into_iter().collect())
    }
}

/// Knobs for one solve; `None` picks the size-derived defaults.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Relaxation rounds per pivot hunt (the `k` parameter).
    pub pivot_relaxation_steps: Option<usize>,
    /// Target recursion tree depth (the `t` parameter).
    pub target_tree_depth: Option<usize>,
}

/// Everything one solve produced, indexed by original node ids.
#[derive(Debug, Clone)]
pub struct SolveReport<W>
where
    W: Float + Zero + Debug + Copy,
{
    pub origin: Origin,
    pub destination: Option<usize>,
    /// Shortest-path tree: the node preceding each node, `None` at origins
    /// and unreachable nodes.
    pub predecessor: Vec<Option<usize>>,
    /// Distance from the nearest origin to each node, `None` if unreachable.
    pub distance_matrix: Vec<Option<W>>,
    /// Origin-to-destination node sequence, when a destination was given.
    pub path: Option<Vec<usize>>,
    /// Length of `path`.
    pub length: Option<W>,
}

/// The solver facade: preprocesses a graph once, answers any number of
/// shortest-path queries against it.
#[derive(Debug, Clone)]
pub struct Bmssp<W>
where
    W: Float + Zero + Debug + Copy,
{
    preprocessed: PreprocessedGraph<W>,
}

impl<W> Bmssp<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// Prepares `graph` for solving at [`DEFAULT_PRECISION`].
    pub fn new(graph: &AdjacencyGraph<W>) -> Self {
        Bmssp::with_precision(graph, DEFAULT_PRECISION)
    }

    /// Prepares `graph`, keeping `precision` decimal digits in reported
    /// distances.
    pub fn with_precision(graph: &AdjacencyGraph<W>, precision: u32) -> Self {
        let preprocessed = preprocess(graph, precision);
        debug!(
            "preprocessed {} nodes / {} edges into {} nodes",
            preprocessed.original_length,
            graph.edge_count(),
            preprocessed.graph.node_count()
        );
        Bmssp { preprocessed }
    }

    /// The degree-bounded graph queries actually run on.
    pub fn preprocessed(&self) -> &PreprocessedGraph<W> {
        &self.preprocessed
    }

    /// Solves with the default frontier and options.
    pub fn solve(
        &self,
        origin: impl Into<Origin>,
        destination: Option<usize>,
    ) -> Result<SolveReport<W>> {
        self.solve_with::<BucketQueue<W>>(origin.into(), destination, SolveOptions::default())
    }

    /// Solves with an explicit frontier implementation and options.
    ///
    /// With a destination, the report carries the reconstructed path and its
    /// length; an unreachable destination is an error. Without one, only the
    /// distance matrix and predecessor tree are filled in.
    pub fn solve_with<Q: Frontier<W>>(
        &self,
        origin: Origin,
        destination: Option<usize>,
        options: SolveOptions,
    ) -> Result<SolveReport<W>> {
        let n = self.preprocessed.original_length;
        let origins = origin.ids()?;
        for &o in &origins {
            if o >= n {
                return Err(Error::InvalidNode { node: o, len: n });
            }
        }
        if let Some(dest) = destination {
            if dest >= n {
                return Err(Error::InvalidNode { node: dest, len: n });
            }
        }

        let (raw_distances, raw_predecessors) = RecursiveSolver::<W, Q>::run(
            &self.preprocessed.graph,
            &origins,
            options.pivot_relaxation_steps,
            options.target_tree_depth,
        )?;
        let (distance_matrix, predecessor) =
            convert_back(&raw_distances, &raw_predecessors, &self.preprocessed);

        let (path, length) = match destination {
            Some(dest) => match distance_matrix[dest] {
                None => return Err(Error::UnreachableDestination(dest)),
                Some(len) => (
                    Some(reconstruct_path(dest, &predecessor, n)?),
                    Some(len),
                ),
            },
            None => (None, None),
        };

        Ok(SolveReport {
            origin,
            destination,
            predecessor,
            distance_matrix,
            path,
            length,
        })
    }
}

/// Walks the predecessor tree from `destination` back to an origin (the first
/// node with no predecessor) and reverses the walk.
fn reconstruct_path(
    destination: usize,
    predecessor: &[Option<usize>],
    n: usize,
) -> Result<Vec<usize>> {
    let mut path = vec![destination];
    let mut cursor = destination;
    while let Some(p) = predecessor[cursor] {
        path.push(p);
        cursor = p;
        if path.len() > n {
            return Err(Error::Structural("predecessor chain forms a cycle"));
        }
    }
    path.reverse();
    Ok(path)
}
