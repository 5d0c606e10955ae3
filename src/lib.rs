//! BMSSP - Bounded Multi-Source Shortest Path
//!
//! This library computes single-source (or multi-source) shortest distances and
//! predecessor trees on directed graphs with non-negative edge weights, using a
//! divide-and-conquer recursion that advances the frontier in bounded batches
//! instead of one node at a time.
//!
//! The solver runs on a degree-bounded copy of the input graph (at most two
//! incoming and two outgoing edges per node) whose weights are perturbed so
//! that all path lengths are strictly ordered. The frontier at each recursion
//! level is a [`data_structures::BucketQueue`]: blocks of (node, tentative
//! distance) pairs indexed by a red-black tree on per-block upper bounds,
//! pulled M at a time with a certified lower bound on everything left behind.

pub mod algorithm;
pub mod data_structures;
pub mod graph;

pub use algorithm::{
    dijkstra::Dijkstra,
    solver::{Bmssp, Origin, SolveOptions, SolveReport},
};
pub use data_structures::{BucketQueue, Frontier, HeapFrontier};
/// Re-export main types for convenient use
pub use graph::adjacency::AdjacencyGraph;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid node ID: {node} (graph has {len} nodes)")]
    InvalidNode { node: usize, len: usize },

    #[error("Invalid edge: from {0} to {1}")]
    InvalidEdge(usize, usize),

    #[error("Negative edge weight: {0}")]
    NegativeWeight(f64),

    #[error("Origin set must contain at least one node")]
    EmptyOrigin,

    #[error("Destination {0} is not reachable from the origin")]
    UnreachableDestination(usize),

    #[error("Frontier invariant violated: {0}")]
    Structural(&'static str),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, Error>;
