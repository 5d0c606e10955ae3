use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use num_traits::{Float, Zero};
use ordered_float::OrderedFloat;

use crate::graph::AdjacencyGraph;
use crate::{Error, Result};

/// Classic Dijkstra over an [`AdjacencyGraph`], with lazy deletion.
///
/// Runs on the graph as given, without degree bounding or perturbation, so
/// it doubles as the correctness oracle for the recursive solver.
#[derive(Debug, Default)]
pub struct Dijkstra;

impl Dijkstra {
    /// Shortest distances and predecessors from `origins`; each entry is the
    /// distance to the nearest origin, `None` when unreachable.
    pub fn shortest_paths<W>(
        graph: &AdjacencyGraph<W>,
        origins: &[usize],
    ) -> Result<(Vec<Option<W>>, Vec<Option<usize>>)>
    where
        W: Float + Zero + Debug + Copy,
    {
        let n = graph.node_count();
        if origins.is_empty() {
            return Err(Error::EmptyOrigin);
        }

        let mut distances: Vec<Option<W>> = vec![None; n];
        let mut predecessors: Vec<Option<usize>> = vec![None; n];
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<W>, usize)>> = BinaryHeap::new();

        for &origin in origins {
            if origin >= n {
                return Err(Error::InvalidNode {
                    node: origin,
                    len: n,
                });
            }
            distances[origin] = Some(W::zero());
            heap.push(Reverse((OrderedFloat(W::zero()), origin)));
        }

        while let Some(Reverse((dist_u, u))) = heap.pop() {
            // Stale entry from an earlier, worse push
            if let Some(current) = distances[u] {
                if OrderedFloat(current) < dist_u {
                    continue;
                }
            }
            for (v, weight) in graph.outgoing(u) {
                let nd = dist_u.0 + weight;
                let improves = match distances[v] {
                    None => true,
                    Some(current) => nd < current,
                };
                if improves {
                    distances[v] = Some(nd);
                    predecessors[v] = Some(u);
                    heap.push(Reverse((OrderedFloat(nd), v)));
                }
            }
        }

        Ok((distances, predecessors))
    }
}
