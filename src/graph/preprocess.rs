//! Graph preprocessing for the BMSSP recursion: degree bounding and weight
//! perturbation, plus the inverse mapping back to original node ids.

use std::fmt::Debug;

use num_traits::{Float, Zero};

use crate::graph::adjacency::AdjacencyGraph;

/// Decimal digits kept when mapping solved distances back to the caller.
pub const DEFAULT_PRECISION: u32 = 6;

/// A degree-bounded, weight-perturbed copy of an input graph, ready for the
/// recursive solver, along with everything needed to map results back.
#[derive(Debug, Clone)]
pub struct PreprocessedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// The bounded-degree graph: at most two incoming and two outgoing edges
    /// per node, all weights strictly ordered by perturbation.
    pub graph: AdjacencyGraph<W>,
    /// `idx_map[new_id] = original_id`; identity below `original_length`.
    pub idx_map: Vec<usize>,
    /// Node count of the input graph.
    pub original_length: usize,
    /// Decimal digits restored by truncation in [`convert_back`].
    pub precision: u32,
}

/// Converts an arbitrary non-negative-weight graph into one where every node
/// has at most two incoming and two outgoing edges, then perturbs all weights
/// into a strict global order.
///
/// Any node with indegree > 2, outdegree > 2, or indegree + outdegree > 3 is
/// split into a ring of `max(indegree, outdegree)` members (the node itself
/// plus appended shadows) joined by zero-weight edges, with outgoing edges
/// distributed one per member and incoming edges likewise. Distances to the
/// original node id are unaffected because the ring is freely traversable at
/// zero cost (up to perturbation, which truncation removes).
pub fn preprocess<W>(graph: &AdjacencyGraph<W>, precision: u32) -> PreprocessedGraph<W>
where
    W: Float + Zero + Debug + Copy,
{
    let original_length = graph.node_count();
    let mut out: Vec<Vec<(usize, W)>> = graph.rows().to_vec();

    // Reverse adjacency: inc[v] lists (source, weight) in discovery order
    let mut inc: Vec<Vec<(usize, W)>> = vec![Vec::new(); original_length];
    for (from, row) in out.iter().enumerate() {
        for &(to, weight) in row {
            inc[to].push((from, weight));
        }
    }

    // Degree decisions are made against the untouched input graph
    let mut to_split: Vec<(usize, usize)> = Vec::new();
    for node in 0..original_length {
        let indegree = inc[node].len();
        let outdegree = out[node].len();
        if indegree > 2 || outdegree > 2 || indegree + outdegree > 3 {
            to_split.push((node, indegree.max(outdegree)));
        }
    }

    let mut idx_map: Vec<usize> = (0..original_length).collect();

    for (node, ring_size) in to_split {
        let mut ring = vec![node];
        for _ in 1..ring_size {
            let shadow = out.len();
            out.push(Vec::new());
            inc.push(Vec::new());
            idx_map.push(node);
            ring.push(shadow);
        }

        let out_edges = std::mem::take(&mut out[node]);
        let in_edges = std::mem::take(&mut inc[node]);

        // One outgoing edge per ring member, starting at the node itself
        for (i, (target, weight)) in out_edges.into_iter().enumerate() {
            let owner = ring[i];
            out[owner].push((target, weight));
            retarget(&mut inc[target], node, owner);
        }
        // One incoming edge per ring member, independently
        for (i, (source, weight)) in in_edges.into_iter().enumerate() {
            let owner = ring[i];
            inc[owner].push((source, weight));
            retarget(&mut out[source], node, owner);
        }
        // Close the ring with zero-weight edges in both bookkeeping tables
        for i in 0..ring.len() {
            let from = ring[i];
            let to = ring[(i + 1) % ring.len()];
            out[from].push((to, W::zero()));
            inc[to].push((from, W::zero()));
        }
    }

    perturb(&mut out, precision);

    PreprocessedGraph {
        graph: AdjacencyGraph::from_rows_unchecked(out),
        idx_map,
        original_length,
        precision,
    }
}

/// Rewrites the single entry pointing at `old` to point at `new` instead.
fn retarget<W: Copy>(edges: &mut [(usize, W)], old: usize, new: usize) {
    if let Some(entry) = edges.iter_mut().find(|(id, _)| *id == old) {
        entry.0 = new;
    }
}

/// Adds a strictly increasing, vanishingly small increment to every edge
/// weight, in deterministic node-then-position order.
///
/// The increment unit is `10^-precision / (m+1)^2` for `m` edges, so the
/// perturbation accumulated along any path stays below one truncation step:
/// originally-distinct path lengths are never reordered, while
/// originally-equal ones become strictly ordered (up to collisions between
/// equal index sums, which the truncation step makes harmless).
fn perturb<W>(rows: &mut [Vec<(usize, W)>], precision: u32)
where
    W: Float + Zero + Debug + Copy,
{
    let edge_count: usize = rows.iter().map(|row| row.len()).sum();
    let span = (edge_count + 1) as f64;
    let unit = 10f64.powi(-(precision as i32)) / (span * span);

    let mut edge_index = 0usize;
    for row in rows.iter_mut() {
        for entry in row.iter_mut() {
            let bump = (edge_index + 1) as f64 * unit;
            if let Some(bump) = W::from(bump) {
                entry.1 = entry.1 + bump;
            }
            edge_index += 1;
        }
    }
}

/// Maps raw solver output on the bounded-degree graph back to original node
/// ids: distances are truncated (not rounded) to `precision` decimal digits
/// over the first `original_length` entries, and predecessors follow
/// `idx_map` through same-node shadow hops until a distinct original id.
pub fn convert_back<W>(
    distances: &[W],
    predecessors: &[Option<usize>],
    info: &PreprocessedGraph<W>,
) -> (Vec<Option<W>>, Vec<Option<usize>>)
where
    W: Float + Zero + Debug + Copy,
{
    let n = info.original_length;
    let mut out_distances = Vec::with_capacity(n);
    let mut out_predecessors = Vec::with_capacity(n);

    for node in 0..n {
        let d = distances[node];
        if d == W::infinity() {
            out_distances.push(None);
        } else {
            out_distances.push(Some(truncate(d, info.precision)));
        }

        let mut cursor = predecessors[node];
        let mapped = loop {
            match cursor {
                None => break None,
                Some(p) => {
                    let original = info.idx_map[p];
                    if original != node {
                        break Some(original);
                    }
                    // A hop within this node's own shadow ring; keep walking
                    cursor = predecessors[p];
                }
            }
        };
        out_predecessors.push(mapped);
    }

    (out_distances, out_predecessors)
}

/// Truncates toward zero at `precision` decimal digits, with a one-nano-digit
/// guard against values sitting a float rounding error below a boundary.
pub(crate) fn truncate<W>(value: W, precision: u32) -> W
where
    W: Float + Zero + Debug + Copy,
{
    let raw = match value.to_f64() {
        Some(v) if v.is_finite() => v,
        _ => return value,
    };
    let scale = 10f64.powi(precision as i32);
    let truncated = (raw * scale + 1e-9).floor() / scale;
    W::from(truncated).unwrap_or(value)
}
