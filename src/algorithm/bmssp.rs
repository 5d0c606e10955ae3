use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::marker::PhantomData;

use log::{debug, trace};
use num_traits::{Float, Zero};
use ordered_float::OrderedFloat;

use crate::data_structures::quickselect::partition_by_size;
use crate::data_structures::Frontier;
use crate::graph::AdjacencyGraph;
use crate::{Error, Result};

/// `2^exp`, saturating well below overflow so the budget arithmetic stays
/// sound at any recursion depth.
fn pow2_capped(exp: usize) -> usize {
    if exp >= usize::BITS as usize - 2 {
        usize::MAX >> 2
    } else {
        1usize << exp
    }
}

/// The BMSSP recursion over a bounded-degree graph.
///
/// Each call `solve(level, bound, frontier)` returns `(new_bound, finalized)`
/// where every finalized node's recorded distance is proved final below
/// `new_bound <= bound`. Distances only ever decrease, and every predecessor
/// update is paired with the distance update that justifies it.
#[derive(Debug)]
pub struct RecursiveSolver<'g, W, Q>
where
    W: Float + Zero + Debug + Copy,
    Q: Frontier<W>,
{
    graph: &'g AdjacencyGraph<W>,
    /// Relaxation rounds run while hunting for pivots; also the subtree size
    /// a frontier node must reach to become one.
    k: usize,
    /// Target recursion depth parameter; scales the per-level pull size and
    /// the finalization budget.
    t: usize,
    distances: Vec<W>,
    predecessors: Vec<Option<usize>>,
    _frontier: PhantomData<Q>,
}

impl<'g, W, Q> RecursiveSolver<'g, W, Q>
where
    W: Float + Zero + Debug + Copy,
    Q: Frontier<W>,
{
    /// Computes shortest distances and predecessors from `origins` (distance
    /// to the nearest origin when several are given) over the whole graph.
    ///
    /// `k` and `t` default to `ceil(log2(n)^(1/3))` and
    /// `floor(log2(n)^(2/3))`, both clamped to at least 2. Graphs with at
    /// most one node need no recursion and are answered directly.
    pub fn run(
        graph: &'g AdjacencyGraph<W>,
        origins: &[usize],
        k_override: Option<usize>,
        t_override: Option<usize>,
    ) -> Result<(Vec<W>, Vec<Option<usize>>)> {
        let n = graph.node_count();
        let mut distances = vec![W::infinity(); n];
        let predecessors: Vec<Option<usize>> = vec![None; n];
        for &origin in origins {
            distances[origin] = W::zero();
        }
        if n <= 1 {
            return Ok((distances, predecessors));
        }

        let log_n = (n as f64).log2().max(1.0);
        let k = k_override
            .unwrap_or_else(|| log_n.powf(1.0 / 3.0).ceil() as usize)
            .max(2);
        let t = t_override
            .unwrap_or_else(|| log_n.powf(2.0 / 3.0).floor() as usize)
            .max(2);
        let top_level = ((log_n / t as f64).ceil() as usize).max(1);
        debug!(
            "bmssp run: n={} k={} t={} top_level={} origins={}",
            n,
            k,
            t,
            top_level,
            origins.len()
        );

        let mut solver = RecursiveSolver {
            graph,
            k,
            t,
            distances,
            predecessors,
            _frontier: PhantomData::<Q>,
        };
        solver.solve(top_level, W::infinity(), origins)?;
        Ok((solver.distances, solver.predecessors))
    }

    /// One recursion level: finalizes nodes whose distance is provably below
    /// the returned boundary.
    fn solve(&mut self, level: usize, bound: W, frontier: &[usize]) -> Result<(W, Vec<usize>)> {
        if frontier.is_empty() {
            return Ok((bound, Vec::new()));
        }
        if level == 0 {
            return self.base_case(bound, frontier);
        }

        let (pivots, work_set) = self.find_pivots(bound, frontier)?;
        let subset_size = pow2_capped((level - 1) * self.t);
        let budget = self.k.saturating_mul(pow2_capped(level * self.t));
        trace!(
            "level {}: {} pivots over work set of {}, subset size {}, budget {}",
            level,
            pivots.len(),
            work_set.len(),
            subset_size,
            budget
        );

        let mut queue = Q::with_bound(subset_size, bound);
        for &pivot in &pivots {
            queue.insert_key_value(pivot, self.distances[pivot])?;
        }

        let mut finalized: HashSet<usize> = HashSet::new();
        let mut last_bound = bound;
        let mut exhausted = false;
        loop {
            if queue.is_empty() {
                exhausted = true;
                break;
            }
            if finalized.len() >= budget {
                break;
            }

            let (batch_bound, batch) = queue.pull()?;
            if batch.is_empty() {
                return Err(Error::Structural(
                    "pull returned nothing from a non-empty frontier",
                ));
            }
            let (sub_bound, sub_finalized) = self.solve(level - 1, batch_bound, &batch)?;
            finalized.extend(sub_finalized.iter().copied());

            // Relax out of everything the sub-call finalized. The comparison
            // is non-strict: a target whose label was already written by an
            // earlier pivot search or sub-call still has to flow back into a
            // frontier, or its own edges would never be relaxed. Values in
            // [batch_bound, bound) join the queue normally; those in
            // [sub_bound, batch_bound) were skipped over by the sub-call and
            // must be prepended ahead of everything queued.
            let mut prepend: Vec<(usize, W)> = Vec::new();
            for &u in &sub_finalized {
                let du = self.distances[u];
                for (v, weight) in self.graph.outgoing(u) {
                    let nd = du + weight;
                    if nd <= self.distances[v] {
                        self.distances[v] = nd;
                        self.predecessors[v] = Some(u);
                        // A node finalized at this level already had its
                        // edges relaxed with its final label
                        if !finalized.contains(&v) {
                            if nd >= batch_bound && nd < bound {
                                queue.insert_key_value(v, nd)?;
                            } else if nd >= sub_bound && nd < batch_bound {
                                prepend.push((v, nd));
                            }
                        }
                    }
                }
            }
            // Batch members the sub-call could not finalize go around again.
            // The upper comparison is inclusive: ties between origins sit
            // exactly at the batch bound and must not fall out of the loop.
            for &x in &batch {
                if finalized.contains(&x) {
                    continue;
                }
                let dx = self.distances[x];
                if dx >= sub_bound && dx <= batch_bound {
                    prepend.push((x, dx));
                }
            }
            queue.batch_prepend(prepend)?;
            last_bound = sub_bound;
        }

        // Draining the queue proves everything below `bound`; tripping the
        // budget only proves what sits below the last sub-boundary.
        let final_bound = if exhausted { bound } else { last_bound };
        if !exhausted {
            finalized.retain(|&v| self.distances[v] < final_bound);
        }
        for &v in &work_set {
            if self.distances[v] < final_bound {
                finalized.insert(v);
            }
        }
        Ok((final_bound, finalized.into_iter().collect()))
    }

    /// Leaf of the recursion: bounded single-pull relaxation, Dijkstra-style,
    /// capped at `k + |frontier|` settled nodes.
    fn base_case(&mut self, bound: W, frontier: &[usize]) -> Result<(W, Vec<usize>)> {
        let mut queue = Q::with_bound(1, bound);
        // Seeding is inclusive of the bound itself: a frontier member pulled
        // at a value equal to its batch bound still has to settle here.
        for &s in frontier {
            if self.distances[s] <= bound {
                queue.insert_key_value(s, self.distances[s])?;
            }
        }

        let budget = self.k + frontier.len();
        let mut settled: Vec<usize> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        while !queue.is_empty() && settled.len() < budget {
            let (_, batch) = queue.pull()?;
            for u in batch {
                let du = self.distances[u];
                if seen.insert(u) {
                    settled.push(u);
                }
                for (v, weight) in self.graph.outgoing(u) {
                    let nd = du + weight;
                    // Non-strict: re-enqueue targets whose label was written
                    // by an earlier pivot search without ever being frontiered
                    if nd <= self.distances[v] && nd < bound {
                        self.distances[v] = nd;
                        self.predecessors[v] = Some(u);
                        queue.insert_key_value(v, nd)?;
                    }
                }
            }
        }

        if queue.is_empty() {
            return Ok((bound, settled));
        }
        // Budget hit: tighten the boundary to the (k+1)-smallest settled
        // distance and keep only nodes proved below it.
        let values: Vec<W> = settled.iter().map(|&v| self.distances[v]).collect();
        let split = partition_by_size(&values, self.k);
        let new_bound = split
            .higher
            .iter()
            .map(|&v| OrderedFloat(v))
            .min()
            .map(|m| m.0)
            .unwrap_or(bound);
        settled.retain(|&v| self.distances[v] < new_bound);
        Ok((new_bound, settled))
    }

    /// Runs `k` rounds of bounded relaxation out of the frontier, then elects
    /// pivots: frontier nodes whose shortest-path subtree grew to at least
    /// `k` members, i.e. the representatives of dense neighborhoods.
    ///
    /// Returns the pivots and the full set of nodes touched by the
    /// relaxation (frontier included).
    fn find_pivots(&mut self, bound: W, frontier: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
        let mut work_set: Vec<usize> = frontier.to_vec();
        let mut visited: HashSet<usize> = frontier.iter().copied().collect();
        let mut wave: VecDeque<usize> = frontier.iter().copied().collect();

        let mut rounds = 0;
        while !wave.is_empty() && rounds < self.k {
            for _ in 0..wave.len() {
                let u = match wave.pop_front() {
                    Some(u) => u,
                    None => break,
                };
                let du = self.distances[u];
                for (v, weight) in self.graph.outgoing(u) {
                    let nd = du + weight;
                    // Non-strict, so nodes labeled by an earlier search still
                    // join the work set and the subtree census
                    if nd <= self.distances[v] && nd < bound {
                        self.distances[v] = nd;
                        self.predecessors[v] = Some(u);
                        if visited.insert(v) {
                            work_set.push(v);
                            wave.push_back(v);
                        }
                    }
                }
            }
            rounds += 1;
        }

        // A small work set means no dense neighborhoods; every frontier node
        // stands for itself.
        if work_set.len() <= self.k.saturating_mul(frontier.len()) {
            return Ok((frontier.to_vec(), work_set));
        }

        // Census of the forest the relaxation grew: each touched node
        // charges the frontier root its predecessor chain reaches.
        let sources: HashSet<usize> = frontier.iter().copied().collect();
        let mut tree_sizes: HashMap<usize, usize> = HashMap::new();
        let hop_cap = self.graph.node_count();
        for &v in &work_set {
            let mut current = v;
            let mut hops = 0;
            let root = loop {
                if sources.contains(&current) {
                    break Some(current);
                }
                match self.predecessors[current] {
                    Some(p) if hops < hop_cap => {
                        current = p;
                        hops += 1;
                    }
                    _ => break None,
                }
            };
            if let Some(root) = root {
                *tree_sizes.entry(root).or_insert(0) += 1;
            }
        }

        let mut pivots: Vec<usize> = frontier
            .iter()
            .copied()
            .filter(|s| tree_sizes.get(s).copied().unwrap_or(0) >= self.k)
            .collect();
        if pivots.is_empty() {
            // No tree made the cut; fall back to the largest one
            let mut best = frontier[0];
            let mut best_size = 0;
            for &s in frontier {
                let size = tree_sizes.get(&s).copied().unwrap_or(0);
                if size > best_size {
                    best = s;
                    best_size = size;
                }
            }
            pivots.push(best);
        }
        trace!(
            "find_pivots: {} sources -> {} pivots, work set {}",
            frontier.len(),
            pivots.len(),
            work_set.len()
        );
        Ok((pivots, work_set))
    }
}
