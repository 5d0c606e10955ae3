use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt::Debug;

use num_traits::{Float, Zero};
use ordered_float::OrderedFloat;

use crate::data_structures::Frontier;
use crate::Result;

/// A binary-heap-backed [`Frontier`] with lazy deletion.
///
/// Asymptotically worse than [`crate::data_structures::BucketQueue`] on large
/// frontiers, but simple enough to serve as the parity reference: both
/// implementations must pull identical key sets and report identical
/// remaining bounds for any operation sequence.
#[derive(Debug)]
pub struct HeapFrontier<W>
where
    W: Float + Zero + Debug + Copy,
{
    pull_size: usize,
    upper_bound: W,
    heap: BinaryHeap<Reverse<(OrderedFloat<W>, usize)>>,
    best: HashMap<usize, W>,
}

impl<W> HeapFrontier<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn offer(&mut self, key: usize, value: W) {
        match self.best.get(&key) {
            Some(&held) if OrderedFloat(held) <= OrderedFloat(value) => {}
            _ => {
                self.best.insert(key, value);
                self.heap.push(Reverse((OrderedFloat(value), key)));
            }
        }
    }

    /// Drops stale heap tops left behind by refreshes and pulls.
    fn skim(&mut self) {
        while let Some(Reverse((value, key))) = self.heap.peek() {
            match self.best.get(key) {
                Some(held) if OrderedFloat(*held) == *value => break,
                _ => {
                    self.heap.pop();
                }
            }
        }
    }
}

impl<W> Frontier<W> for HeapFrontier<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn with_bound(subset_size: usize, upper_bound: W) -> Self {
        HeapFrontier {
            pull_size: subset_size.max(1),
            upper_bound,
            heap: BinaryHeap::new(),
            best: HashMap::new(),
        }
    }

    fn insert_key_value(&mut self, key: usize, value: W) -> Result<()> {
        self.offer(key, value);
        Ok(())
    }

    fn batch_prepend(&mut self, pairs: Vec<(usize, W)>) -> Result<()> {
        for (key, value) in pairs {
            self.offer(key, value);
        }
        Ok(())
    }

    fn pull(&mut self) -> Result<(W, Vec<usize>)> {
        let mut subset = Vec::with_capacity(self.pull_size);
        while subset.len() < self.pull_size {
            self.skim();
            match self.heap.pop() {
                Some(Reverse((_, key))) => {
                    self.best.remove(&key);
                    subset.push(key);
                }
                None => break,
            }
        }
        self.skim();
        let remaining_best = match self.heap.peek() {
            Some(Reverse((value, _))) => value.0,
            None => self.upper_bound,
        };
        Ok((remaining_best, subset))
    }

    fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    fn len(&self) -> usize {
        self.best.len()
    }
}
