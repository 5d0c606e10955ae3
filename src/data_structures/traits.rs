use std::fmt::Debug;

use num_traits::{Float, Zero};

use crate::Result;

/// Contract for the frontier structure driving one BMSSP recursion level.
///
/// A frontier holds (node, tentative distance) pairs below a fixed upper
/// bound and serves "the M globally smallest keys, plus a certified lower
/// bound on everything left" without sorting the whole frontier. Any
/// conforming implementation may be injected into the solver; two conforming
/// implementations fed the same operation sequence must pull identical key
/// sets and report identical remaining bounds.
pub trait Frontier<W>: Debug
where
    W: Float + Zero + Debug + Copy,
{
    /// Creates a frontier that pulls up to `subset_size` keys at a time and
    /// never holds a value at or above `upper_bound`.
    fn with_bound(subset_size: usize, upper_bound: W) -> Self;

    /// Inserts or refreshes a key. A key already held with a value less than
    /// or equal to `value` is left untouched.
    fn insert_key_value(&mut self, key: usize, value: W) -> Result<()>;

    /// Inserts a batch of pairs known to be no larger than the current global
    /// minimum, deduplicated per key with keep-smallest semantics.
    fn batch_prepend(&mut self, pairs: Vec<(usize, W)>) -> Result<()>;

    /// Removes and returns up to `subset_size` keys with the globally
    /// smallest values, together with a lower bound on every value still
    /// held (or the upper bound if now empty).
    fn pull(&mut self) -> Result<(W, Vec<usize>)>;

    /// True iff no keys are held.
    fn is_empty(&self) -> bool;

    /// Number of keys currently held.
    fn len(&self) -> usize;
}
