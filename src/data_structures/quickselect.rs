use std::fmt::Debug;

use num_traits::Float;
use ordered_float::OrderedFloat;

/// An exact-size two-way split of a value array.
#[derive(Debug, Clone)]
pub struct Split<W> {
    /// The `lower_size` smallest values (unordered).
    pub lower: Vec<W>,
    /// Everything else (unordered).
    pub higher: Vec<W>,
}

/// An exact-size two-way split of key/value pairs, partitioned by value.
#[derive(Debug, Clone)]
pub struct PairSplit<K, W> {
    /// The pairs carrying the `lower_size` smallest values (unordered).
    pub lower: Vec<(K, W)>,
    /// Everything else (unordered).
    pub higher: Vec<(K, W)>,
    /// The last pivot the partitioning actually selected; infinity when the
    /// input was empty and no pivot was ever chosen.
    pub pivot: W,
}

/// Median of a short slice, picking the upper of the two middle values for
/// even lengths so the result is always an element of the input.
fn small_median<W>(values: &[W]) -> W
where
    W: Float + Debug + Copy,
{
    let mut buf: Vec<OrderedFloat<W>> = values.iter().map(|&v| OrderedFloat(v)).collect();
    buf.sort_unstable();
    buf[buf.len() / 2].0
}

/// Deterministic linear-time pivot selection: partition into groups of five,
/// take each group's median, and iterate on the list of medians until at most
/// five values remain.
///
/// The returned value is always an element of `values`. Panics on empty input
/// (callers never split empty blocks).
pub fn median_of_medians<W>(values: &[W]) -> W
where
    W: Float + Debug + Copy,
{
    const GROUP: usize = 5;
    let mut current: Vec<W> = values.to_vec();
    loop {
        if current.len() <= GROUP {
            return small_median(&current);
        }
        let medians: Vec<W> = current.chunks(GROUP).map(small_median).collect();
        current = medians;
    }
}

/// Returns exactly the `lower_size` smallest values and the rest, in expected
/// linear time, by repeated three-way partitioning around a median-of-medians
/// pivot. Neither half is sorted.
pub fn partition_by_size<W>(values: &[W], lower_size: usize) -> Split<W>
where
    W: Float + Debug + Copy,
{
    let split = partition_pairs_by_size(
        values.iter().map(|&v| ((), v)).collect(),
        lower_size,
    );
    Split {
        lower: split.lower.into_iter().map(|(_, v)| v).collect(),
        higher: split.higher.into_iter().map(|(_, v)| v).collect(),
    }
}

/// Same contract as [`partition_by_size`] over key/value pairs keyed by
/// arbitrary identifiers, preserving identity and reporting the final pivot.
pub fn partition_pairs_by_size<K, W>(pairs: Vec<(K, W)>, lower_size: usize) -> PairSplit<K, W>
where
    K: Copy + Debug,
    W: Float + Debug + Copy,
{
    let lower_size = lower_size.min(pairs.len());
    let mut lower: Vec<(K, W)> = Vec::with_capacity(lower_size);
    let mut higher: Vec<(K, W)> = Vec::new();
    let mut current = pairs;
    let mut last_pivot: Option<W> = None;

    loop {
        if current.is_empty() {
            return PairSplit {
                pivot: last_pivot.unwrap_or_else(W::infinity),
                lower,
                higher,
            };
        }
        let values: Vec<W> = current.iter().map(|&(_, v)| v).collect();
        let pivot = median_of_medians(&values);
        last_pivot = Some(pivot);
        let p = OrderedFloat(pivot);

        let mut below = Vec::new();
        let mut at_pivot = Vec::new();
        let mut above = Vec::new();
        for (k, v) in current {
            match OrderedFloat(v).cmp(&p) {
                std::cmp::Ordering::Less => below.push((k, v)),
                std::cmp::Ordering::Greater => above.push((k, v)),
                std::cmp::Ordering::Equal => at_pivot.push((k, v)),
            }
        }

        let count_below = below.len() + lower.len();
        if lower_size < count_below {
            // Too many strictly-below values; everything at or above the
            // pivot is settled as higher.
            higher.extend(at_pivot);
            higher.extend(above);
            current = below;
        } else if lower_size > count_below + at_pivot.len() {
            // The entire below + pivot group fits in lower; keep narrowing
            // from the values above the pivot.
            lower.extend(below);
            lower.extend(at_pivot);
            current = above;
        } else {
            // The split point lands inside the pivot group.
            let take = lower_size - count_below;
            lower.extend(below);
            lower.extend(at_pivot.drain(..take));
            higher.extend(at_pivot);
            higher.extend(above);
            return PairSplit {
                lower,
                higher,
                pivot,
            };
        }
    }
}
