use std::collections::HashMap;
use std::fmt::Debug;

use num_traits::{Float, Zero};
use ordered_float::OrderedFloat;

use crate::data_structures::quickselect::{median_of_medians, partition_pairs_by_size};
use crate::data_structures::{Frontier, OrderedIndex};
use crate::{Error, Result};

/// Which chain a block belongs to: D0 holds batch-prepended blocks (logically
/// smaller than everything in D1), D1 holds individually inserted blocks
/// ordered by ascending upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Home {
    D0,
    D1,
}

/// One resident (key, value) pair, linked into its block's entry list.
#[derive(Debug, Clone)]
struct Entry<W> {
    key: usize,
    value: W,
    prev: Option<usize>,
    next: Option<usize>,
    block: usize,
}

/// A bounded group of entries sharing a common upper bound on their values.
#[derive(Debug, Clone)]
struct Block<W> {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    prev: Option<usize>,
    next: Option<usize>,
    bound: W,
    home: Home,
}

/// The BMSSP frontier structure from the bounded-multi-source recursion:
/// batched inserts, batched prepends of already-small values, and pulls of
/// the `subset_size` globally smallest keys with a certified lower bound on
/// the remainder.
///
/// Blocks and entries live in growable arenas addressed by integer index;
/// the block chains are index-based intrusive doubly linked lists, and D1
/// blocks are located through an [`OrderedIndex`] keyed by their upper
/// bounds. Each insert/split/delete is amortized O(log n); `pull` costs
/// O(M + log n) regardless of total frontier size.
#[derive(Debug)]
pub struct BucketQueue<W>
where
    W: Float + Zero + Debug + Copy,
{
    /// Maximum block size M; splits keep every block at or below it.
    subset_size: usize,
    /// How many keys a single `pull` may return.
    pull_size: usize,
    upper_bound: W,
    entries: Vec<Entry<W>>,
    free_entries: Vec<usize>,
    blocks: Vec<Block<W>>,
    free_blocks: Vec<usize>,
    /// Head of the D0 chain (most recently prepended block first).
    d0_head: Option<usize>,
    /// The permanent D1 block bound to `upper_bound`; survives even empty.
    sentinel: usize,
    /// Upper bound -> D1 block handle.
    index: OrderedIndex<OrderedFloat<W>, usize>,
    /// Key -> entry handle, for refresh semantics and membership checks.
    resident: HashMap<usize, usize>,
}

impl<W> BucketQueue<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn alloc_entry(&mut self, key: usize, value: W, block: usize) -> usize {
        let entry = Entry {
            key,
            value,
            prev: None,
            next: None,
            block,
        };
        match self.free_entries.pop() {
            Some(idx) => {
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        }
    }

    fn alloc_block(&mut self, bound: W, home: Home) -> usize {
        let block = Block {
            head: None,
            tail: None,
            len: 0,
            prev: None,
            next: None,
            bound,
            home,
        };
        match self.free_blocks.pop() {
            Some(idx) => {
                self.blocks[idx] = block;
                idx
            }
            None => {
                self.blocks.push(block);
                self.blocks.len() - 1
            }
        }
    }

    /// Appends a fresh entry at the tail of a block, registering residency.
    fn append_entry(&mut self, block: usize, key: usize, value: W) {
        let e = self.alloc_entry(key, value, block);
        let b = &mut self.blocks[block];
        match b.tail {
            Some(tail) => {
                b.tail = Some(e);
                b.len += 1;
                self.entries[e].prev = Some(tail);
                self.entries[tail].next = Some(e);
            }
            None => {
                b.head = Some(e);
                b.tail = Some(e);
                b.len = 1;
            }
        }
        self.resident.insert(key, e);
    }

    /// Unlinks an entry from its block without touching residency.
    fn unlink_entry(&mut self, e: usize) {
        let (prev, next, block) = {
            let entry = &self.entries[e];
            (entry.prev, entry.next, entry.block)
        };
        if let Some(p) = prev {
            self.entries[p].next = next;
        }
        if let Some(n) = next {
            self.entries[n].prev = prev;
        }
        let b = &mut self.blocks[block];
        if b.head == Some(e) {
            b.head = next;
        }
        if b.tail == Some(e) {
            b.tail = prev;
        }
        b.len -= 1;
    }

    /// Unlinks a block from its chain and returns its slot to the arena.
    /// The D1 sentinel is never retired.
    fn retire_block(&mut self, block: usize) -> Result<()> {
        let (prev, next, home, bound) = {
            let b = &self.blocks[block];
            (b.prev, b.next, b.home, b.bound)
        };
        if let Some(p) = prev {
            self.blocks[p].next = next;
        }
        if let Some(n) = next {
            self.blocks[n].prev = prev;
        }
        match home {
            Home::D0 => {
                if self.d0_head == Some(block) {
                    self.d0_head = next;
                }
            }
            Home::D1 => {
                if self.index.remove(&OrderedFloat(bound)) != Some(block) {
                    return Err(Error::Structural(
                        "D1 index entry does not match the retired block",
                    ));
                }
            }
        }
        self.free_blocks.push(block);
        Ok(())
    }

    /// Removes a key wherever it resides, cleaning up emptied blocks.
    fn delete(&mut self, key: usize) -> Result<()> {
        let e = self
            .resident
            .remove(&key)
            .ok_or(Error::Structural("deleting a key that is not resident"))?;
        let block = self.entries[e].block;
        self.unlink_entry(e);
        self.free_entries.push(e);
        if self.blocks[block].len == 0 && block != self.sentinel {
            self.retire_block(block)?;
        }
        Ok(())
    }

    /// Splits an oversized D1 block: members strictly below the median move
    /// into a new block chained just before it, registered under the median
    /// as its upper bound. Degenerate cases (median equal to the block's own
    /// bound, bound already taken, or nothing strictly below) skip the split;
    /// splitting is a size optimization, never required for correctness.
    fn split_block(&mut self, block: usize) -> Result<()> {
        let mut values = Vec::with_capacity(self.blocks[block].len);
        let mut cursor = self.blocks[block].head;
        while let Some(e) = cursor {
            values.push(self.entries[e].value);
            cursor = self.entries[e].next;
        }
        let median = median_of_medians(&values);
        if OrderedFloat(median) >= OrderedFloat(self.blocks[block].bound) {
            return Ok(());
        }
        if self.index.get(&OrderedFloat(median)).is_some() {
            return Ok(());
        }

        let new_block = self.alloc_block(median, Home::D1);
        // Chain the new block directly before the one being split
        let prev = self.blocks[block].prev;
        self.blocks[new_block].prev = prev;
        self.blocks[new_block].next = Some(block);
        if let Some(p) = prev {
            self.blocks[p].next = Some(new_block);
        }
        self.blocks[block].prev = Some(new_block);

        // Move everything strictly below the median, preserving order
        let mut cursor = self.blocks[block].head;
        let mut moved = 0usize;
        while let Some(e) = cursor {
            let next = self.entries[e].next;
            if OrderedFloat(self.entries[e].value) < OrderedFloat(median) {
                let (key, value) = (self.entries[e].key, self.entries[e].value);
                self.unlink_entry(e);
                self.free_entries.push(e);
                self.append_entry(new_block, key, value);
                moved += 1;
            }
            cursor = next;
        }

        if moved == 0 {
            // All members sit at or above the median; undo the chain edit
            let prev = self.blocks[new_block].prev;
            if let Some(p) = prev {
                self.blocks[p].next = Some(block);
            }
            self.blocks[block].prev = prev;
            self.free_blocks.push(new_block);
            return Ok(());
        }
        if self.blocks[block].len == 0 {
            return Err(Error::Structural("block empty after split"));
        }
        self.index.insert(OrderedFloat(median), new_block);
        Ok(())
    }

    /// Pushes a fresh block of pairs at the head of D0.
    fn prepend_block(&mut self, pairs: &[(usize, W)]) {
        let bound = pairs
            .iter()
            .map(|&(_, v)| OrderedFloat(v))
            .max()
            .map(|m| m.0)
            .unwrap_or(self.upper_bound);
        let block = self.alloc_block(bound, Home::D0);
        self.blocks[block].next = self.d0_head;
        if let Some(old) = self.d0_head {
            self.blocks[old].prev = Some(block);
        }
        self.d0_head = Some(block);
        for &(key, value) in pairs {
            self.append_entry(block, key, value);
        }
    }

    /// Walks a block chain from `start`, collecting whole blocks of
    /// candidate pairs until at least `want` keys are gathered or the chain
    /// is exhausted.
    fn collect_candidates(
        &self,
        start: Option<usize>,
        want: usize,
        out: &mut Vec<(usize, W)>,
    ) {
        let mut cursor = start;
        let mut collected = 0usize;
        while let Some(b) = cursor {
            if collected >= want {
                break;
            }
            let mut e = self.blocks[b].head;
            while let Some(idx) = e {
                out.push((self.entries[idx].key, self.entries[idx].value));
                collected += 1;
                e = self.entries[idx].next;
            }
            cursor = self.blocks[b].next;
        }
    }

    /// Smallest value in a block, if any.
    fn block_min(&self, block: usize) -> Option<W> {
        let mut best: Option<OrderedFloat<W>> = None;
        let mut e = self.blocks[block].head;
        while let Some(idx) = e {
            let v = OrderedFloat(self.entries[idx].value);
            best = Some(match best {
                Some(b) if b <= v => b,
                _ => v,
            });
            e = self.entries[idx].next;
        }
        best.map(|b| b.0)
    }

    /// Value currently recorded for a key, if resident. Exposed for tests
    /// and debugging.
    pub fn get(&self, key: &usize) -> Option<W> {
        self.resident.get(key).map(|&e| self.entries[e].value)
    }
}

impl<W> Frontier<W> for BucketQueue<W>
where
    W: Float + Zero + Debug + Copy,
{
    fn with_bound(subset_size: usize, upper_bound: W) -> Self {
        let mut queue = BucketQueue {
            subset_size: subset_size.max(2),
            pull_size: subset_size.max(1),
            upper_bound,
            entries: Vec::new(),
            free_entries: Vec::new(),
            blocks: Vec::new(),
            free_blocks: Vec::new(),
            d0_head: None,
            sentinel: 0,
            index: OrderedIndex::new(),
            resident: HashMap::new(),
        };
        // D1 always carries one block bound to B, so every legal value finds
        // a home via the ceiling query.
        queue.sentinel = queue.alloc_block(upper_bound, Home::D1);
        queue.index.insert(OrderedFloat(upper_bound), queue.sentinel);
        queue
    }

    fn insert_key_value(&mut self, key: usize, value: W) -> Result<()> {
        if let Some(&e) = self.resident.get(&key) {
            if OrderedFloat(self.entries[e].value) <= OrderedFloat(value) {
                return Ok(());
            }
            self.delete(key)?;
        }
        let (_, block) = self
            .index
            .ceiling(&OrderedFloat(value))
            .ok_or(Error::Structural("no D1 block at or above this value"))?;
        self.append_entry(block, key, value);
        if self.blocks[block].len > self.subset_size {
            self.split_block(block)?;
        }
        Ok(())
    }

    fn batch_prepend(&mut self, pairs: Vec<(usize, W)>) -> Result<()> {
        // Deduplicate by key, keeping the smallest value per key
        let mut best: HashMap<usize, W> = HashMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            match best.get(&key) {
                Some(&held) if OrderedFloat(held) <= OrderedFloat(value) => {}
                _ => {
                    best.insert(key, value);
                }
            }
        }
        // Keep-smallest against entries already resident
        let mut fresh: Vec<(usize, W)> = Vec::with_capacity(best.len());
        for (key, value) in best {
            if let Some(&e) = self.resident.get(&key) {
                if OrderedFloat(self.entries[e].value) <= OrderedFloat(value) {
                    continue;
                }
                self.delete(key)?;
            }
            fresh.push((key, value));
        }
        if fresh.is_empty() {
            return Ok(());
        }
        if fresh.len() <= self.subset_size {
            self.prepend_block(&fresh);
            return Ok(());
        }
        // Median-split into <=M groups; the lower half is pushed last so it
        // lands nearest the head of D0 and is pulled first.
        let mut stack = vec![fresh];
        while let Some(group) = stack.pop() {
            if group.len() <= self.subset_size {
                self.prepend_block(&group);
            } else {
                let half = group.len() / 2;
                let split = partition_pairs_by_size(group, half);
                stack.push(split.lower);
                stack.push(split.higher);
            }
        }
        Ok(())
    }

    fn pull(&mut self) -> Result<(W, Vec<usize>)> {
        let mut candidates: Vec<(usize, W)> = Vec::new();
        self.collect_candidates(self.d0_head, self.subset_size, &mut candidates);
        if let Some((_, min_block)) = self.index.min() {
            self.collect_candidates(Some(min_block), self.subset_size, &mut candidates);
        }

        let chosen: Vec<(usize, W)> = if candidates.len() > self.pull_size {
            partition_pairs_by_size(candidates, self.pull_size).lower
        } else {
            candidates
        };

        let mut subset = Vec::with_capacity(chosen.len());
        for (key, _) in chosen {
            self.delete(key)?;
            subset.push(key);
        }

        // Certified lower bound on what remains: the head D0 block holds the
        // smallest batch-prepended values, the D1 minimum block the smallest
        // inserted ones.
        let mut remaining_best = self.upper_bound;
        if let Some(head) = self.d0_head {
            if let Some(m) = self.block_min(head) {
                if OrderedFloat(m) < OrderedFloat(remaining_best) {
                    remaining_best = m;
                }
            }
        }
        if let Some((_, min_block)) = self.index.min() {
            if let Some(m) = self.block_min(min_block) {
                if OrderedFloat(m) < OrderedFloat(remaining_best) {
                    remaining_best = m;
                }
            }
        }
        Ok((remaining_best, subset))
    }

    fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    fn len(&self) -> usize {
        self.resident.len()
    }
}
