use bmssp::{BucketQueue, Frontier, HeapFrontier};

fn pull_sorted<Q: Frontier<f64>>(queue: &mut Q) -> (f64, Vec<usize>) {
    let (bound, mut subset) = queue.pull().unwrap();
    subset.sort_unstable();
    (bound, subset)
}

#[test]
fn pulls_smallest_subset_with_certified_bound() {
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(2, 10.0);
    queue.insert_key_value(1, 3.0).unwrap();
    queue.insert_key_value(2, 1.0).unwrap();
    queue.insert_key_value(3, 2.0).unwrap();
    queue.insert_key_value(4, 5.0).unwrap();
    assert_eq!(queue.len(), 4);

    let (bound, subset) = pull_sorted(&mut queue);
    assert_eq!(subset, vec![2, 3]);
    assert_eq!(bound, 3.0);

    let (bound, subset) = pull_sorted(&mut queue);
    assert_eq!(subset, vec![1, 4]);
    assert_eq!(bound, 10.0);
    assert!(queue.is_empty());
}

#[test]
fn pull_on_empty_returns_upper_bound() {
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(4, 7.5);
    let (bound, subset) = queue.pull().unwrap();
    assert_eq!(bound, 7.5);
    assert!(subset.is_empty());
}

#[test]
fn insert_refreshes_to_the_smaller_value() {
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(2, 10.0);
    queue.insert_key_value(7, 5.0).unwrap();
    queue.insert_key_value(7, 2.0).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get(&7), Some(2.0));

    // A worse value must not displace the better one
    queue.insert_key_value(7, 8.0).unwrap();
    assert_eq!(queue.get(&7), Some(2.0));

    let (bound, subset) = queue.pull().unwrap();
    assert_eq!(subset, vec![7]);
    assert_eq!(bound, 10.0);
}

#[test]
fn batch_prepend_wins_the_next_pull() {
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(2, 100.0);
    for key in 0..6 {
        queue.insert_key_value(key, 50.0 + key as f64).unwrap();
    }
    queue
        .batch_prepend(vec![(10, 4.0), (11, 2.0), (12, 3.0), (13, 1.0), (14, 5.0)])
        .unwrap();

    let (bound, subset) = pull_sorted(&mut queue);
    assert_eq!(subset, vec![11, 13]);
    assert_eq!(bound, 3.0);

    let (bound, subset) = pull_sorted(&mut queue);
    assert_eq!(subset, vec![10, 12]);
    assert_eq!(bound, 5.0);

    // Prepended values exhausted; inserted ones come next
    let (bound, subset) = pull_sorted(&mut queue);
    assert_eq!(subset, vec![0, 14]);
    assert_eq!(bound, 51.0);
}

#[test]
fn batch_prepend_deduplicates_keeping_smallest() {
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(4, 100.0);
    queue.insert_key_value(1, 9.0).unwrap();
    queue
        .batch_prepend(vec![(1, 6.0), (1, 4.0), (2, 5.0), (2, 7.0)])
        .unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.get(&1), Some(4.0));
    assert_eq!(queue.get(&2), Some(5.0));

    // A resident smaller value survives a larger prepend
    queue.batch_prepend(vec![(2, 6.5)]).unwrap();
    assert_eq!(queue.get(&2), Some(5.0));
}

#[test]
fn many_inserts_stay_ordered_across_block_splits() {
    // Enough keys to force repeated splits of the D1 sentinel block
    let mut queue: BucketQueue<f64> = BucketQueue::with_bound(3, 1000.0);
    for key in 0..200usize {
        // Scatter values so consecutive inserts land far apart
        let value = ((key * 73) % 199) as f64;
        queue.insert_key_value(key, value).unwrap();
    }

    let mut previous_max = f64::NEG_INFINITY;
    let mut drained = 0usize;
    while !queue.is_empty() {
        let (bound, subset) = queue.pull().unwrap();
        for &key in &subset {
            let value = ((key * 73) % 199) as f64;
            assert!(value >= previous_max - 1e-12);
            assert!(value <= bound);
        }
        previous_max = subset
            .iter()
            .map(|&key| ((key * 73) % 199) as f64)
            .fold(previous_max, f64::max);
        drained += subset.len();
    }
    assert_eq!(drained, 200);
}

// The heap frontier is the semantic reference: for any legal operation
// sequence both implementations must pull the same key sets and certify the
// same remaining bounds.
#[test]
fn matches_heap_frontier_on_mixed_operations() {
    struct Feeder {
        bucket: BucketQueue<f64>,
        heap: HeapFrontier<f64>,
        value: f64,
        next_key: usize,
    }

    impl Feeder {
        // Strictly decreasing values keep every wave legal for batch_prepend
        fn fresh_pairs(&mut self, count: usize) -> Vec<(usize, f64)> {
            let mut pairs = Vec::with_capacity(count);
            for _ in 0..count {
                self.value -= 0.625;
                pairs.push((self.next_key, self.value));
                self.next_key += 1;
            }
            pairs
        }

        fn insert_wave(&mut self, count: usize) {
            for (key, value) in self.fresh_pairs(count) {
                self.bucket.insert_key_value(key, value).unwrap();
                self.heap.insert_key_value(key, value).unwrap();
            }
        }

        fn prepend_wave(&mut self, count: usize) {
            let pairs = self.fresh_pairs(count);
            self.bucket.batch_prepend(pairs.clone()).unwrap();
            self.heap.batch_prepend(pairs).unwrap();
        }
    }

    let mut feeder = Feeder {
        bucket: BucketQueue::with_bound(3, 500.0),
        heap: HeapFrontier::with_bound(3, 500.0),
        value: 400.0,
        next_key: 0,
    };

    feeder.insert_wave(17);
    for _ in 0..3 {
        assert_eq!(pull_sorted(&mut feeder.bucket), pull_sorted(&mut feeder.heap));
    }

    feeder.prepend_wave(11);
    for _ in 0..2 {
        assert_eq!(pull_sorted(&mut feeder.bucket), pull_sorted(&mut feeder.heap));
    }
    feeder.prepend_wave(5);

    let Feeder {
        mut bucket,
        mut heap,
        ..
    } = feeder;
    while !bucket.is_empty() || !heap.is_empty() {
        assert_eq!(pull_sorted(&mut bucket), pull_sorted(&mut heap));
    }
    assert!(bucket.is_empty() && heap.is_empty());
}
