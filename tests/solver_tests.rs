use bmssp::{AdjacencyGraph, Bmssp, Dijkstra, Error, HeapFrontier, Origin, SolveOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn graph_from_rows(rows: Vec<Vec<(usize, f64)>>) -> AdjacencyGraph<f64> {
    AdjacencyGraph::from_rows(rows).unwrap()
}

/// Random sparse digraph with integer weights; integer weights make solver
/// distances exact after truncation, so comparisons need no tolerance.
fn random_graph(rng: &mut StdRng, nodes: usize, edge_probability: f64) -> AdjacencyGraph<f64> {
    let mut rows = vec![Vec::new(); nodes];
    for from in 0..nodes {
        for to in 0..nodes {
            if from != to && rng.gen::<f64>() < edge_probability {
                rows[from].push((to, rng.gen_range(1..=10) as f64));
            }
        }
    }
    graph_from_rows(rows)
}

#[test]
fn solves_a_small_graph_from_one_origin() {
    let graph = graph_from_rows(vec![
        vec![(1, 1.0), (2, 1.0)],
        vec![(2, 1.0), (3, 3.0)],
        vec![(3, 1.0), (4, 2.0)],
        vec![(4, 2.0)],
        vec![],
    ]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, None).unwrap();
    assert_eq!(
        report.distance_matrix,
        vec![Some(0.0), Some(1.0), Some(1.0), Some(2.0), Some(3.0)]
    );
    assert_eq!(report.predecessor[0], None);
    assert_eq!(report.predecessor[3], Some(2));
    assert!(report.path.is_none());
}

#[test]
fn reconstructs_the_path_to_a_destination() {
    let graph = graph_from_rows(vec![
        vec![(1, 1.0), (2, 1.0)],
        vec![(2, 1.0), (3, 3.0)],
        vec![(3, 1.0), (4, 2.0)],
        vec![(4, 2.0)],
        vec![],
    ]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, Some(3)).unwrap();
    assert_eq!(report.path, Some(vec![0, 2, 3]));
    assert_eq!(report.length, Some(2.0));
    assert_eq!(report.destination, Some(3));
}

#[test]
fn destination_equal_to_origin_yields_trivial_path() {
    let graph = graph_from_rows(vec![vec![(1, 1.0)], vec![]]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, Some(0)).unwrap();
    assert_eq!(report.path, Some(vec![0]));
    assert_eq!(report.length, Some(0.0));
}

#[test]
fn two_node_graph() {
    let graph = graph_from_rows(vec![vec![(1, 1.0)], vec![]]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, None).unwrap();
    assert_eq!(report.distance_matrix, vec![Some(0.0), Some(1.0)]);
}

#[test]
fn zero_weight_chain_collapses_to_zero_distances() {
    let graph = graph_from_rows(vec![
        vec![(1, 0.0)],
        vec![(2, 0.0)],
        vec![(3, 0.0)],
        vec![],
    ]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, Some(3)).unwrap();
    assert_eq!(
        report.distance_matrix,
        vec![Some(0.0), Some(0.0), Some(0.0), Some(0.0)]
    );
    assert_eq!(report.path, Some(vec![0, 1, 2, 3]));
    assert_eq!(report.length, Some(0.0));
}

#[test]
fn unreachable_destination_is_an_error() {
    let graph = graph_from_rows(vec![vec![(1, 1.0)], vec![], vec![]]);
    let solver = Bmssp::new(&graph);
    assert!(matches!(
        solver.solve(0usize, Some(2)),
        Err(Error::UnreachableDestination(2))
    ));
    // Without a destination the same node just comes back unset
    let report = solver.solve(0usize, None).unwrap();
    assert_eq!(report.distance_matrix[2], None);
}

#[test]
fn rejects_out_of_range_queries() {
    let graph = graph_from_rows(vec![vec![(1, 1.0)], vec![]]);
    let solver = Bmssp::new(&graph);
    assert!(matches!(
        solver.solve(5usize, None),
        Err(Error::InvalidNode { node: 5, len: 2 })
    ));
    assert!(matches!(
        solver.solve(0usize, Some(9)),
        Err(Error::InvalidNode { node: 9, len: 2 })
    ));
    let empty: Origin = std::iter::empty::<usize>().collect();
    assert!(matches!(solver.solve(empty, None), Err(Error::EmptyOrigin)));
}

#[test]
fn multi_source_takes_the_nearest_origin() {
    // A path graph solved from both ends
    let graph = graph_from_rows(vec![
        vec![(1, 1.0)],
        vec![(2, 1.0)],
        vec![(3, 1.0)],
        vec![(4, 1.0)],
        vec![],
    ]);
    let solver = Bmssp::new(&graph);
    let origin: Origin = [0usize, 4].into_iter().collect();
    let report = solver.solve(origin, None).unwrap();
    assert_eq!(
        report.distance_matrix,
        vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(0.0)]
    );
    assert_eq!(report.predecessor[4], None);
}

#[test]
fn pivot_search_labels_still_reach_their_descendants() {
    // Interior chain nodes get their labels written during the pivot
    // relaxation without ever entering a frontier; they must be re-enqueued
    // when their predecessor finalizes, or everything downstream stays
    // unreachable.
    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); 10];
    for node in 0..9 {
        rows[node].push((node + 1, 1.0));
    }
    let graph = graph_from_rows(rows);
    let solver = Bmssp::new(&graph);
    let origin: Origin = [0usize, 9].into_iter().collect();
    let options = SolveOptions {
        pivot_relaxation_steps: Some(2),
        target_tree_depth: Some(2),
    };
    let report = solver
        .solve_with::<bmssp::BucketQueue<f64>>(origin, None, options)
        .unwrap();
    let expected: Vec<Option<f64>> = (0..9).map(|d| Some(d as f64)).chain([Some(0.0)]).collect();
    assert_eq!(report.distance_matrix, expected);
}

#[test]
fn tied_origins_at_the_batch_bound_are_not_dropped() {
    // Several origins share distance zero, which perturbation cannot split;
    // singleton pulls then return a batch bound equal to the pulled value,
    // and such members must still settle rather than leave every frontier.
    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); 8];
    for node in 0..7 {
        rows[node].push((node + 1, 1.0));
    }
    let graph = graph_from_rows(rows);
    let solver = Bmssp::new(&graph);
    let options = SolveOptions {
        pivot_relaxation_steps: Some(2),
        target_tree_depth: Some(2),
    };
    let expected = vec![
        Some(0.0),
        Some(1.0),
        Some(2.0),
        Some(0.0),
        Some(1.0),
        Some(2.0),
        Some(0.0),
        Some(1.0),
    ];

    let origin: Origin = [0usize, 3, 6].into_iter().collect();
    let bucket = solver
        .solve_with::<bmssp::BucketQueue<f64>>(origin.clone(), None, options.clone())
        .unwrap();
    assert_eq!(bucket.distance_matrix, expected);

    let heap = solver
        .solve_with::<HeapFrontier<f64>>(origin, None, options)
        .unwrap();
    assert_eq!(heap.distance_matrix, expected);
}

#[test]
fn hub_nodes_are_handled_transparently() {
    // Node 0 fans out to five targets and node 6 fans in from five sources;
    // both get split during preprocessing, which must not leak into results.
    let graph = graph_from_rows(vec![
        vec![(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0), (5, 5.0)],
        vec![(6, 5.0)],
        vec![(6, 4.0)],
        vec![(6, 3.0)],
        vec![(6, 2.0)],
        vec![(6, 1.0)],
        vec![],
    ]);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, Some(6)).unwrap();
    assert_eq!(report.length, Some(6.0));
    assert_eq!(report.distance_matrix.len(), 7);
    let path = report.path.unwrap();
    assert_eq!(*path.first().unwrap(), 0);
    assert_eq!(*path.last().unwrap(), 6);
    assert_eq!(path.len(), 3);
    // Every path hop is a real edge of the input graph
    for pair in path.windows(2) {
        assert!(graph.edge_weight(pair[0], pair[1]).is_some());
    }
}

#[test]
fn repeated_solves_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    let graph = random_graph(&mut rng, 40, 0.12);
    let solver = Bmssp::new(&graph);
    let first = solver.solve(0usize, None).unwrap();
    let second = solver.solve(0usize, None).unwrap();
    assert_eq!(first.distance_matrix, second.distance_matrix);
    assert_eq!(first.predecessor, second.predecessor);
}

#[test]
fn heap_frontier_agrees_with_bucket_queue() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..5 {
        let graph = random_graph(&mut rng, 35, 0.15);
        let solver = Bmssp::new(&graph);
        let bucket = solver.solve(0usize, None).unwrap();
        let heap = solver
            .solve_with::<HeapFrontier<f64>>(Origin::Single(0), None, SolveOptions::default())
            .unwrap();
        assert_eq!(bucket.distance_matrix, heap.distance_matrix);
    }
}

#[test]
fn forced_parameters_still_solve_correctly() {
    init_logs();
    let mut rng = StdRng::seed_from_u64(31);
    let graph = random_graph(&mut rng, 60, 0.1);
    let solver = Bmssp::new(&graph);
    let (expected, _) = Dijkstra::shortest_paths(&graph, &[0]).unwrap();
    // Small k and t force a deep recursion tree on a graph this size
    let options = SolveOptions {
        pivot_relaxation_steps: Some(2),
        target_tree_depth: Some(2),
    };
    let report = solver
        .solve_with::<bmssp::BucketQueue<f64>>(Origin::Single(0), None, options)
        .unwrap();
    assert_eq!(report.distance_matrix, expected);
}

#[test]
fn matches_dijkstra_on_random_graphs() {
    init_logs();
    let mut rng = StdRng::seed_from_u64(47);
    for round in 0..15 {
        let nodes = 20 + round * 4;
        let graph = random_graph(&mut rng, nodes, 0.15);
        let solver = Bmssp::new(&graph);
        let report = solver.solve(0usize, None).unwrap();
        let (expected, _) = Dijkstra::shortest_paths(&graph, &[0]).unwrap();
        assert_eq!(report.distance_matrix, expected, "round {}", round);
        // Predecessor edges must exist and be tight
        for (node, pred) in report.predecessor.iter().enumerate() {
            if let Some(p) = *pred {
                let weight = graph.edge_weight(p, node).unwrap();
                let expected_distance = report.distance_matrix[p].unwrap() + weight;
                assert_eq!(report.distance_matrix[node], Some(expected_distance));
            }
        }
    }
}

#[test]
fn multi_source_matches_dijkstra_on_random_graphs() {
    let mut rng = StdRng::seed_from_u64(53);
    for _ in 0..8 {
        let graph = random_graph(&mut rng, 45, 0.12);
        let origins = [0usize, 7, 21];
        let solver = Bmssp::new(&graph);
        let origin: Origin = origins.into_iter().collect();
        let report = solver.solve(origin, None).unwrap();
        let (expected, _) = Dijkstra::shortest_paths(&graph, &origins).unwrap();
        assert_eq!(report.distance_matrix, expected);
    }
}

#[test]
fn path_length_equals_sum_of_edge_weights() {
    let mut rng = StdRng::seed_from_u64(61);
    let graph = random_graph(&mut rng, 50, 0.2);
    let solver = Bmssp::new(&graph);
    let report = solver.solve(0usize, None).unwrap();
    // Pick the farthest reachable node as destination
    let destination = report
        .distance_matrix
        .iter()
        .enumerate()
        .filter_map(|(node, d)| d.map(|d| (node, d)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(node, _)| node)
        .unwrap();

    let report = solver.solve(0usize, Some(destination)).unwrap();
    let path = report.path.unwrap();
    let mut total = 0.0;
    for pair in path.windows(2) {
        total += graph.edge_weight(pair[0], pair[1]).unwrap();
    }
    assert_eq!(report.length, Some(total));
}
