pub mod adjacency;
pub mod preprocess;

pub use adjacency::AdjacencyGraph;
pub use preprocess::{convert_back, preprocess, PreprocessedGraph, DEFAULT_PRECISION};
