pub mod bmssp;
pub mod dijkstra;
pub mod solver;

pub use bmssp::RecursiveSolver;
pub use dijkstra::Dijkstra;
pub use solver::{Bmssp, Origin, SolveOptions, SolveReport};
