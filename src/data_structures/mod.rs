pub mod bucket_queue;
pub mod heap_frontier;
pub mod ordered_index;
pub mod quickselect;
pub mod traits;

pub use bucket_queue::BucketQueue;
pub use heap_frontier::HeapFrontier;
pub use ordered_index::OrderedIndex;
pub use traits::Frontier;
