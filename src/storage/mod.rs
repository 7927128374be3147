pub mod partitioner;
pub mod writer;

pub use partitioner::PartitionSelector;
pub use writer::{EventWriter, PartitionStats};
