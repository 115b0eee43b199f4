pub mod partition;
pub mod schema;

pub use partition::PartitionKey;
