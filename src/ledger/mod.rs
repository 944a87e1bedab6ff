//! Append-only WAL ledger: the mandatory, synchronous write path every
//! signal goes through before any hot-path delivery is attempted.

mod frame;
mod lifecycle;
mod partition;
mod reader;
mod writer;

pub use frame::frame_size;
pub use lifecycle::{LifecycleManager, LifecycleReport};
pub use partition::Tier;
pub use reader::{iter_partitions, iter_records, tail, PartitionInfo};
pub use writer::LedgerWriter;
