//! Record services
//!
//! [`RecordReader`] serves reads cache-aside; [`WriteCoordinator`] orders every
//! write store-first, cache-second. Both share one [`crate::cache::RecordCache`]
//! and one [`crate::store::RecordStore`] handle.

mod coordinator;
mod reader;

pub use coordinator::WriteCoordinator;
pub use reader::RecordReader;
