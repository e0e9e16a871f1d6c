//! Background tasks that run for the lifetime of the server.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
