//! Storage contracts and the backend logic shared by every host.

pub mod directory;
pub mod ephemeral;
pub mod host_records;
pub mod memory_directory;
pub mod records;
pub mod sandboxed;
