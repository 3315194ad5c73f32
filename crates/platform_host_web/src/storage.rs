//! Browser storage adapters.

pub mod indexed_db;
pub mod local_records;
pub mod tauri_records;
