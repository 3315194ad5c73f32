//! Host Process File Backend: durable per-key JSON records on local disk.
//!
//! Used by the privileged desktop process. Records live in one pretty-printed JSON file per key
//! under a runtime-mutable base directory, with the legacy all-keys `store.json` consulted on
//! read misses. Binary exports are replaced atomically through a temp file and rename.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod atomic;
pub mod bootstrap;
pub mod config;
pub mod store;

pub use bootstrap::{
    bootstrap_data_dir, bootstrap_from_candidates, default_candidates, select_writable,
    BootstrapOutcome, InitMarker, RejectedCandidate, DATA_DIR_ENV, INIT_MARKER_FILE,
};
pub use config::BaseDirConfig;
pub use store::FileRecordStore;
