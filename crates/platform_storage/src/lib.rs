//! Record persistence for the application: the facade every caller uses plus the spreadsheet mirror.
//!
//! [`PersistenceFacade`] hides which backend holds the records (desktop host process, browser
//! `localStorage`) and forwards writes into a user-granted folder when one is configured.
//! [`MirrorExporter`] keeps a debounced `latest.xlsx` snapshot next to the data. Browser builds
//! get both wired to the compile-time selected host strategy through [`browser_persistence`].
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use futures::executor::block_on;
//! use platform_storage::{MemoryEphemeralStore, NoopHostRecordStore, PersistenceFacade};
//! use serde_json::json;
//!
//! let facade = PersistenceFacade::builder()
//!     .host(Rc::new(NoopHostRecordStore))
//!     .ephemeral(Rc::new(MemoryEphemeralStore::default()))
//!     .build();
//!
//! block_on(facade.set_item("constructionApp_units", &["m2", "ea"]));
//! let units: Vec<String> = block_on(facade.get_item("constructionApp_units", Vec::new()));
//! assert_eq!(units, vec!["m2", "ea"]);
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod facade;
mod host_adapters;
mod mirror;
mod schedule;
mod snapshot;
mod workbook;

pub use facade::{MirroredWrite, PersistenceFacade, PersistenceFacadeBuilder};
#[cfg(target_arch = "wasm32")]
pub use host_adapters::{BrowserTimer, WasmSpawner};
pub use mirror::{load_mirror_snapshot, MirrorConfig, MirrorExporter};
pub use schedule::{Debouncer, ManualTimer, MirrorTimer, NoopSpawner, TimerFuture};
pub use snapshot::{
    build_snapshot_document, CellValue, MirrorSnapshot, SnapshotDocument, SnapshotSheet,
};
pub use workbook::encode_workbook;

pub use platform_host::{
    DirectoryInfo, EphemeralStore, HostRecordStore, MemoryEphemeralStore, MemoryHostRecordStore,
    NoopEphemeralStore, NoopHostRecordStore, NoopSharedDocumentBackend, SharedDocumentBackend,
    StorageError, CATEGORIES_KEY, CLIENTS_KEY, COMPANY_INFO_KEY, ESTIMATES_KEY, INVOICES_KEY,
    MIRROR_FILE_NAME, RECORD_SET_KEYS, STAMP_IMAGE_KEY, UNITS_KEY, WORK_ITEMS_KEY,
};
pub use platform_host_web::host_strategy_name;

/// Facade and mirror exporter sharing one set of browser backends.
pub struct BrowserPersistence {
    /// Record contract.
    pub facade: PersistenceFacade,
    /// Debounced spreadsheet mirror.
    pub mirror: MirrorExporter,
}

/// Wires the facade and mirror exporter to the adapters of the selected host strategy.
///
/// Off `wasm32` there is no local executor, so mirrored writes and scheduled mirrors are
/// dropped while direct calls still work.
pub fn browser_persistence() -> BrowserPersistence {
    let services = host_adapters::host_services();
    let spawner = host_adapters::local_spawner();
    let facade = PersistenceFacade::builder()
        .host(services.host)
        .ephemeral(services.ephemeral)
        .directory(services.directory)
        .spawner(std::rc::Rc::clone(&spawner))
        .build();
    let mirror = MirrorExporter::for_facade(&facade, spawner, host_adapters::mirror_timer());
    BrowserPersistence { facade, mirror }
}

impl BrowserPersistence {
    /// Reloads every mirrored record set and schedules a spreadsheet refresh.
    pub async fn refresh_mirror(&self) {
        let snapshot = load_mirror_snapshot(&self.facade).await;
        self.mirror.schedule_mirror(snapshot);
    }
}
