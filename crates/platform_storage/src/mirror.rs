//! Debounced spreadsheet mirror of the record sets.
//!
//! The mirror is derived and never authoritative: encoding or delivery failures are logged and
//! otherwise ignored, and nothing here touches the primary store.

use std::{rc::Rc, time::Duration};

use futures::{task::LocalSpawn, FutureExt};
use platform_host::{
    HostRecordStore, SharedDocumentBackend, CATEGORIES_KEY, CLIENTS_KEY, COMPANY_INFO_KEY,
    ESTIMATES_KEY, INVOICES_KEY, MIRROR_FILE_NAME, UNITS_KEY, WORK_ITEMS_KEY,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    facade::PersistenceFacade,
    schedule::{Debouncer, MirrorTimer},
    snapshot::{build_snapshot_document, MirrorSnapshot},
    workbook::encode_workbook,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Spreadsheet mirror settings.
pub struct MirrorConfig {
    /// File written inside the data directory or granted folder.
    pub file_name: String,
    /// Quiet window before a scheduled mirror runs.
    pub delay_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            file_name: MIRROR_FILE_NAME.to_string(),
            delay_ms: 1_000,
        }
    }
}

impl MirrorConfig {
    /// Default debounce delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

struct MirrorSink {
    host: Rc<dyn HostRecordStore>,
    directory: Rc<dyn SharedDocumentBackend>,
    file_name: String,
}

impl MirrorSink {
    async fn mirror_now(&self, snapshot: &MirrorSnapshot) -> bool {
        let bytes = match encode_workbook(&build_snapshot_document(snapshot)) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "spreadsheet mirror could not be encoded");
                return false;
            }
        };

        if self.host.is_available() {
            match self.host.write_binary(&self.file_name, &bytes).await {
                Ok(()) => {
                    debug!(file = %self.file_name, bytes = bytes.len(), "mirror written by host");
                    return true;
                }
                Err(err) => debug!(error = %err, "host mirror write failed"),
            }
        }

        let written = self.directory.write_binary(&self.file_name, &bytes).await;
        if written {
            debug!(file = %self.file_name, bytes = bytes.len(), "mirror written to granted folder");
        } else {
            debug!(file = %self.file_name, "no mirror destination accepted the write");
        }
        written
    }
}

/// Writes `latest.xlsx` snapshots through the host process or the granted folder.
pub struct MirrorExporter {
    sink: Rc<MirrorSink>,
    config: MirrorConfig,
    debouncer: Debouncer<MirrorSnapshot>,
}

impl MirrorExporter {
    /// Creates an exporter with [`MirrorConfig::default`].
    pub fn new(
        host: Rc<dyn HostRecordStore>,
        directory: Rc<dyn SharedDocumentBackend>,
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn MirrorTimer>,
    ) -> Self {
        Self::with_config(host, directory, spawner, timer, MirrorConfig::default())
    }

    /// Creates an exporter with explicit settings.
    pub fn with_config(
        host: Rc<dyn HostRecordStore>,
        directory: Rc<dyn SharedDocumentBackend>,
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn MirrorTimer>,
        config: MirrorConfig,
    ) -> Self {
        let sink = Rc::new(MirrorSink {
            host,
            directory,
            file_name: config.file_name.clone(),
        });
        let task_sink = Rc::clone(&sink);
        let debouncer = Debouncer::new(spawner, timer, move |snapshot: MirrorSnapshot| {
            let sink = Rc::clone(&task_sink);
            async move {
                sink.mirror_now(&snapshot).await;
            }
            .boxed_local()
        });
        Self {
            sink,
            config,
            debouncer,
        }
    }

    /// Creates an exporter delivering through the same backends as `facade`.
    pub fn for_facade(
        facade: &PersistenceFacade,
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn MirrorTimer>,
    ) -> Self {
        Self::new(
            Rc::clone(facade.host()),
            Rc::clone(facade.directory()),
            spawner,
            timer,
        )
    }

    /// Active settings.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Schedules a mirror of `snapshot` after the configured quiet window.
    pub fn schedule_mirror(&self, snapshot: MirrorSnapshot) {
        self.schedule_mirror_with_delay(snapshot, self.config.delay());
    }

    /// Replaces any pending mirror with `snapshot`, to run once `delay` passes without another
    /// call.
    pub fn schedule_mirror_with_delay(&self, snapshot: MirrorSnapshot, delay: Duration) {
        self.debouncer.schedule(snapshot, delay);
    }

    /// Drops the pending mirror, if any.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel();
    }

    /// Encodes and delivers `snapshot` immediately; `true` when some destination accepted it.
    pub async fn mirror_now(&self, snapshot: &MirrorSnapshot) -> bool {
        self.sink.mirror_now(snapshot).await
    }
}

/// Assembles a mirror snapshot from the record sets currently stored behind `facade`.
pub async fn load_mirror_snapshot(facade: &PersistenceFacade) -> MirrorSnapshot {
    MirrorSnapshot {
        company_info: facade.get_item(COMPANY_INFO_KEY, Value::Null).await,
        clients: facade.get_item(CLIENTS_KEY, Value::Null).await,
        work_items: facade.get_item(WORK_ITEMS_KEY, Value::Null).await,
        invoices: facade.get_item(INVOICES_KEY, Value::Null).await,
        estimates: facade.get_item(ESTIMATES_KEY, Value::Null).await,
        units: facade.get_item(UNITS_KEY, Value::Null).await,
        categories: facade.get_item(CATEGORIES_KEY, Value::Null).await,
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::{block_on, LocalPool};
    use platform_host::{
        MemoryCapabilityHandleStore, MemoryDirectoryAccess, MemoryDirectoryHandle,
        MemoryHostRecordStore, NoopHostRecordStore, NoopSharedDocumentBackend,
        SandboxedDirectoryBackend,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::schedule::{ManualTimer, NoopSpawner};

    fn snapshot(name: &str) -> MirrorSnapshot {
        MirrorSnapshot {
            clients: json!([{ "id": 1, "name": name }]),
            ..MirrorSnapshot::default()
        }
    }

    fn roster(count: usize) -> MirrorSnapshot {
        let clients = (0..count)
            .map(|id| json!({ "id": id, "name": format!("client {id}"), "phone": format!("010-{id:04}") }))
            .collect();
        MirrorSnapshot {
            clients: Value::Array(clients),
            ..MirrorSnapshot::default()
        }
    }

    fn encoded_len(snapshot: &MirrorSnapshot) -> usize {
        encode_workbook(&build_snapshot_document(snapshot))
            .expect("encode")
            .len()
    }

    #[test]
    fn config_defaults() {
        let config: MirrorConfig = serde_json::from_value(json!({})).expect("config");
        assert_eq!(config, MirrorConfig::default());
        assert_eq!(config.file_name, "latest.xlsx");
        assert_eq!(config.delay(), Duration::from_secs(1));
    }

    #[test]
    fn mirror_now_prefers_host() {
        let host = MemoryHostRecordStore::with_base_dir("/data");
        let exporter = MirrorExporter::new(
            Rc::new(host.clone()),
            Rc::new(NoopSharedDocumentBackend),
            Rc::new(NoopSpawner),
            Rc::new(ManualTimer::default()),
        );

        assert!(block_on(exporter.mirror_now(&snapshot("Kim"))));
        let bytes = host.binary_file("latest.xlsx").expect("mirror file");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn failing_host_falls_back_to_granted_folder() {
        let host = MemoryHostRecordStore::with_base_dir("/data");
        host.set_fail_writes(true);
        let access = MemoryDirectoryAccess::default();
        let folder = MemoryDirectoryHandle::new("exports");
        access.set_next_pick(Some(folder.clone()));
        let backend = SandboxedDirectoryBackend::new(
            access.clone(),
            MemoryCapabilityHandleStore::default(),
        );
        assert!(block_on(backend.choose_directory()).is_some());

        let exporter = MirrorExporter::new(
            Rc::new(host.clone()),
            Rc::new(backend),
            Rc::new(NoopSpawner),
            Rc::new(ManualTimer::default()),
        );

        assert!(block_on(exporter.mirror_now(&snapshot("Kim"))));
        assert_eq!(host.binary_write_count(), 0);
        assert!(access.file(&folder, "latest.xlsx").is_some());
    }

    #[test]
    fn no_destination_is_silent_false() {
        let exporter = MirrorExporter::new(
            Rc::new(NoopHostRecordStore),
            Rc::new(NoopSharedDocumentBackend),
            Rc::new(NoopSpawner),
            Rc::new(ManualTimer::default()),
        );
        assert!(!block_on(exporter.mirror_now(&MirrorSnapshot::default())));
    }

    #[test]
    fn scheduled_burst_writes_once() {
        let mut pool = LocalPool::new();
        let timer = ManualTimer::default();
        let host = MemoryHostRecordStore::with_base_dir("/data");
        let exporter = MirrorExporter::new(
            Rc::new(host.clone()),
            Rc::new(NoopSharedDocumentBackend),
            Rc::new(pool.spawner()),
            Rc::new(timer.clone()),
        );

        exporter.schedule_mirror(roster(300));
        exporter.schedule_mirror(roster(300));
        exporter.schedule_mirror(snapshot("s3"));
        pool.run_until_stalled();
        assert_eq!(host.binary_write_count(), 0);
        assert_eq!(timer.armed_delays(), vec![Duration::from_millis(1_000)]);

        timer.fire();
        pool.run_until_stalled();
        assert_eq!(host.binary_write_count(), 1);

        // Same shape as the last snapshot, far smaller than the earlier rosters.
        let written = host.binary_file("latest.xlsx").expect("mirror file").len();
        let last = encoded_len(&snapshot("s3"));
        let earlier = encoded_len(&roster(300));
        assert!(written.abs_diff(last) < 64, "written {written}, last {last}");
        assert!(written < earlier, "written {written}, earlier {earlier}");
    }

    #[test]
    fn cancel_pending_skips_write() {
        let mut pool = LocalPool::new();
        let timer = ManualTimer::default();
        let host = MemoryHostRecordStore::with_base_dir("/data");
        let exporter = MirrorExporter::new(
            Rc::new(host.clone()),
            Rc::new(NoopSharedDocumentBackend),
            Rc::new(pool.spawner()),
            Rc::new(timer.clone()),
        );

        exporter.schedule_mirror_with_delay(snapshot("s1"), Duration::from_millis(50));
        exporter.cancel_pending();
        pool.run_until_stalled();
        timer.fire();
        pool.run_until_stalled();
        assert_eq!(host.binary_write_count(), 0);
    }

    #[test]
    fn snapshot_loads_from_facade() {
        let host = MemoryHostRecordStore::with_base_dir("/data");
        let facade = PersistenceFacade::builder().host(Rc::new(host)).build();
        block_on(facade.set_value(CLIENTS_KEY, json!([{"id": 1}])));
        block_on(facade.set_value(UNITS_KEY, json!(["m2"])));

        let snapshot = block_on(load_mirror_snapshot(&facade));
        assert_eq!(snapshot.clients, json!([{"id": 1}]));
        assert_eq!(snapshot.units, json!(["m2"]));
        assert_eq!(snapshot.company_info, Value::Null);
    }
}
