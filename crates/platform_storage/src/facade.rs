//! Persistence facade: the record contract the rest of the application calls.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::{LocalSpawn, LocalSpawnExt},
    StreamExt,
};
use platform_host::{
    load_value_with, save_value_with, DirectoryInfo, EphemeralStore, HostRecordStore,
    NoopEphemeralStore, NoopHostRecordStore, NoopSharedDocumentBackend, SharedDocumentBackend,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
/// One `{key, value}` event forwarded to the shared-document mirror.
pub struct MirroredWrite {
    /// Record key.
    pub key: String,
    /// Value written to the primary store.
    pub value: Value,
}

/// Uniform `get_item`/`set_item` contract over the host, ephemeral and sandboxed backends.
///
/// Reads and writes go to the host process when its probe reports it reachable, otherwise to
/// the ephemeral store. Writes are additionally forwarded to the sandboxed shared document by a
/// background worker. No operation returns an error: failures surface as defaults, `false`
/// or `None`.
pub struct PersistenceFacade {
    host: Rc<dyn HostRecordStore>,
    ephemeral: Rc<dyn EphemeralStore>,
    directory: Rc<dyn SharedDocumentBackend>,
    mirror_writes: Option<UnboundedSender<MirroredWrite>>,
    // Keys whose latest write the host rejected; their current value lives in the ephemeral store.
    diverted: RefCell<HashSet<String>>,
}

/// Builder for [`PersistenceFacade`]; unset backends default to no-op adapters.
#[derive(Default)]
pub struct PersistenceFacadeBuilder {
    host: Option<Rc<dyn HostRecordStore>>,
    ephemeral: Option<Rc<dyn EphemeralStore>>,
    directory: Option<Rc<dyn SharedDocumentBackend>>,
    spawner: Option<Rc<dyn LocalSpawn>>,
}

impl PersistenceFacadeBuilder {
    /// Sets the host-process record store.
    pub fn host(mut self, host: Rc<dyn HostRecordStore>) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the ephemeral fallback store.
    pub fn ephemeral(mut self, ephemeral: Rc<dyn EphemeralStore>) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    /// Sets the sandboxed shared-document backend.
    pub fn directory(mut self, directory: Rc<dyn SharedDocumentBackend>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Sets the executor that runs the mirrored-write worker. Without one, writes are not mirrored.
    pub fn spawner(mut self, spawner: Rc<dyn LocalSpawn>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Builds the facade and spawns its mirrored-write worker.
    pub fn build(self) -> PersistenceFacade {
        let directory = self
            .directory
            .unwrap_or_else(|| Rc::new(NoopSharedDocumentBackend));
        let mirror_writes = self
            .spawner
            .and_then(|spawner| spawn_mirror_worker(spawner.as_ref(), Rc::clone(&directory)));

        PersistenceFacade {
            host: self.host.unwrap_or_else(|| Rc::new(NoopHostRecordStore)),
            ephemeral: self.ephemeral.unwrap_or_else(|| Rc::new(NoopEphemeralStore)),
            directory,
            mirror_writes,
            diverted: RefCell::default(),
        }
    }
}

fn spawn_mirror_worker(
    spawner: &dyn LocalSpawn,
    directory: Rc<dyn SharedDocumentBackend>,
) -> Option<UnboundedSender<MirroredWrite>> {
    let (sender, receiver) = mpsc::unbounded();
    match spawner.spawn_local(run_mirror_worker(receiver, directory)) {
        Ok(()) => Some(sender),
        Err(err) => {
            tracing::debug!(error = %err, "mirrored-write worker could not be spawned");
            None
        }
    }
}

async fn run_mirror_worker(
    mut receiver: UnboundedReceiver<MirroredWrite>,
    directory: Rc<dyn SharedDocumentBackend>,
) {
    while let Some(write) = receiver.next().await {
        if !directory.has_capability().await {
            tracing::debug!(key = %write.key, "no directory capability; mirrored write skipped");
            continue;
        }
        if !directory.merge_and_write(&write.key, &write.value).await {
            tracing::debug!(key = %write.key, "mirrored write failed");
        }
    }
}

impl PersistenceFacade {
    /// Starts a builder with no backends configured.
    pub fn builder() -> PersistenceFacadeBuilder {
        PersistenceFacadeBuilder::default()
    }

    /// Loads the raw value stored under `key`, or `None` when absent or unreadable.
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        if self.host.is_available() && !self.diverted.borrow().contains(key) {
            match self.host.read_record(key).await {
                Ok(value) => return value.filter(|value| !value.is_null()),
                Err(err) => {
                    tracing::warn!(key, error = %err, "host read failed; using ephemeral store");
                }
            }
        }

        if !self.ephemeral.is_available() {
            return None;
        }
        match load_value_with(self.ephemeral.as_ref(), key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "ephemeral read failed");
                None
            }
        }
    }

    /// Loads `key` decoded as `T`, returning `default` when absent, undecodable or unreadable.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.get_value(key).await else {
            return default;
        };
        match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!(key, error = %err, "stored value does not match requested type");
                default
            }
        }
    }

    /// Stores `value` under `key` in the primary backend and forwards it to the mirror.
    ///
    /// Returns whether the primary write succeeded.
    pub async fn set_value(&self, key: &str, value: Value) -> bool {
        let stored = self.write_primary(key, &value).await;
        self.dispatch_mirrored_write(key, value);
        stored
    }

    /// Serializes and stores `value` under `key`. Failures are logged and absorbed.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.set_value(key, value).await;
            }
            Err(err) => tracing::warn!(key, error = %err, "value could not be serialized"),
        }
    }

    async fn write_primary(&self, key: &str, value: &Value) -> bool {
        if self.host.is_available() {
            match self.host.write_record(key, value).await {
                Ok(()) => {
                    self.diverted.borrow_mut().remove(key);
                    return true;
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "host write failed; using ephemeral store");
                }
            }
        }

        if !self.ephemeral.is_available() {
            tracing::warn!(key, "no primary store reachable; value not persisted");
            return false;
        }
        match save_value_with(self.ephemeral.as_ref(), key, value) {
            Ok(()) => {
                if self.host.is_available() {
                    self.diverted.borrow_mut().insert(key.to_string());
                }
                true
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "ephemeral write failed");
                false
            }
        }
    }

    fn dispatch_mirrored_write(&self, key: &str, value: Value) {
        let Some(sender) = &self.mirror_writes else {
            return;
        };
        if !self.directory.is_supported() {
            return;
        }
        let write = MirroredWrite {
            key: key.to_string(),
            value,
        };
        if let Err(err) = sender.unbounded_send(write) {
            tracing::debug!(key, error = %err, "mirrored-write worker is gone");
        }
    }

    /// Runs the folder-selection flow; `true` when a read-write capability was persisted.
    pub async fn choose_browser_directory(&self) -> bool {
        self.directory.choose_directory().await
    }

    /// Label of the granted folder, `None` when unconfigured or no longer permitted.
    pub async fn get_browser_directory_info(&self) -> Option<DirectoryInfo> {
        self.directory.directory_info().await
    }

    /// Current host data directory, `None` without a reachable host.
    pub async fn host_base_dir(&self) -> Option<String> {
        if !self.host.is_available() {
            return None;
        }
        self.host
            .base_dir()
            .await
            .map_err(|err| tracing::debug!(error = %err, "host base dir unavailable"))
            .ok()
    }

    /// Lets the user pick a new host data directory; returns the directory now in effect.
    pub async fn choose_host_base_dir(&self) -> Option<String> {
        if !self.host.is_available() {
            return None;
        }
        self.host
            .choose_base_dir()
            .await
            .map_err(|err| tracing::warn!(error = %err, "host base dir selection failed"))
            .ok()
    }

    /// Collects the stored values of `keys` into one backup object, skipping absent keys.
    pub async fn export_records(&self, keys: &[&str]) -> Map<String, Value> {
        let mut backup = Map::new();
        for key in keys {
            if let Some(value) = self.get_value(key).await {
                backup.insert((*key).to_string(), value);
            }
        }
        backup
    }

    /// Restores every non-null entry of `backup`; returns how many were stored.
    pub async fn import_records(&self, backup: &Map<String, Value>) -> usize {
        let mut restored = 0;
        for (key, value) in backup {
            if value.is_null() {
                continue;
            }
            if self.set_value(key, value.clone()).await {
                restored += 1;
            }
        }
        restored
    }

    /// Returns `true` when the mirrored-write worker is running.
    pub fn mirrors_writes(&self) -> bool {
        self.mirror_writes
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Host-process record store in use.
    pub fn host(&self) -> &Rc<dyn HostRecordStore> {
        &self.host
    }

    /// Sandboxed shared-document backend in use.
    pub fn directory(&self) -> &Rc<dyn SharedDocumentBackend> {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::{block_on, LocalPool};
    use platform_host::{
        EphemeralStore, MemoryCapabilityHandleStore, MemoryDirectoryAccess, MemoryDirectoryHandle,
        MemoryEphemeralStore, MemoryHostRecordStore, PermissionMode, PermissionState,
        SandboxedDirectoryBackend, STORE_DOCUMENT_FILE,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn stores() -> (MemoryHostRecordStore, MemoryEphemeralStore) {
        (
            MemoryHostRecordStore::with_base_dir("/data"),
            MemoryEphemeralStore::default(),
        )
    }

    fn facade(host: &MemoryHostRecordStore, ephemeral: &MemoryEphemeralStore) -> PersistenceFacade {
        PersistenceFacade::builder()
            .host(Rc::new(host.clone()))
            .ephemeral(Rc::new(ephemeral.clone()))
            .build()
    }

    #[test]
    fn host_round_trip_bypasses_ephemeral() {
        let (host, ephemeral) = stores();
        let facade = facade(&host, &ephemeral);

        block_on(facade.set_item("clients", &json!([{"id": 1, "name": "Kim"}])));

        let clients: Value = block_on(facade.get_item("clients", json!([])));
        assert_eq!(clients, json!([{"id": 1, "name": "Kim"}]));
        assert_eq!(host.record("clients"), Some(json!([{"id": 1, "name": "Kim"}])));
        assert_eq!(ephemeral.load_raw("clients").expect("load"), None);
    }

    #[test]
    fn unavailable_host_uses_ephemeral_store() {
        let (host, ephemeral) = stores();
        host.set_available(false);
        let facade = facade(&host, &ephemeral);

        block_on(facade.set_item("units", &vec!["m2", "ea"]));

        let units: Vec<String> = block_on(facade.get_item("units", Vec::new()));
        assert_eq!(units, vec!["m2", "ea"]);
        assert_eq!(host.record("units"), None);
    }

    #[test]
    fn failing_host_write_falls_back_to_ephemeral() {
        let (host, ephemeral) = stores();
        host.set_fail_writes(true);
        let facade = facade(&host, &ephemeral);

        assert!(block_on(facade.set_value("units", json!(["m2"]))));
        assert_eq!(
            ephemeral.load_raw("units").expect("load").as_deref(),
            Some("[\"m2\"]")
        );
    }

    #[test]
    fn rejected_host_write_reads_back_the_new_value() {
        let (host, ephemeral) = stores();
        let facade = facade(&host, &ephemeral);
        assert!(block_on(facade.set_value("clients", json!(["v1"]))));

        host.set_fail_writes(true);
        assert!(block_on(facade.set_value("clients", json!(["v2"]))));
        let clients: Value = block_on(facade.get_item("clients", json!([])));
        assert_eq!(clients, json!(["v2"]));
        assert_eq!(host.record("clients"), Some(json!(["v1"])));

        host.set_fail_writes(false);
        assert!(block_on(facade.set_value("clients", json!(["v3"]))));
        let clients: Value = block_on(facade.get_item("clients", json!([])));
        assert_eq!(clients, json!(["v3"]));
        assert_eq!(host.record("clients"), Some(json!(["v3"])));
    }

    #[test]
    fn host_null_value_returns_default_without_fallback() {
        let (host, ephemeral) = stores();
        ephemeral.insert_raw("clients", "[1]");
        block_on(host.write_record("clients", &Value::Null)).expect("write");
        let facade = facade(&host, &ephemeral);

        let clients: Vec<u32> = block_on(facade.get_item("clients", vec![9]));
        assert_eq!(clients, vec![9]);
    }

    #[test]
    fn undecodable_and_corrupt_values_return_default() {
        let (host, ephemeral) = stores();
        host.set_available(false);
        ephemeral.insert_raw("broken", "{not json");
        ephemeral.insert_raw("typed", "\"text\"");
        let facade = facade(&host, &ephemeral);

        assert_eq!(block_on(facade.get_item("broken", 5_u32)), 5);
        assert_eq!(block_on(facade.get_item("typed", 5_u32)), 5);
        assert_eq!(block_on(facade.get_item("missing", 5_u32)), 5);
    }

    #[test]
    fn nothing_reachable_degrades_silently() {
        let facade = PersistenceFacade::builder().build();
        assert!(!block_on(facade.set_value("clients", json!([]))));
        assert_eq!(block_on(facade.get_item("clients", json!("default"))), json!("default"));
        assert_eq!(block_on(facade.host_base_dir()), None);
        assert!(!block_on(facade.choose_browser_directory()));
        assert_eq!(block_on(facade.get_browser_directory_info()), None);
        assert!(!facade.mirrors_writes());
    }

    #[test]
    fn host_base_dir_passthrough() {
        let (host, ephemeral) = stores();
        let facade = facade(&host, &ephemeral);
        assert_eq!(block_on(facade.host_base_dir()).as_deref(), Some("/data"));

        host.set_next_base_dir(Some("/elsewhere".to_string()));
        assert_eq!(
            block_on(facade.choose_host_base_dir()).as_deref(),
            Some("/elsewhere")
        );
        assert_eq!(block_on(facade.choose_host_base_dir()).as_deref(), Some("/elsewhere"));
    }

    #[test]
    fn export_then_import_restores_non_null_records() {
        let (host, ephemeral) = stores();
        let source = facade(&host, &ephemeral);
        block_on(source.set_value("clients", json!([{"id": 1}])));
        block_on(source.set_value("units", json!(["m2"])));
        let backup = block_on(source.export_records(&["clients", "units", "missing"]));
        assert_eq!(backup.len(), 2);

        let (target_host, target_ephemeral) = stores();
        let target = facade(&target_host, &target_ephemeral);
        let mut with_null = backup.clone();
        with_null.insert("categories".to_string(), Value::Null);

        assert_eq!(block_on(target.import_records(&with_null)), 2);
        assert_eq!(target_host.record("units"), Some(json!(["m2"])));
        assert_eq!(target_host.record("categories"), None);
    }

    #[test]
    fn writes_are_mirrored_into_shared_document_in_order() {
        let mut pool = LocalPool::new();
        let (host, ephemeral) = stores();
        let access = MemoryDirectoryAccess::default();
        let handles = MemoryCapabilityHandleStore::default();
        let folder = MemoryDirectoryHandle::new("exports");
        access.set_next_pick(Some(folder.clone()));
        let facade = PersistenceFacade::builder()
            .host(Rc::new(host.clone()))
            .ephemeral(Rc::new(ephemeral))
            .directory(Rc::new(SandboxedDirectoryBackend::new(
                access.clone(),
                handles,
            )))
            .spawner(Rc::new(pool.spawner()))
            .build();
        assert!(facade.mirrors_writes());

        assert!(pool.run_until(facade.choose_browser_directory()));
        pool.run_until(facade.set_item("clients", &json!([{"id": 1}])));
        pool.run_until(facade.set_item("units", &json!(["m2"])));
        pool.run_until(facade.set_item("clients", &json!([{"id": 2}])));
        pool.run_until_stalled();

        let document: Value = serde_json::from_slice(
            &access.file(&folder, STORE_DOCUMENT_FILE).expect("shared document"),
        )
        .expect("json");
        assert_eq!(document, json!({"clients": [{"id": 2}], "units": ["m2"]}));
        assert_eq!(host.record("clients"), Some(json!([{"id": 2}])));
    }

    #[test]
    fn mirror_failure_never_affects_primary_write() {
        let mut pool = LocalPool::new();
        let (host, ephemeral) = stores();
        let access = MemoryDirectoryAccess::default();
        let folder = MemoryDirectoryHandle::new("exports");
        access.set_next_pick(Some(folder.clone()));
        let facade = PersistenceFacade::builder()
            .host(Rc::new(host.clone()))
            .ephemeral(Rc::new(ephemeral))
            .directory(Rc::new(SandboxedDirectoryBackend::new(
                access.clone(),
                MemoryCapabilityHandleStore::default(),
            )))
            .spawner(Rc::new(pool.spawner()))
            .build();
        assert!(pool.run_until(facade.choose_browser_directory()));

        access.set_permission(PermissionState::Denied);
        access.set_request_outcome(PermissionState::Denied);
        assert!(pool.run_until(facade.set_value("clients", json!([1]))));
        pool.run_until_stalled();

        assert_eq!(host.record("clients"), Some(json!([1])));
        assert_eq!(access.file(&folder, STORE_DOCUMENT_FILE), None);

        access.set_permission(PermissionState::Granted(PermissionMode::ReadWrite));
        assert_eq!(
            pool.run_until(facade.get_browser_directory_info())
                .map(|info| info.name),
            Some("exports".to_string())
        );
    }

    #[test]
    fn no_capability_means_no_mirrored_write() {
        let mut pool = LocalPool::new();
        let (host, ephemeral) = stores();
        let access = MemoryDirectoryAccess::default();
        let facade = PersistenceFacade::builder()
            .host(Rc::new(host))
            .ephemeral(Rc::new(ephemeral))
            .directory(Rc::new(SandboxedDirectoryBackend::new(
                access.clone(),
                MemoryCapabilityHandleStore::default(),
            )))
            .spawner(Rc::new(pool.spawner()))
            .build();

        pool.run_until(facade.set_item("clients", &json!([])));
        pool.run_until_stalled();
        assert_eq!(access.request_count(), 0);
    }
}
