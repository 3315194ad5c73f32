//! In-memory directory capability adapters with scriptable permission behavior.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::directory::{
    CapabilityHandleStore, DirectoryAccess, DirectoryFuture, PermissionMode, PermissionState,
};
use crate::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Folder handle produced by [`MemoryDirectoryAccess`].
pub struct MemoryDirectoryHandle {
    /// Folder label.
    pub name: String,
}

impl MemoryDirectoryHandle {
    /// Creates a handle for a folder named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug)]
struct MemoryDirectoryState {
    supported: bool,
    next_pick: Option<MemoryDirectoryHandle>,
    permission: Option<PermissionMode>,
    denied: bool,
    request_outcome: PermissionState,
    request_count: usize,
    fail_writes: bool,
    files: HashMap<(String, String), Vec<u8>>,
}

impl Default for MemoryDirectoryState {
    fn default() -> Self {
        Self {
            supported: true,
            next_pick: None,
            permission: None,
            denied: false,
            request_outcome: PermissionState::Granted(PermissionMode::ReadWrite),
            request_count: 0,
            fail_writes: false,
            files: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Scriptable in-memory stand-in for a host folder picker and permission prompt.
///
/// One permission state applies to every handle. Requests resolve to the configured
/// outcome, which also becomes the new state (a user answering the prompt).
pub struct MemoryDirectoryAccess {
    inner: Rc<RefCell<MemoryDirectoryState>>,
}

impl MemoryDirectoryAccess {
    /// Toggles whether the host exposes directory primitives at all.
    pub fn set_supported(&self, supported: bool) {
        self.inner.borrow_mut().supported = supported;
    }

    /// Sets the folder the next picker call returns (`None` simulates cancel).
    pub fn set_next_pick(&self, handle: Option<MemoryDirectoryHandle>) {
        self.inner.borrow_mut().next_pick = handle;
    }

    /// Overrides the current permission state, as a host revoking or granting out-of-band.
    pub fn set_permission(&self, state: PermissionState) {
        let mut inner = self.inner.borrow_mut();
        apply_state(&mut inner, state);
    }

    /// Sets what a permission prompt resolves to.
    pub fn set_request_outcome(&self, state: PermissionState) {
        self.inner.borrow_mut().request_outcome = state;
    }

    /// Makes file writes fail with a host error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Number of permission prompts shown so far.
    pub fn request_count(&self) -> usize {
        self.inner.borrow().request_count
    }

    /// Raw file contents, bypassing permission checks.
    pub fn file(&self, handle: &MemoryDirectoryHandle, name: &str) -> Option<Vec<u8>> {
        self.inner
            .borrow()
            .files
            .get(&(handle.name.clone(), name.to_string()))
            .cloned()
    }

    /// Seeds raw file contents, bypassing permission checks.
    pub fn put_file(&self, handle: &MemoryDirectoryHandle, name: &str, bytes: &[u8]) {
        self.inner
            .borrow_mut()
            .files
            .insert((handle.name.clone(), name.to_string()), bytes.to_vec());
    }

    fn state_for(&self, mode: PermissionMode) -> PermissionState {
        let inner = self.inner.borrow();
        if inner.denied {
            return PermissionState::Denied;
        }
        match inner.permission {
            Some(granted) if granted.covers(mode) => PermissionState::Granted(mode),
            Some(granted) => PermissionState::Granted(granted),
            None => PermissionState::Unknown,
        }
    }

    fn require(&self, mode: PermissionMode) -> Result<(), StorageError> {
        if self.state_for(mode).allows(mode) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied { mode })
        }
    }
}

fn apply_state(inner: &mut MemoryDirectoryState, state: PermissionState) {
    match state {
        PermissionState::Granted(mode) => {
            inner.denied = false;
            inner.permission = Some(mode);
        }
        PermissionState::Denied => {
            inner.denied = true;
            inner.permission = None;
        }
        PermissionState::Unknown => {
            inner.denied = false;
            inner.permission = None;
        }
    }
}

impl DirectoryAccess for MemoryDirectoryAccess {
    type Handle = MemoryDirectoryHandle;

    fn is_supported(&self) -> bool {
        self.inner.borrow().supported
    }

    fn pick_directory<'a>(
        &'a self,
    ) -> DirectoryFuture<'a, Result<Option<Self::Handle>, StorageError>> {
        Box::pin(async move {
            if !self.is_supported() {
                return Err(StorageError::Unsupported("directory picker"));
            }
            Ok(self.inner.borrow_mut().next_pick.take())
        })
    }

    fn handle_name(&self, handle: &Self::Handle) -> String {
        handle.name.clone()
    }

    fn query_permission<'a>(
        &'a self,
        _handle: &'a Self::Handle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>> {
        Box::pin(async move { Ok(self.state_for(mode)) })
    }

    fn request_permission<'a>(
        &'a self,
        _handle: &'a Self::Handle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>> {
        Box::pin(async move {
            {
                let mut inner = self.inner.borrow_mut();
                inner.request_count += 1;
                let outcome = inner.request_outcome;
                apply_state(&mut inner, outcome);
            }
            Ok(self.state_for(mode))
        })
    }

    fn read_file<'a>(
        &'a self,
        handle: &'a Self::Handle,
        name: &'a str,
        create: bool,
    ) -> DirectoryFuture<'a, Result<Option<Vec<u8>>, StorageError>> {
        Box::pin(async move {
            self.require(PermissionMode::Read)?;
            let key = (handle.name.clone(), name.to_string());
            let mut inner = self.inner.borrow_mut();
            match inner.files.get(&key) {
                Some(bytes) => Ok(Some(bytes.clone())),
                None if create => {
                    inner.files.insert(key, Vec::new());
                    Ok(Some(Vec::new()))
                }
                None => Ok(None),
            }
        })
    }

    fn write_file<'a>(
        &'a self,
        handle: &'a Self::Handle,
        name: &'a str,
        bytes: &'a [u8],
    ) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.require(PermissionMode::ReadWrite)?;
            if self.inner.borrow().fail_writes {
                return Err(StorageError::Host("simulated write failure".to_string()));
            }
            self.put_file(handle, name, bytes);
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
/// In-memory capability handle persistence.
pub struct MemoryCapabilityHandleStore<H> {
    inner: Rc<RefCell<Option<H>>>,
}

impl<H> Default for MemoryCapabilityHandleStore<H> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(None)),
        }
    }
}

impl<H: Clone> MemoryCapabilityHandleStore<H> {
    /// Returns the persisted handle without going through the async contract.
    pub fn current(&self) -> Option<H> {
        self.inner.borrow().clone()
    }
}

impl<H: Clone + 'static> CapabilityHandleStore for MemoryCapabilityHandleStore<H> {
    type Handle = H;

    fn load_handle<'a>(&'a self) -> DirectoryFuture<'a, Result<Option<H>, StorageError>> {
        Box::pin(async move { Ok(self.inner.borrow().clone()) })
    }

    fn save_handle<'a>(&'a self, handle: &'a H) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            *self.inner.borrow_mut() = Some(handle.clone());
            Ok(())
        })
    }

    fn clear_handle<'a>(&'a self) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.inner.borrow_mut().take();
            Ok(())
        })
    }
}
