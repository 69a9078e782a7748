use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::event::NodeEvent;
use crate::node::NodeRecord;
use crate::registry::Registry;
use crate::GlobalId;

/// A [`Registry`] shared between a driver's population workers.
///
/// Writes are serialized behind the write lock. Readers never observe
/// a partially applied write: a node becomes visible only once its
/// insertion and all of its links have completed.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::new(Registry::with_config(config))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Registry>> {
        self.inner
            .read()
            .map_err(|_| RegistryError::InvariantViolation("registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Registry>> {
        self.inner
            .write()
            .map_err(|_| RegistryError::InvariantViolation("registry lock poisoned".to_string()))
    }

    /// Run `f` against a consistent view of the registry.
    pub fn with_read<R, F: FnOnce(&Registry) -> R>(&self, f: F) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    /// Run `f` with exclusive access, e.g. to apply several
    /// merge steps without other writers interleaving.
    pub fn with_write<R, F: FnOnce(&mut Registry) -> R>(&self, f: F) -> Result<R> {
        Ok(f(&mut *self.write()?))
    }

    /// Allocate a global id and insert the record built for it under
    /// one write lock, so no other writer can claim the position
    /// in between.
    pub fn insert_next<F: FnOnce(GlobalId) -> NodeRecord>(&self, make: F) -> Result<GlobalId> {
        self.write()?.insert_next(make)
    }

    pub fn link_child(&self, parent: GlobalId, child: GlobalId) -> Result<()> {
        self.write()?.link_child(parent, child)
    }

    pub fn finalize(&self, event: NodeEvent) -> Result<GlobalId> {
        self.write()?.finalize(event)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Recover the registry once every other handle has been dropped.
    pub fn into_inner(self) -> Option<Registry> {
        Arc::try_unwrap(self.inner)
            .ok()
            .and_then(|lock| lock.into_inner().ok())
    }
}
