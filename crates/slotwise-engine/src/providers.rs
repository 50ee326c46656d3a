//! Provider directory — identity and active flag.
//!
//! Providers are referenced, not owned, by the registries and the ledger.
//! The directory answers "does this provider exist?" and "may it still take
//! bookings?". Deactivating a provider closes its calendar to new bookings
//! without touching existing appointments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::ProviderId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub active: bool,
}

/// In-memory provider directory. Thread-safe via internal `RwLock`.
#[derive(Debug)]
pub struct ProviderDirectory {
    providers: RwLock<HashMap<ProviderId, Provider>>,
    next_id: AtomicU64,
}

impl Default for ProviderDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDirectory {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new active provider and return its id.
    pub fn register(&self, name: impl Into<String>) -> ProviderId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let provider = Provider {
            id,
            name: name.into(),
            active: true,
        };
        self.providers.write().unwrap().insert(id, provider);
        id
    }

    /// Insert a provider with a caller-chosen id, e.g. when loading a
    /// persisted schedule document. Replaces any existing entry.
    pub fn insert(&self, provider: Provider) {
        self.next_id.fetch_max(provider.id + 1, Ordering::Relaxed);
        self.providers
            .write()
            .unwrap()
            .insert(provider.id, provider);
    }

    pub fn get(&self, id: ProviderId) -> Option<Provider> {
        self.providers.read().unwrap().get(&id).cloned()
    }

    /// Look up a provider, failing with `NotFound` for unknown ids.
    pub fn require(&self, id: ProviderId) -> Result<Provider> {
        self.get(id)
            .ok_or_else(|| EngineError::NotFound(format!("provider {}", id)))
    }

    /// Mark a provider inactive. Existing appointments are unaffected; new
    /// bookings are rejected and its days read as closed.
    pub fn deactivate(&self, id: ProviderId) -> Result<()> {
        let mut providers = self.providers.write().unwrap();
        match providers.get_mut(&id) {
            Some(provider) => {
                provider.active = false;
                Ok(())
            }
            None => Err(EngineError::NotFound(format!("provider {}", id))),
        }
    }
}
