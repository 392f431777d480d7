use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tagflash_store::{StoreError, ValueStore};
use tagflash_types::BuildingType;
use tracing::{debug, info};

use crate::entry::{ConfigEntry, Resolution};
use crate::error::ResolveResult;

/// Prefix of every override key in the value store.
pub const OVERRIDE_KEY_PREFIX: &str = "config_value_";

/// Store key holding the override for `building`, e.g. `config_value_FARM`.
pub fn override_key(building: BuildingType) -> String {
    format!("{OVERRIDE_KEY_PREFIX}{}", building.name())
}

/// Combines catalogue defaults with persisted overrides.
///
/// Mutations are serialized by a resolver-wide lock, and the multi-key
/// reads (`resolve_byte`, `entries`, `overrides`) take the same lock so
/// they never observe a half-applied `reset_all`.
pub struct ValueResolver<S> {
    store: S,
    mutation: Mutex<()>,
}

impl<S: ValueStore> ValueResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mutation: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> ResolveResult<MutexGuard<'_, ()>> {
        Ok(self.mutation.lock().map_err(|_| StoreError::LockPoisoned)?)
    }

    /// The persisted override for `building`, if any.
    pub fn override_value(&self, building: BuildingType) -> ResolveResult<Option<u8>> {
        let key = override_key(building);
        match self.store.get_int(&key)? {
            None => Ok(None),
            Some(raw) => match u8::try_from(raw) {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(StoreError::CorruptValue { key, value: raw }.into()),
            },
        }
    }

    /// Override if present, otherwise the catalogue default.
    pub fn effective_value(&self, building: BuildingType) -> ResolveResult<u8> {
        Ok(self
            .override_value(building)?
            .unwrap_or_else(|| building.default_value()))
    }

    /// Persist an override. A value equal to the default still counts as
    /// overridden.
    pub fn set_override(&self, building: BuildingType, value: u8) -> ResolveResult<()> {
        let _guard = self.lock()?;
        self.store.put_int(&override_key(building), i64::from(value))?;
        info!(building = %building, value, "override set");
        Ok(())
    }

    /// Remove the override for `building`. Idempotent.
    pub fn reset_override(&self, building: BuildingType) -> ResolveResult<()> {
        let _guard = self.lock()?;
        let existed = self.store.remove(&override_key(building))?;
        debug!(building = %building, existed, "override reset");
        Ok(())
    }

    /// Remove the override of every catalogue type. Keys outside the
    /// catalogue are left alone.
    pub fn reset_all(&self) -> ResolveResult<()> {
        let _guard = self.lock()?;
        let keys: Vec<String> = BuildingType::all()
            .iter()
            .map(|t| override_key(*t))
            .collect();
        let removed = self.store.remove_batch(&keys)?;
        info!(removed, "all overrides reset");
        Ok(())
    }

    /// Map a byte read from a tag back to a building type.
    ///
    /// Scans the catalogue in declaration order and returns the first type
    /// whose effective value equals `value`.
    pub fn resolve_byte(&self, value: u8) -> ResolveResult<Resolution> {
        let _guard = self.lock()?;
        for building in BuildingType::all() {
            if self.effective_value(*building)? == value {
                return Ok(Resolution::Known(*building));
            }
        }
        Ok(Resolution::Unknown(value))
    }

    /// Configuration snapshot of every type, in catalogue order.
    pub fn entries(&self) -> ResolveResult<Vec<ConfigEntry>> {
        let _guard = self.lock()?;
        BuildingType::all()
            .iter()
            .map(|building| {
                let custom = self.override_value(*building)?;
                Ok(ConfigEntry {
                    building: *building,
                    effective: custom.unwrap_or_else(|| building.default_value()),
                    default: building.default_value(),
                    overridden: custom.is_some(),
                })
            })
            .collect()
    }

    /// All currently set overrides.
    pub fn overrides(&self) -> ResolveResult<BTreeMap<BuildingType, u8>> {
        let _guard = self.lock()?;
        let mut out = BTreeMap::new();
        for building in BuildingType::all() {
            if let Some(value) = self.override_value(*building)? {
                out.insert(*building, value);
            }
        }
        Ok(out)
    }
}

impl<S> std::fmt::Debug for ValueResolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueResolver").finish_non_exhaustive()
    }
}
