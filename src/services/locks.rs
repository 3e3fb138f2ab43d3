use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::types::VehicleId;

/// In-process mutual exclusion keyed by vehicle.
///
/// Calls for different vehicles never contend; entries are dropped once no
/// caller holds or waits on them.
#[derive(Debug, Default)]
pub struct VehicleLocks {
    entries: Mutex<HashMap<VehicleId, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock of `vehicle_id`.
    pub fn serialize<T>(&self, vehicle_id: VehicleId, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(vehicle_id).or_default())
        };

        let result = {
            // Guarded state is `()`, so a poisoned lock is still usable.
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference lives in the map, the other is `entry`.
        if Arc::strong_count(&entry) == 2 {
            entries.remove(&vehicle_id);
        }
        result
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
