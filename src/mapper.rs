//! The mapping engine and its schema cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::record::Record;
use crate::schema::{self, RecordSchema, Slot, Slots};

/// Converts records to and from property maps, caching one schema per
/// record type for its own lifetime.
///
/// The cache is read-mostly: lookups of already-built schemas take only a
/// read lock and never serialize against each other. A miss takes the write
/// lock, re-checks for a racing builder, then constructs and publishes the
/// schema (nested types included) before releasing. Published schemas are
/// immutable and shared.
#[derive(Default)]
pub struct PropertyMapper {
    slots: RwLock<Slots>,
}

impl PropertyMapper {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The cached schema for `R`, building it on first use. Broken schemas
    /// are cached too; callers check `problem()` before using the tables.
    pub(crate) fn schema<R: Record>(&self) -> Arc<RecordSchema<R>> {
        {
            let slots = self.slots.read().expect("schema cache lock poisoned");
            if let Some(Slot::Ready(entry)) = slots.get(&TypeId::of::<R>()) {
                return entry
                    .clone()
                    .downcast::<RecordSchema<R>>()
                    .unwrap_or_else(|_| {
                        panic!("schema cache entry for {} has the wrong type", R::record_name())
                    });
            }
        }
        let mut slots = self.slots.write().expect("schema cache lock poisoned");
        // Collapse the race: another thread may have built it in between.
        if let Some(Slot::Ready(entry)) = slots.get(&TypeId::of::<R>()) {
            return entry
                .clone()
                .downcast::<RecordSchema<R>>()
                .unwrap_or_else(|_| {
                    panic!("schema cache entry for {} has the wrong type", R::record_name())
                });
        }
        schema::build_schema::<R>(&mut slots)
    }
}
