//! Caching of Hilbert lookup tables
//!
//! A table depends only on the curve order, so renders of the same dimension
//! share one immutable table behind an `Arc`. Small tables stay cached for the
//! life of the process; only the most recent table of order
//! [`LARGE_ORDER`] or above is kept.

use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::visualizer::hilbert::HilbertLookupTable;

/// Tables from this order up (2^24 entries, 64 MiB) are cached one at a time
pub const LARGE_ORDER: u32 = 12;

static TABLES: Lazy<Mutex<HashMap<u32, Arc<HilbertLookupTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide cache of lookup tables keyed by curve order
pub struct LookupCache;

impl LookupCache {
    fn tables() -> MutexGuard<'static, HashMap<u32, Arc<HilbertLookupTable>>> {
        // Tables are inserted whole, so a poisoned map is still consistent
        TABLES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the table for an order, building it on first use
    pub fn get_or_build(order: u32) -> Arc<HilbertLookupTable> {
        if let Some(table) = Self::tables().get(&order) {
            debug!("Hilbert table cache hit for order {}", order);
            return Arc::clone(table);
        }

        // Built outside the lock; the first table inserted for an order wins
        debug!("Hilbert table cache miss for order {}", order);
        let table = Arc::new(HilbertLookupTable::build(order));
        let mut tables = Self::tables();
        let table = Arc::clone(tables.entry(order).or_insert(table));
        if order >= LARGE_ORDER {
            evict_large_except(&mut tables, order);
        }
        table
    }

    /// Check whether a table for `order` is cached
    pub fn contains(order: u32) -> bool {
        Self::tables().contains_key(&order)
    }

    /// Drop the cached table for an order
    pub fn clear(order: u32) {
        if Self::tables().remove(&order).is_some() {
            debug!("Cleared Hilbert table for order {}", order);
        } else {
            debug!("No Hilbert table cached for order {}", order);
        }
    }

    /// Drop every cached table
    pub fn clear_all() {
        Self::tables().clear();
        debug!("Cleared all cached Hilbert tables");
    }
}

/// Drop every large table other than the one for `keep`
fn evict_large_except(tables: &mut HashMap<u32, Arc<HilbertLookupTable>>, keep: u32) {
    tables.retain(|&order, _| {
        let retained = order < LARGE_ORDER || order == keep;
        if !retained {
            debug!("Evicting Hilbert table of order {}", order);
        }
        retained
    });
}
