//! # Per-Entity Lock Registry
//!
//! Serializes mutations to a given product, account or supplier.
//!
//! ## Locking Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-Entity Locking                                   │
//! │                                                                         │
//! │  record_sale(product P, account A)     record_purchase(P, A, sup S)   │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  acquire([Product(P), Account(A)])     acquire([Product(P),            │
//! │       │                                     Account(A), Supplier(S)])  │
//! │       │                                     │                           │
//! │       └──────── both sort their keys ───────┘                          │
//! │                 into ONE global order                                   │
//! │                                                                         │
//! │  Cross-entity operations always acquire in ascending key order, so    │
//! │  two operations can never hold one lock each while waiting for the    │
//! │  other's - the classic deadlock cycle cannot form.                     │
//! │                                                                         │
//! │  Guards are RAII: released together when dropped, on success and on   │
//! │  failure paths alike.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

// =============================================================================
// Lock Keys
// =============================================================================

/// Which balance domain a lock belongs to.
///
/// The derive order here IS the global lock order (accounts before
/// products before suppliers, then by id). Do not reorder variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockDomain {
    Account,
    Product,
    Supplier,
}

/// Identity of a lockable entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    pub domain: LockDomain,
    pub id: String,
}

impl LockKey {
    pub fn account(id: impl Into<String>) -> Self {
        LockKey {
            domain: LockDomain::Account,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        LockKey {
            domain: LockDomain::Product,
            id: id.into(),
        }
    }

    pub fn supplier(id: impl Into<String>) -> Self {
        LockKey {
            domain: LockDomain::Supplier,
            id: id.into(),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Lazily-populated map of per-entity async mutexes.
///
/// Entries are created on first use and kept for the registry's lifetime;
/// a station's entity population (a handful of accounts, tanks and
/// suppliers) is small and stable.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for one entity, creating it on first use.
    async fn entry(&self, key: &LockKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    /// Acquires one entity lock.
    pub async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let entry = self.entry(&key).await;
        entry.lock_owned().await
    }

    /// Acquires a set of entity locks in the global order.
    ///
    /// Keys are sorted and deduplicated before acquisition; the registry
    /// map lock is NOT held while waiting on entity locks, so a long
    /// operation on one product never blocks lookups for another.
    pub async fn acquire_many(&self, mut keys: Vec<LockKey>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let entry = self.entry(&key).await;
            guards.push(entry.lock_owned().await);
        }
        guards
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lock_order_is_total() {
        let mut keys = vec![
            LockKey::supplier("s1"),
            LockKey::product("p2"),
            LockKey::account("a9"),
            LockKey::product("p1"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                LockKey::account("a9"),
                LockKey::product("p1"),
                LockKey::product("p2"),
                LockKey::supplier("s1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_same_key_serializes() {
        let registry = Arc::new(LockRegistry::new());

        let guard = registry.acquire(LockKey::product("p1")).await;

        let registry2 = registry.clone();
        let contender = tokio::spawn(async move {
            let _guard = registry2.acquire(LockKey::product("p1")).await;
        });

        // The contender cannot finish while the first guard is held
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_opposite_acquisition_orders_do_not_deadlock() {
        let registry = Arc::new(LockRegistry::new());

        let r1 = registry.clone();
        let t1 = tokio::spawn(async move {
            for _ in 0..100 {
                let _guards = r1
                    .acquire_many(vec![LockKey::account("a"), LockKey::supplier("s")])
                    .await;
            }
        });

        let r2 = registry.clone();
        let t2 = tokio::spawn(async move {
            for _ in 0..100 {
                // Caller passes keys in the opposite order; acquire_many
                // sorts them into the same global order
                let _guards = r2
                    .acquire_many(vec![LockKey::supplier("s"), LockKey::account("a")])
                    .await;
            }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            t1.await.unwrap();
            t2.await.unwrap();
        })
        .await
        .expect("lock ordering must prevent deadlock");
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_deduplicated() {
        let registry = LockRegistry::new();
        let guards = registry
            .acquire_many(vec![LockKey::product("p1"), LockKey::product("p1")])
            .await;
        // A duplicate would self-deadlock; dedup leaves one guard
        assert_eq!(guards.len(), 1);
    }
}
