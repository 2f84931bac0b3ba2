//! # Case Number Allocation
//!
//! Hands out per-year case numbers `1, 2, 3, ...` with no duplicates under
//! concurrent filing. The sequence for each year starts at 1 the first time
//! that year is seen.
//!
//! The atomicity lives in the [`CounterStore`]: `increment` must read,
//! add one, and persist as a single step. The allocator itself holds no
//! state and is safe to share across tasks.
//!
//! A number handed out here is never taken back. If the case that was
//! going to carry it fails to persist, the number is lost and a gap
//! appears in that year's sequence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use efile_core::{CaseNumber, FilingYear};

use crate::error::{RegistryError, StoreError};

/// Durable per-year counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically advance the counter for `year` and return the new value.
    ///
    /// A year that has never been seen starts at 0, so the first call
    /// returns 1.
    async fn increment(&self, year: FilingYear) -> Result<u32, StoreError>;

    /// Current value of the counter for `year` without advancing it.
    async fn current(&self, year: FilingYear) -> Result<u32, StoreError>;
}

/// Issues case numbers from a [`CounterStore`].
#[derive(Clone)]
pub struct CaseNumberAllocator {
    store: Arc<dyn CounterStore>,
}

impl std::fmt::Debug for CaseNumberAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseNumberAllocator").finish_non_exhaustive()
    }
}

impl CaseNumberAllocator {
    /// Wrap a counter store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Allocate the next case number for `year`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AllocationFailed`] if the counter could not be
    /// advanced or returned an impossible value. No number is issued in
    /// that case.
    pub async fn allocate(&self, year: FilingYear) -> Result<CaseNumber, RegistryError> {
        let sequence = self.store.increment(year).await.map_err(|e| {
            tracing::error!(year = year.value(), error = %e, "case number counter increment failed");
            RegistryError::AllocationFailed {
                year,
                reason: e.to_string(),
            }
        })?;

        let number = CaseNumber::new(year, sequence).map_err(|e| {
            RegistryError::AllocationFailed {
                year,
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(year = year.value(), case_number = %number, "allocated case number");
        Ok(number)
    }

    /// Last number issued for `year`, or 0 if none has been.
    pub async fn last_issued(&self, year: FilingYear) -> Result<u32, RegistryError> {
        Ok(self.store.current(year).await?)
    }
}

/// Process-local counters. Atomic within one process only.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<FilingYear, u32>>,
}

impl InMemoryCounterStore {
    /// Empty store; every year starts at 0.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, year: FilingYear) -> Result<u32, StoreError> {
        let mut counters = self.counters.lock();
        let slot = counters.entry(year).or_insert(0);
        *slot = slot
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt(format!("counter for {year} overflowed")))?;
        Ok(*slot)
    }

    async fn current(&self, year: FilingYear) -> Result<u32, StoreError> {
        Ok(self.counters.lock().get(&year).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn year(y: i64) -> FilingYear {
        FilingYear::new(y).unwrap()
    }

    struct FailingStore;

    #[async_trait]
    impl CounterStore for FailingStore {
        async fn increment(&self, _year: FilingYear) -> Result<u32, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn current(&self, _year: FilingYear) -> Result<u32, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn first_number_of_year_is_one() {
        let allocator = CaseNumberAllocator::new(Arc::new(InMemoryCounterStore::new()));
        let n = allocator.allocate(year(2024)).await.unwrap();
        assert_eq!(n.sequence, 1);
        assert_eq!(n.to_string(), "1/24");
    }

    #[tokio::test]
    async fn sequences_are_per_year() {
        let allocator = CaseNumberAllocator::new(Arc::new(InMemoryCounterStore::new()));
        let a = allocator.allocate(year(2024)).await.unwrap();
        let b = allocator.allocate(year(2024)).await.unwrap();
        let c = allocator.allocate(year(2025)).await.unwrap();
        assert_eq!(
            [a.to_string(), b.to_string(), c.to_string()],
            ["1/24", "2/24", "1/25"]
        );
        assert_eq!(allocator.last_issued(year(2024)).await.unwrap(), 2);
        assert_eq!(allocator.last_issued(year(2026)).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_allocations_are_unique_and_dense() {
        let allocator = Arc::new(CaseNumberAllocator::new(Arc::new(InMemoryCounterStore::new())));
        let mut handles = Vec::new();
        for _ in 0..100 {
            let allocator = Arc::clone(&allocator);
            handles.push(tokio::spawn(async move {
                allocator.allocate(year(2024)).await.unwrap().sequence
            }));
        }
        let mut seen = BTreeSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()), "duplicate sequence");
        }
        assert_eq!(seen, (1..=100).collect::<BTreeSet<u32>>());
    }

    #[tokio::test]
    async fn store_failure_issues_no_number() {
        let allocator = CaseNumberAllocator::new(Arc::new(FailingStore));
        let err = allocator.allocate(year(2024)).await.unwrap_err();
        assert!(matches!(err, RegistryError::AllocationFailed { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn zero_from_store_is_an_allocation_failure() {
        struct ZeroStore;

        #[async_trait]
        impl CounterStore for ZeroStore {
            async fn increment(&self, _year: FilingYear) -> Result<u32, StoreError> {
                Ok(0)
            }

            async fn current(&self, _year: FilingYear) -> Result<u32, StoreError> {
                Ok(0)
            }
        }

        let allocator = CaseNumberAllocator::new(Arc::new(ZeroStore));
        assert!(matches!(
            allocator.allocate(year(2024)).await,
            Err(RegistryError::AllocationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn clones_share_counters() {
        let a = CaseNumberAllocator::new(Arc::new(InMemoryCounterStore::new()));
        let b = a.clone();
        a.allocate(year(2024)).await.unwrap();
        assert_eq!(b.allocate(year(2024)).await.unwrap().sequence, 2);
    }
}
