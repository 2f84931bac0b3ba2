//! # Case Repository
//!
//! Durable storage for [`Case`] records, keyed by [`CaseId`] with a unique
//! index on [`CaseNumber`]. Cases are created once and afterwards only
//! advanced through [`CaseRepository::conditional_update`], which applies a
//! [`StagePatch`] only if the stored version still equals the version the
//! caller read.
//!
//! Implementations must make each call all-or-nothing: a caller dropping
//! the future mid-call must never leave a partially written case visible.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use efile_core::{AdvocateId, CaseId, CaseNumber, CourtStationId};

use crate::case::{Case, StagePatch};
use crate::error::{RegistryError, StoreError};

/// Persistent store of cases.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Fetch a case by id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no case has this id.
    async fn get(&self, id: &CaseId) -> Result<Case, RegistryError>;

    /// Persist a newly filed case.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the id or case number is already taken.
    async fn create(&self, case: Case) -> Result<Case, RegistryError>;

    /// Apply `patch` if the stored version equals `expected_version`.
    ///
    /// Returns the case as written, with its version advanced by one.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the case does not exist.
    /// - [`RegistryError::ConcurrentModification`] if the stored version
    ///   differs from `expected_version`.
    /// - [`RegistryError::InvalidTransition`] if the patch does not fit the
    ///   stored stage.
    async fn conditional_update(
        &self,
        id: &CaseId,
        expected_version: u64,
        patch: StagePatch,
    ) -> Result<Case, RegistryError>;

    /// Cases filed by an advocate, newest first.
    async fn list_by_advocate(&self, advocate: &AdvocateId) -> Result<Vec<Case>, RegistryError>;

    /// Cases filed at a court station, newest first.
    async fn list_by_court_station(
        &self,
        station: &CourtStationId,
    ) -> Result<Vec<Case>, RegistryError>;

    /// Look a case up by its number.
    async fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, RegistryError>;
}

/// Sort order for listings: newest filing first, case number breaking ties.
pub fn newest_first(cases: &mut [Case]) {
    cases.sort_by(|a, b| {
        b.filing
            .filed_at
            .cmp(&a.filing.filed_at)
            .then_with(|| b.case_number.cmp(&a.case_number))
    });
}

#[derive(Debug, Default)]
struct Tables {
    cases: HashMap<CaseId, Case>,
    by_number: HashMap<CaseNumber, CaseId>,
}

/// Process-local repository.
///
/// Both maps sit behind one lock so the version check, the stage write and
/// the number index can never disagree. The guard is never held across an
/// `.await`.
#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    tables: RwLock<Tables>,
}

impl InMemoryCaseRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cases.
    pub fn len(&self) -> usize {
        self.tables.read().cases.len()
    }

    /// Whether the repository holds no cases.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_where(&self, keep: impl Fn(&Case) -> bool) -> Vec<Case> {
        let mut cases: Vec<Case> = self
            .tables
            .read()
            .cases
            .values()
            .filter(|c| keep(c))
            .cloned()
            .collect();
        newest_first(&mut cases);
        cases
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn get(&self, id: &CaseId) -> Result<Case, RegistryError> {
        self.tables
            .read()
            .cases
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::case_not_found(id))
    }

    async fn create(&self, case: Case) -> Result<Case, RegistryError> {
        let mut tables = self.tables.write();
        if tables.cases.contains_key(&case.id) {
            return Err(StoreError::Conflict(format!("case {} already exists", case.id)).into());
        }
        if tables.by_number.contains_key(&case.case_number) {
            return Err(StoreError::Conflict(format!(
                "case number {} already assigned",
                case.case_number
            ))
            .into());
        }
        tables.by_number.insert(case.case_number, case.id);
        tables.cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn conditional_update(
        &self,
        id: &CaseId,
        expected_version: u64,
        patch: StagePatch,
    ) -> Result<Case, RegistryError> {
        let mut tables = self.tables.write();
        let stored = tables
            .cases
            .get_mut(id)
            .ok_or_else(|| RegistryError::case_not_found(id))?;
        if stored.version != expected_version {
            return Err(RegistryError::ConcurrentModification {
                case_id: *id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        let mut next = stored.clone();
        next.apply(patch)?;
        *stored = next.clone();
        Ok(next)
    }

    async fn list_by_advocate(&self, advocate: &AdvocateId) -> Result<Vec<Case>, RegistryError> {
        Ok(self.list_where(|c| c.filing.advocate == *advocate))
    }

    async fn list_by_court_station(
        &self,
        station: &CourtStationId,
    ) -> Result<Vec<Case>, RegistryError> {
        Ok(self.list_where(|c| c.filing.court_station == *station))
    }

    async fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, RegistryError> {
        let tables = self.tables.read();
        Ok(tables
            .by_number
            .get(number)
            .and_then(|id| tables.cases.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::tests::{filed_at, sample_case};
    use crate::case::CaseStage;
    use chrono::Duration;
    use efile_core::FilingYear;

    fn number(seq: u32) -> CaseNumber {
        CaseNumber::new(FilingYear::new(2024).unwrap(), seq).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let repo = InMemoryCaseRepository::new();
        let case = sample_case();
        repo.create(case.clone()).await.unwrap();
        assert_eq!(repo.get(&case.id).await.unwrap(), case);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let repo = InMemoryCaseRepository::new();
        let err = repo.get(&CaseId::new()).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { kind: "case", .. }));
    }

    #[tokio::test]
    async fn duplicate_case_number_conflicts() {
        let repo = InMemoryCaseRepository::new();
        let first = sample_case();
        let mut second = sample_case();
        second.case_number = first.case_number;
        repo.create(first).await.unwrap();
        let err = repo.create(second).await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(StoreError::Conflict(_))));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let repo = InMemoryCaseRepository::new();
        let first = sample_case();
        let mut second = first.clone();
        second.case_number = number(2);
        repo.create(first).await.unwrap();
        assert!(matches!(
            repo.create(second).await,
            Err(RegistryError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn conditional_update_advances_version() {
        let repo = InMemoryCaseRepository::new();
        let case = repo.create(sample_case()).await.unwrap();
        let patch = case.plan_service("served".into(), filed_at()).unwrap();
        let updated = repo.conditional_update(&case.id, 1, patch).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.stage, CaseStage::Served);
        assert_eq!(repo.get(&case.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_writing() {
        let repo = InMemoryCaseRepository::new();
        let case = repo.create(sample_case()).await.unwrap();
        let patch = case.plan_service("served".into(), filed_at()).unwrap();
        repo.conditional_update(&case.id, 1, patch.clone())
            .await
            .unwrap();

        let err = repo
            .conditional_update(&case.id, 1, patch)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConcurrentModification {
                case_id: case.id,
                expected: 1,
                actual: 2,
            }
        );
        assert_eq!(repo.get(&case.id).await.unwrap().transition_log.len(), 1);
    }

    #[tokio::test]
    async fn mismatched_patch_leaves_case_untouched() {
        let repo = InMemoryCaseRepository::new();
        let case = repo.create(sample_case()).await.unwrap();
        let served = {
            let mut c = case.clone();
            c.apply(case.plan_service("s".into(), filed_at()).unwrap())
                .unwrap();
            c
        };
        let verdict = {
            let mut c = served.clone();
            c.apply(
                served
                    .plan_hearing(filed_at(), "J".into(), None, filed_at())
                    .unwrap(),
            )
            .unwrap();
            c.plan_verdict("r".into(), filed_at(), filed_at()).unwrap()
        };

        let err = repo
            .conditional_update(&case.id, 1, verdict)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        assert_eq!(repo.get(&case.id).await.unwrap(), case);
    }

    #[tokio::test]
    async fn listings_are_filtered_and_newest_first() {
        let repo = InMemoryCaseRepository::new();
        let older = sample_case();
        let mut newer = sample_case();
        newer.case_number = number(2);
        newer.filing.advocate = older.filing.advocate;
        newer.filing.filed_at = filed_at() + Duration::hours(1);
        let other = {
            let mut c = sample_case();
            c.case_number = number(3);
            c
        };
        repo.create(older.clone()).await.unwrap();
        repo.create(newer.clone()).await.unwrap();
        repo.create(other.clone()).await.unwrap();

        let mine = repo.list_by_advocate(&older.filing.advocate).await.unwrap();
        assert_eq!(
            mine.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );

        let station = repo
            .list_by_court_station(&other.filing.court_station)
            .await
            .unwrap();
        assert_eq!(station.len(), 1);
        assert_eq!(station[0].id, other.id);
    }

    #[tokio::test]
    async fn find_by_number_uses_index() {
        let repo = InMemoryCaseRepository::new();
        let case = repo.create(sample_case()).await.unwrap();
        assert_eq!(
            repo.find_by_number(&case.case_number).await.unwrap(),
            Some(case)
        );
        assert_eq!(repo.find_by_number(&number(99)).await.unwrap(), None);
    }
}
