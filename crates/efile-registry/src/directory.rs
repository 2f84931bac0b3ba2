//! # Directory
//!
//! Reference data a filing points at: court stations, case types and
//! categories, advocates, individual and organization parties, filing
//! forms and fee payments. Also the per-station court staff roster.
//!
//! Every record is a [`DirectoryEntry`] with a kind, a display name and a
//! free-form JSON attribute bag. Names of catalogue kinds (see
//! [`ReferenceKind::is_catalogue`]) are unique ignoring case; other kinds
//! may repeat names.
//!
//! Some kinds carry a `unique_key` that no two entries of that kind share:
//! the practice number for advocates, and `"{station}:{role}"` for court
//! staff, so each station has at most one holder of each staff role.
//!
//! [`Directory`] implements [`PartyResolver`], so the lifecycle controller
//! resolves filing references through it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use efile_core::{
    require_text, AdvocateId, CaseCategoryId, CaseTypeId, ContactEmail, CourtStationId, FormId,
    IndividualId, OrganizationId, PaymentId,
};

use crate::clock::Clock;
use crate::error::{RegistryError, StoreError};
use crate::resolver::{PartyRef, PartyResolver, ReferenceKind, ResolvedParty};

/// One reference-data record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Record identifier.
    pub id: Uuid,
    /// Which registry the record belongs to.
    pub kind: ReferenceKind,
    /// Display name.
    pub name: String,
    /// Kind-specific extra fields.
    pub attributes: serde_json::Value,
    /// Per-kind uniqueness key, if the kind has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Storage for directory entries.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] for a duplicate id, a duplicate name
    /// (ignoring case) within a catalogue kind, or a duplicate
    /// `unique_key` within a kind.
    async fn insert(&self, entry: DirectoryEntry) -> Result<DirectoryEntry, StoreError>;

    /// Fetch one entry.
    async fn get(&self, kind: ReferenceKind, id: &Uuid) -> Result<Option<DirectoryEntry>, StoreError>;

    /// All entries of a kind, ordered by name.
    async fn list(&self, kind: ReferenceKind) -> Result<Vec<DirectoryEntry>, StoreError>;

    /// Find an entry of a kind by name, ignoring case.
    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError>;

    /// Find the entry of a kind holding `key`.
    async fn find_by_key(
        &self,
        kind: ReferenceKind,
        key: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError>;
}

/// Case folding shared by name comparisons. Matches Postgres `lower()`
/// for non-ASCII names too.
fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Process-local directory storage.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    entries: RwLock<HashMap<(ReferenceKind, Uuid), DirectoryEntry>>,
}

impl InMemoryDirectoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn insert(&self, entry: DirectoryEntry) -> Result<DirectoryEntry, StoreError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&(entry.kind, entry.id)) {
            return Err(StoreError::Conflict(format!(
                "{} {} already exists",
                entry.kind, entry.id
            )));
        }
        if entry.kind.is_catalogue() {
            let folded = fold(&entry.name);
            if entries
                .values()
                .any(|e| e.kind == entry.kind && fold(&e.name) == folded)
            {
                return Err(StoreError::Conflict(format!(
                    "{} named {:?} already exists",
                    entry.kind, entry.name
                )));
            }
        }
        if let Some(key) = &entry.unique_key {
            if entries
                .values()
                .any(|e| e.kind == entry.kind && e.unique_key.as_ref() == Some(key))
            {
                return Err(StoreError::Conflict(format!(
                    "{} with key {key:?} already exists",
                    entry.kind
                )));
            }
        }
        entries.insert((entry.kind, entry.id), entry.clone());
        Ok(entry)
    }

    async fn get(&self, kind: ReferenceKind, id: &Uuid) -> Result<Option<DirectoryEntry>, StoreError> {
        Ok(self.entries.read().get(&(kind, *id)).cloned())
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<DirectoryEntry>, StoreError> {
        let mut out: Vec<DirectoryEntry> = self
            .entries
            .read()
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        out.sort_by_cached_key(|e| fold(&e.name));
        Ok(out)
    }

    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError> {
        let folded = fold(name);
        Ok(self
            .entries
            .read()
            .values()
            .find(|e| e.kind == kind && fold(&e.name) == folded)
            .cloned())
    }

    async fn find_by_key(
        &self,
        kind: ReferenceKind,
        key: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .values()
            .find(|e| e.kind == kind && e.unique_key.as_deref() == Some(key))
            .cloned())
    }
}

/// Roles on a court station's staff roster. Each station has at most one
/// holder of each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Station administrator.
    CourtAdmin,
    /// Deputy registrar; approves filings.
    DeputyRegistrar,
    /// Court assistant.
    CourtAssistant,
}

impl StaffRole {
    /// Every role, in roster order.
    pub const ALL: [StaffRole; 3] = [
        Self::CourtAdmin,
        Self::DeputyRegistrar,
        Self::CourtAssistant,
    ];

    /// Storage and wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CourtAdmin => "court_admin",
            Self::DeputyRegistrar => "deputy_registrar",
            Self::CourtAssistant => "court_assistant",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown staff role: {s}"))
    }
}

fn staff_key(station: &CourtStationId, role: StaffRole) -> String {
    format!("{station}:{role}")
}

fn practice_key(practice_number: u32) -> String {
    practice_number.to_string()
}

/// Fields of a new advocate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdvocate {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact e-mail.
    pub email: ContactEmail,
    /// Law society practice number.
    pub practice_number: u32,
    /// Contact phone number.
    pub cellphone: Option<String>,
}

/// Fields of a new court staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourtStaff {
    /// Station the member serves at.
    pub court_station: CourtStationId,
    /// Roster role.
    pub role: StaffRole,
    /// Login name; also the display name.
    pub username: String,
}

/// Fields of a new fee payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    /// Mobile-money receipt or other external reference.
    pub reference: String,
    /// Amount paid, in the smallest currency unit.
    pub amount: u64,
    /// Paying phone number.
    pub phone: Option<String>,
}

/// Reference-data registry backed by a [`DirectoryStore`].
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn DirectoryStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}

impl Directory {
    /// Build a directory over a store.
    pub fn new(store: Arc<dyn DirectoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a named entry of any kind.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidInput`] for an empty name,
    /// [`StoreError::Conflict`] for a duplicate catalogue name.
    pub async fn register(
        &self,
        kind: ReferenceKind,
        name: &str,
        attributes: serde_json::Value,
    ) -> Result<DirectoryEntry, RegistryError> {
        self.insert(kind, name, attributes, None).await
    }

    async fn insert(
        &self,
        kind: ReferenceKind,
        name: &str,
        attributes: serde_json::Value,
        unique_key: Option<String>,
    ) -> Result<DirectoryEntry, RegistryError> {
        let name = require_text("name", name)?;
        let entry = DirectoryEntry {
            id: Uuid::new_v4(),
            kind,
            name,
            attributes,
            unique_key,
            created_at: self.clock.now(),
        };
        let entry = self.store.insert(entry).await?;
        tracing::info!(kind = %entry.kind, id = %entry.id, name = %entry.name, "directory entry registered");
        Ok(entry)
    }

    /// Register a court station.
    pub async fn register_court_station(
        &self,
        name: &str,
    ) -> Result<(CourtStationId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::CourtStation, name, serde_json::json!({}))
            .await?;
        Ok((CourtStationId::from_uuid(entry.id), entry))
    }

    /// Register a case type.
    pub async fn register_case_type(
        &self,
        name: &str,
    ) -> Result<(CaseTypeId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::CaseType, name, serde_json::json!({}))
            .await?;
        Ok((CaseTypeId::from_uuid(entry.id), entry))
    }

    /// Register a case category.
    pub async fn register_case_category(
        &self,
        name: &str,
    ) -> Result<(CaseCategoryId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::CaseCategory, name, serde_json::json!({}))
            .await?;
        Ok((CaseCategoryId::from_uuid(entry.id), entry))
    }

    /// Register an individual party.
    pub async fn register_individual(
        &self,
        name: &str,
    ) -> Result<(IndividualId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::Individual, name, serde_json::json!({}))
            .await?;
        Ok((IndividualId::from_uuid(entry.id), entry))
    }

    /// Register an organization party.
    pub async fn register_organization(
        &self,
        name: &str,
    ) -> Result<(OrganizationId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::Organization, name, serde_json::json!({}))
            .await?;
        Ok((OrganizationId::from_uuid(entry.id), entry))
    }

    /// Register an advocate. The display name is `"{first} {last}"`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the practice number is already on the
    /// roll.
    pub async fn register_advocate(
        &self,
        advocate: NewAdvocate,
    ) -> Result<(AdvocateId, DirectoryEntry), RegistryError> {
        let first = require_text("first_name", &advocate.first_name)?;
        let last = require_text("last_name", &advocate.last_name)?;
        let attributes = serde_json::json!({
            "first_name": first,
            "last_name": last,
            "email": advocate.email,
            "practice_number": advocate.practice_number,
            "cellphone": advocate.cellphone,
        });
        let entry = self
            .insert(
                ReferenceKind::Advocate,
                &format!("{first} {last}"),
                attributes,
                Some(practice_key(advocate.practice_number)),
            )
            .await?;
        Ok((AdvocateId::from_uuid(entry.id), entry))
    }

    /// Whether an advocate with this practice number is on the roll.
    pub async fn advocate_exists(&self, practice_number: u32) -> Result<bool, RegistryError> {
        Ok(self
            .store
            .find_by_key(ReferenceKind::Advocate, &practice_key(practice_number))
            .await?
            .is_some())
    }

    /// Put a member on a station's staff roster.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidInput`] for an empty username or an
    ///   unknown court station.
    /// - [`StoreError::Conflict`] if the station already has someone in
    ///   that role.
    pub async fn register_court_staff(
        &self,
        staff: NewCourtStaff,
    ) -> Result<DirectoryEntry, RegistryError> {
        match self
            .get(ReferenceKind::CourtStation, staff.court_station.as_uuid())
            .await
        {
            Ok(_) => {}
            Err(RegistryError::NotFound { .. }) => {
                return Err(RegistryError::InvalidInput(format!(
                    "court_station {} does not exist",
                    staff.court_station
                )))
            }
            Err(e) => return Err(e),
        }
        let attributes = serde_json::json!({
            "court_station_id": staff.court_station,
            "role": staff.role,
        });
        let entry = self
            .insert(
                ReferenceKind::CourtStaff,
                &staff.username,
                attributes,
                Some(staff_key(&staff.court_station, staff.role)),
            )
            .await?;
        tracing::info!(
            court_station = %staff.court_station,
            role = %staff.role,
            "court staff role filled"
        );
        Ok(entry)
    }

    /// The holder of `role` at `station`, if any.
    pub async fn court_staff(
        &self,
        station: &CourtStationId,
        role: StaffRole,
    ) -> Result<Option<DirectoryEntry>, RegistryError> {
        Ok(self
            .store
            .find_by_key(ReferenceKind::CourtStaff, &staff_key(station, role))
            .await?)
    }

    /// Whether `role` is filled at `station`.
    pub async fn court_staff_exists(
        &self,
        station: &CourtStationId,
        role: StaffRole,
    ) -> Result<bool, RegistryError> {
        Ok(self.court_staff(station, role).await?.is_some())
    }

    /// A station's roster, in [`StaffRole::ALL`] order. Vacant roles are
    /// omitted.
    pub async fn station_staff(
        &self,
        station: &CourtStationId,
    ) -> Result<Vec<DirectoryEntry>, RegistryError> {
        let mut roster = Vec::new();
        for role in StaffRole::ALL {
            if let Some(entry) = self.court_staff(station, role).await? {
                roster.push(entry);
            }
        }
        Ok(roster)
    }

    /// Record a filing form of the given form type.
    pub async fn register_form(
        &self,
        form_type: &str,
    ) -> Result<(FormId, DirectoryEntry), RegistryError> {
        let entry = self
            .register(ReferenceKind::Form, form_type, serde_json::json!({}))
            .await?;
        Ok((FormId::from_uuid(entry.id), entry))
    }

    /// Record a fee payment. The display name is the payment reference.
    pub async fn register_payment(
        &self,
        payment: NewPayment,
    ) -> Result<(PaymentId, DirectoryEntry), RegistryError> {
        let attributes = serde_json::json!({
            "amount": payment.amount,
            "phone": payment.phone,
        });
        let entry = self
            .register(ReferenceKind::Payment, &payment.reference, attributes)
            .await?;
        Ok((PaymentId::from_uuid(entry.id), entry))
    }

    /// Whether an entry of `kind` named `name` exists, ignoring case.
    pub async fn exists(&self, kind: ReferenceKind, name: &str) -> Result<bool, RegistryError> {
        Ok(self.store.find_by_name(kind, name.trim()).await?.is_some())
    }

    /// Whether a court station with this name exists.
    pub async fn court_station_exists(&self, name: &str) -> Result<bool, RegistryError> {
        self.exists(ReferenceKind::CourtStation, name).await
    }

    /// Whether a case type with this name exists.
    pub async fn case_type_exists(&self, name: &str) -> Result<bool, RegistryError> {
        self.exists(ReferenceKind::CaseType, name).await
    }

    /// Whether a case category with this name exists.
    pub async fn case_category_exists(&self, name: &str) -> Result<bool, RegistryError> {
        self.exists(ReferenceKind::CaseCategory, name).await
    }

    /// All entries of a kind, ordered by name.
    pub async fn list(&self, kind: ReferenceKind) -> Result<Vec<DirectoryEntry>, RegistryError> {
        Ok(self.store.list(kind).await?)
    }

    /// Fetch one entry.
    pub async fn get(&self, kind: ReferenceKind, id: &Uuid) -> Result<DirectoryEntry, RegistryError> {
        self.store
            .get(kind, id)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                kind: kind.as_str(),
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl PartyResolver for Directory {
    async fn resolve(&self, reference: &PartyRef) -> Result<ResolvedParty, RegistryError> {
        let entry = self.get(reference.kind(), &reference.id()).await?;
        Ok(ResolvedParty {
            reference: *reference,
            name: entry.name,
        })
    }
}
