//! # Identity Newtypes
//!
//! UUID-backed identifiers for every record the registry references.
//! Each identifier is a distinct type, so a [`CaseTypeId`] can never be
//! passed where a [`CaseCategoryId`] is expected.
//!
//! UUID-based identifiers are always valid by construction. Whether the
//! referenced record *exists* is a separate question answered by the party
//! resolver at filing time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_identifier!(
    /// A filed case. Assigned once at filing and never changed.
    CaseId
);
uuid_identifier!(
    /// An advocate (lawyer) account.
    AdvocateId
);
uuid_identifier!(
    /// A physical court location.
    CourtStationId
);
uuid_identifier!(
    /// A case type (civil, criminal, ...) from the reference catalogue.
    CaseTypeId
);
uuid_identifier!(
    /// A case category from the reference catalogue.
    CaseCategoryId
);
uuid_identifier!(
    /// A natural person registered as a party.
    IndividualId
);
uuid_identifier!(
    /// A company or other body registered as a party.
    OrganizationId
);
uuid_identifier!(
    /// A filing form from the fee structure.
    FormId
);
uuid_identifier!(
    /// A recorded filing-fee payment.
    PaymentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identifiers_are_distinct() {
        assert_ne!(CaseId::new(), CaseId::new());
    }

    #[test]
    fn from_uuid_round_trips_through_accessor() {
        let raw = Uuid::new_v4();
        let id = CourtStationId::from_uuid(raw);
        assert_eq!(id.as_uuid(), &raw);
        assert_eq!(id.to_string(), raw.to_string());
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let raw = Uuid::new_v4();
        let json = serde_json::to_string(&AdvocateId::from_uuid(raw)).unwrap();
        assert_eq!(json, format!("\"{raw}\""));
    }
}
