//! # API Route Modules
//!
//! - `cases`: filing, the stage transitions, lookups and listings.
//! - `directory`: court stations, case types and categories, parties,
//!   advocates, filing forms and fee payments.

pub mod cases;
pub mod directory;
