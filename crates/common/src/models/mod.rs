//! Catalog entity models
//!
//! Records held by the entity store and the derived views built from them.

mod account;
mod paper;
mod university;

pub use account::{hash_credential, Account, NewAccount};
pub use paper::{NewPaper, Paper, PaperFilter, PaperWithUniversity};
pub use university::{CatalogStats, NewUniversity, University, UniversityWithStats};
