//! Account records and the directory they are read from.
//!
//! Accounts are owned by the user-management side of the platform. This
//! crate only reads them: [`AccountDirectory`] is the seam, and
//! [`InMemoryAccountDirectory`] backs tests and local development.

mod directory;
mod types;

pub use directory::{AccountDirectory, CredentialVerifier, InMemoryAccountDirectory};
pub use types::{Account, AccountId};
