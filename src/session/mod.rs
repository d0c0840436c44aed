//! Session identity records and their storage.
//!
//! A session token maps to a [`SessionIdentity`]: who logged in, who the
//! session currently acts as, and a version number bumped on every change.

mod config;
mod identity;
mod in_memory;
mod locks;
mod store;

pub(crate) use config::MAX_TTL_SECONDS;
pub use config::SessionConfig;
pub use identity::{SessionIdentity, SessionToken};
pub use in_memory::InMemorySessionIdentityStore;
pub use locks::{SessionLease, SessionLocks};
pub use store::SessionIdentityStore;
