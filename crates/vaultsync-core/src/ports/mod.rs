//! Port definitions (trait interfaces) implemented by adapter crates.

pub mod vault_store;
