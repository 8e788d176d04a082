//! Read-only reference sets that annotations are checked against.
//!
//! Both sets are built once per run and shared by reference across worker
//! threads, so they are `Send + Sync` and never mutated after construction.

mod ipa;
mod orthography;

pub use ipa::{IpaInventory, IpaPredicate};
pub use orthography::Orthography;
