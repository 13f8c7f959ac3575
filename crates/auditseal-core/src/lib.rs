//! # auditseal-core
//!
//! The tamper-evident storage pipeline for AuditSeal.
//!
//! This crate provides:
//! - The trait seams (`Validator`, `Enricher`, `SignatureAuthority`,
//!   `EventRepository`)
//! - `HashChainEngine`: canonical hashing, chain verification, head lookup
//! - `TenantLocks`: per-tenant serialization of the write path
//! - `ImmutableStore`: the orchestrator that seals and persists events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auditseal_core::ImmutableStore;
//!
//! let store = ImmutableStore::new(Arc::new(repository), Arc::new(authority));
//! let secured = store.store(event)?;
//! assert!(store.verify_integrity(secured.event.id)?.is_intact());
//! ```

pub mod chain;
pub mod store;
pub mod tenant;
pub mod traits;

pub use chain::{calculate_hash, verify_chain, HashChainEngine};
pub use store::{ImmutableStore, StoreSettings};
pub use tenant::TenantLocks;

// ── Tests ─────────────────────────────────────────────────────────────────────
