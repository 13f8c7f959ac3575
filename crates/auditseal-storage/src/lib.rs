//! # auditseal-storage
//!
//! Append-only implementations of
//! [`EventRepository`](auditseal_core::traits::EventRepository).
//!
//! - [`InMemoryEventRepository`]: process-local, for tests and ephemeral runs
//! - [`SqliteEventRepository`]: durable, one SQLite file for all tenants
//!
//! Both treat `append` as a compare-and-swap on the tenant head and refuse a
//! second event with an id already stored.  Neither ever updates or deletes a
//! stored event.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auditseal_core::ImmutableStore;
//! use auditseal_crypto::EcdsaSignatureAuthority;
//! use auditseal_storage::SqliteEventRepository;
//!
//! let repo = Arc::new(SqliteEventRepository::open("data/events.db")?);
//! let store = ImmutableStore::new(repo, Arc::new(EcdsaSignatureAuthority::generate()));
//! let sealed = store.store(event)?;
//! assert!(store.verify_integrity(sealed.id())?.is_intact());
//! ```

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryEventRepository;
pub use sqlite::SqliteEventRepository;

// ── Tests ─────────────────────────────────────────────────────────────────────
