//! # auditseal-validate
//!
//! Request validation for AuditSeal.
//!
//! This crate provides [`engine::SchemaValidator`], which implements the
//! [`auditseal_core::traits::Validator`] trait.  Requests are checked in two
//! phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate
//!    (required, non-blank identifiers and type discriminants).
//! 2. **Enumeration**: actor, action, and resource types must name a variant
//!    of their closed enumeration, compared case-insensitively.
//!
//! All violations from both phases are reported together.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use auditseal_validate::SchemaValidator;
//! use auditseal_core::traits::Validator;
//!
//! let validator = SchemaValidator::new()?;
//! let violations = validator.validate(&request);
//! if !violations.is_empty() {
//!     return Err(AuditSealError::ValidationFailed { violations });
//! }
//! ```

pub mod engine;

pub use engine::SchemaValidator;
