//! Domain model for the travel log.
//!
//! # Responsibility
//! - Define the canonical `City` record returned to API callers.
//! - Define boundary payloads (`CityDraft`, `CityPatch`) and their validation.
//!
//! # Invariants
//! - Every city is identified by a store-assigned `CityId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod city;
