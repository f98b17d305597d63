//! Opaque identifier generation.
//!
//! Ids are generated host-side and never parsed by the core — they are
//! treated as opaque strings everywhere outside this module.

use uuid::Uuid;

/// Generate a new opaque identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
