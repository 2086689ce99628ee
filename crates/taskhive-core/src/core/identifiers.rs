// crates/taskhive-core/src/core/identifiers.rs
// ============================================================================
// Module: Taskhive Identifiers
// Description: Canonical opaque identifiers for tenants, users, projects, and tasks.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: base64, rand, serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Taskhive.
//! Identifiers are opaque UTF-8 strings that serialize transparently on the
//! wire. Freshly minted identifiers are 16 random bytes encoded as URL-safe
//! base64 without padding; the types themselves apply no normalization, so
//! identifiers received from storage or clients are carried verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Number of random bytes backing a generated identifier.
const ID_BYTES: usize = 16;

/// Generates a fresh opaque identifier string.
fn generate_raw() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mints a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(generate_raw())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id! {
    /// Tenant identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; equality is byte-wise.
    TenantId
}

opaque_id! {
    /// User identifier, unique across all tenants.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; equality is byte-wise.
    UserId
}

opaque_id! {
    /// Project identifier, unique across all tenants.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; equality is byte-wise.
    ProjectId
}

opaque_id! {
    /// Task identifier, unique across all tenants.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; equality is byte-wise.
    TaskId
}

opaque_id! {
    /// Audit log entry identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; equality is byte-wise.
    AuditEntryId
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn generated_identifiers_are_unique_and_padding_free() {
        let first = TenantId::generate();
        let second = TenantId::generate();
        assert_ne!(first, second);
        assert!(!first.as_str().contains('='));
    }

    #[test]
    fn identifiers_serialize_transparently() -> Result<(), serde_json::Error> {
        let id = ProjectId::new("proj-1");
        let json = serde_json::to_string(&id)?;
        assert_eq!(json, "\"proj-1\"");
        Ok(())
    }
}
