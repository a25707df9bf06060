//! Newtype IDs for type-safe entity references.
//!
//! The store backend issues opaque string identifiers (cuid-style). Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different entity types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>` and `From<String>`/`From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use rwaya_core::define_id;
/// define_id!(ProductId);
/// define_id!(OrderId);
///
/// let product_id = ProductId::new("clx1");
/// let order_id = OrderId::new("clx1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(TrackingUpdateId);
define_id!(CustomerId);

/// Error returned when a tracking code is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tracking code cannot be empty")]
pub struct EmptyTrackingCode;

/// A customer-facing order tracking code (e.g. `TRK001234567`).
///
/// Tracking codes are opaque: the only rule applied locally is that the
/// trimmed input is not empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Parse a tracking code from user input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyTrackingCode`] if nothing is left after trimming.
    pub fn parse(input: &str) -> Result<Self, EmptyTrackingCode> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmptyTrackingCode);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ::core::fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TrackingCode {
    type Err = EmptyTrackingCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_serde() {
        let id = ProductId::new("clx9a1");
        assert_eq!(id.to_string(), "clx9a1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"clx9a1\"");

        let parsed: ProductId = serde_json::from_str("\"clx9a1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_tracking_code_trims() {
        let code = TrackingCode::parse("  TRK001234567 \n").unwrap();
        assert_eq!(code.as_str(), "TRK001234567");
    }

    #[test]
    fn test_tracking_code_rejects_blank() {
        assert_eq!(TrackingCode::parse(""), Err(EmptyTrackingCode));
        assert_eq!(TrackingCode::parse("   \t"), Err(EmptyTrackingCode));
    }
}
