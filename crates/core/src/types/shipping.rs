//! Shipping methods offered at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shipping method: {0}")]
pub struct UnknownShippingMethod(pub String);

/// How the order is delivered.
///
/// `Standard` is the default and carries no surcharge. Every other method
/// adds the store's fixed shipping surcharge to the advisory checkout total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Courier,
}

impl ShippingMethod {
    /// Whether this is the default, surcharge-free method.
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Standard)
    }

    /// Wire and form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Courier => "courier",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard delivery",
            Self::Courier => "Courier delivery",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShippingMethod {
    type Err = UnknownShippingMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "standard" => Ok(Self::Standard),
            "courier" => Ok(Self::Courier),
            other => Err(UnknownShippingMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        assert_eq!(ShippingMethod::default(), ShippingMethod::Standard);
        assert!(ShippingMethod::Standard.is_default());
        assert!(!ShippingMethod::Courier.is_default());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ShippingMethod::Courier).unwrap(),
            "\"courier\""
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "Courier".parse::<ShippingMethod>().unwrap(),
            ShippingMethod::Courier
        );
        assert_eq!("".parse::<ShippingMethod>().unwrap(), ShippingMethod::Standard);
        assert!("drone".parse::<ShippingMethod>().is_err());
    }
}
