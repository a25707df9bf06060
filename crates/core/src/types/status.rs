//! Status enums for orders and payments.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Display category derived from a free-form delivery status string.
///
/// The backend records tracking statuses as text entered by staff
/// ("Order Confirmed", "Shipped", "In Transit", ...). Matching is
/// case-insensitive on the trimmed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryCategory {
    Delivered,
    InTransit,
    Processing,
    Confirmed,
    #[default]
    Other,
}

impl DeliveryCategory {
    /// Categorize a status string.
    ///
    /// ```
    /// use rwaya_core::DeliveryCategory;
    ///
    /// assert_eq!(DeliveryCategory::from_status("Shipped"), DeliveryCategory::InTransit);
    /// assert_eq!(DeliveryCategory::from_status(" delivered "), DeliveryCategory::Delivered);
    /// assert_eq!(DeliveryCategory::from_status("Awaiting pickup"), DeliveryCategory::Other);
    /// ```
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "delivered" => Self::Delivered,
            "in transit" | "shipped" => Self::InTransit,
            "processing" => Self::Processing,
            "order confirmed" | "confirmed" => Self::Confirmed,
            _ => Self::Other,
        }
    }

    /// Stable identifier, also used as a CSS modifier in templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::InTransit => "in-transit",
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Other => "other",
        }
    }

    /// Badge classes for the status pill.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Delivered => "bg-green-100 text-green-800 border-green-200",
            Self::InTransit => "bg-blue-100 text-blue-800 border-blue-200",
            Self::Processing => "bg-yellow-100 text-yellow-800 border-yellow-200",
            Self::Confirmed => "bg-purple-100 text-purple-800 border-purple-200",
            Self::Other => "bg-gray-100 text-gray-800 border-gray-200",
        }
    }
}

impl fmt::Display for DeliveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the payment gateway through the redirect marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Canceled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let cases = [
            ("Delivered", DeliveryCategory::Delivered),
            ("DELIVERED", DeliveryCategory::Delivered),
            ("In Transit", DeliveryCategory::InTransit),
            ("shipped", DeliveryCategory::InTransit),
            ("Processing", DeliveryCategory::Processing),
            ("Order Confirmed", DeliveryCategory::Confirmed),
            ("confirmed", DeliveryCategory::Confirmed),
            ("Returned to sender", DeliveryCategory::Other),
            ("", DeliveryCategory::Other),
        ];

        for (status, expected) in cases {
            assert_eq!(DeliveryCategory::from_status(status), expected, "{status}");
        }
    }

    #[test]
    fn test_partial_words_do_not_match() {
        assert_eq!(
            DeliveryCategory::from_status("Not delivered"),
            DeliveryCategory::Other
        );
    }
}
