//! Closed enums for payment methods and order lifecycle.

use serde::{Deserialize, Serialize};

/// Payment method selected at checkout.
///
/// Serialized with the marketplace API's wire names
/// (`MTN_MOBILE_MONEY`, `AIRTEL_MONEY`, `CARD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    MtnMobileMoney,
    AirtelMoney,
    Card,
}

/// How a payment method collects funds, which decides the fields checkout asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentKind {
    /// Phone-linked wallet; needs a mobile number.
    MobileMoney,
    /// Card payment; needs number, expiry, CVV and holder name.
    Card,
}

impl PaymentMethod {
    /// Every method, in the order they are offered.
    pub const ALL: [Self; 3] = [Self::MtnMobileMoney, Self::AirtelMoney, Self::Card];

    /// Classify the method.
    #[must_use]
    pub const fn kind(self) -> PaymentKind {
        match self {
            Self::MtnMobileMoney | Self::AirtelMoney => PaymentKind::MobileMoney,
            Self::Card => PaymentKind::Card,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MtnMobileMoney => "MTN Mobile Money",
            Self::AirtelMoney => "Airtel Money",
            Self::Card => "Visa / Mastercard",
        }
    }

    /// Wire name used by the marketplace API and in HTML forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MtnMobileMoney => "MTN_MOBILE_MONEY",
            Self::AirtelMoney => "AIRTEL_MONEY",
            Self::Card => "CARD",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MTN_MOBILE_MONEY" => Ok(Self::MtnMobileMoney),
            "AIRTEL_MONEY" => Ok(Self::AirtelMoney),
            "CARD" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Order lifecycle status as reported by the marketplace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Returns `true` if the order can move from `self` to `next`.
    ///
    /// Cancellation is possible until the parcel leaves the vendor; refunds
    /// only apply to delivered orders.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
                | (Self::Delivered, Self::Refunded)
        )
    }

    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Cancelled | Self::Refunded => true,
            Self::Pending
            | Self::Confirmed
            | Self::Processing
            | Self::Shipped
            | Self::Delivered => false,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Being prepared",
            Self::Shipped => "On the way",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("PAYPAL".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_kind() {
        assert_eq!(PaymentMethod::MtnMobileMoney.kind(), PaymentKind::MobileMoney);
        assert_eq!(PaymentMethod::AirtelMoney.kind(), PaymentKind::MobileMoney);
        assert_eq!(PaymentMethod::Card.kind(), PaymentKind::Card);
    }

    #[test]
    fn test_order_status_happy_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Refunded,
        ];
        for pair in path.windows(2) {
            if let [from, to] = pair {
                assert!(from.can_transition_to(*to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_order_status_rejects_skips_and_reversals() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ];
        for terminal in all.into_iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|next| !terminal.can_transition_to(*next)));
        }
    }

    #[test]
    fn test_order_status_deserializes_backend_values() {
        let status: OrderStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(status, OrderStatus::Pending);
        assert!(serde_json::from_str::<OrderStatus>("\"pending\"").is_err());
    }
}
