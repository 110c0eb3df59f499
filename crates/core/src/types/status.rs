//! Payment status enums for locally cached orders.

use serde::{Deserialize, Serialize};

/// Payment status of a locally cached order.
///
/// Serialized in `camelCase` to match the JSON kept in the `localOrders`
/// storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    /// Order placed, payment not yet started.
    #[default]
    Pending,
    /// Payment submitted, awaiting an administrative decision.
    Processing,
    /// Payment confirmed.
    Completed,
    /// Payment refused.
    Rejected,
}

impl PaymentStatus {
    /// Whether this status is a final decision.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// A final payment decision recorded by the confirmation pages.
///
/// Only terminal statuses can be pushed through the `orderStatusUpdates`
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminalStatus {
    Completed,
    Rejected,
}

impl From<TerminalStatus> for PaymentStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => Self::Completed,
            TerminalStatus::Rejected => Self::Rejected,
        }
    }
}

impl TryFrom<PaymentStatus> for TerminalStatus {
    type Error = PaymentStatus;

    fn try_from(status: PaymentStatus) -> Result<Self, Self::Error> {
        match status {
            PaymentStatus::Completed => Ok(Self::Completed),
            PaymentStatus::Rejected => Ok(Self::Rejected),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PaymentStatus::from(*self).fmt(f)
    }
}

impl std::str::FromStr for TerminalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid terminal status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: PaymentStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Rejected);
    }

    #[test]
    fn test_terminal_status_rejects_non_terminal() {
        assert!(serde_json::from_str::<TerminalStatus>("\"pending\"").is_err());
        assert!("processing".parse::<TerminalStatus>().is_err());
        assert_eq!(
            TerminalStatus::try_from(PaymentStatus::Pending),
            Err(PaymentStatus::Pending)
        );
    }

    #[test]
    fn test_terminal_status_display_matches_payment_status() {
        assert_eq!(TerminalStatus::Completed.to_string(), "completed");
        assert!(PaymentStatus::from(TerminalStatus::Rejected).is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }
}
