use std::fmt::Display;

use serde::{Serialize, Serializer};

/// Membership status stored on the user row.
///
/// Provider statuses this service does not model are kept verbatim in `Other`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum MembershipStatus {
    Active,
    PastDue,
    Canceled,
    #[default]
    Inactive,
    Other(String),
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            MembershipStatus::Active => "active",
            MembershipStatus::PastDue => "past_due",
            MembershipStatus::Canceled => "canceled",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Other(raw) => raw.as_str(),
        };
        write!(f, "{}", status)
    }
}

impl Serialize for MembershipStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl MembershipStatus {
    /// Parses a value read back from storage.
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => MembershipStatus::Active,
            "past_due" => MembershipStatus::PastDue,
            "canceled" => MembershipStatus::Canceled,
            "inactive" => MembershipStatus::Inactive,
            other => MembershipStatus::Other(other.to_string()),
        }
    }

    /// The single mapping from Stripe subscription statuses to local membership status.
    pub fn from_provider_status(provider_status: &str) -> Self {
        match provider_status {
            "active" | "trialing" => MembershipStatus::Active,
            "past_due" | "unpaid" | "incomplete" | "incomplete_expired" => MembershipStatus::PastDue,
            "canceled" => MembershipStatus::Canceled,
            other => MembershipStatus::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_billing_statuses() {
        let cases = [
            ("active", MembershipStatus::Active),
            ("trialing", MembershipStatus::Active),
            ("past_due", MembershipStatus::PastDue),
            ("unpaid", MembershipStatus::PastDue),
            ("incomplete", MembershipStatus::PastDue),
            ("incomplete_expired", MembershipStatus::PastDue),
            ("canceled", MembershipStatus::Canceled),
        ];

        for (provider, expected) in cases {
            assert_eq!(MembershipStatus::from_provider_status(provider), expected, "{provider}");
        }
    }

    #[test]
    fn unknown_provider_status_passes_through() {
        let status = MembershipStatus::from_provider_status("paused");

        assert_eq!(status, MembershipStatus::Other("paused".to_string()));
        assert_eq!(status.to_string(), "paused");
    }

    #[test]
    fn trialing_is_never_stored() {
        let stored = MembershipStatus::from_provider_status("trialing").to_string();

        assert_eq!(stored, "active");
        assert_eq!(MembershipStatus::from_str(&stored), MembershipStatus::Active);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&MembershipStatus::PastDue).unwrap();

        assert_eq!(json, "\"past_due\"");
    }
}
