//! Account types consumed by the level engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::AccountId;

/// Account role.
///
/// Designers and producers are the professional roles; everyone else starts
/// in the simplified consumer interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Consumer,
    Designer,
    Producer,
    Admin,
}

impl Role {
    /// Whether the role belongs to the professional side of the marketplace.
    #[must_use]
    pub const fn is_professional(self) -> bool {
        matches!(self, Self::Designer | Self::Producer)
    }

    /// Wire and storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Designer => "designer",
            Self::Producer => "producer",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" => Ok(Self::Consumer),
            "designer" => Ok(Self::Designer),
            "producer" => Ok(Self::Producer),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                kind: "role",
                input: s.to_owned(),
            }),
        }
    }
}

/// Which front-end experience an account sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    /// Guided, single-producer ordering flow.
    ConsumerSimplified,
    /// Full designer/producer tooling.
    ProfessionalFull,
}

impl InterfaceKind {
    /// Wire and storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsumerSimplified => "consumer_simplified",
            Self::ProfessionalFull => "professional_full",
        }
    }
}

impl std::fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InterfaceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer_simplified" => Ok(Self::ConsumerSimplified),
            "professional_full" => Ok(Self::ProfessionalFull),
            _ => Err(ParseEnumError {
                kind: "interface",
                input: s.to_owned(),
            }),
        }
    }
}

/// Error parsing a stored or user-supplied enum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub input: String,
}

/// Normalized activity figures for the level engine.
///
/// Built from whatever the session layer hands over: a missing or negative
/// count becomes zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserActivity {
    pub order_count: u32,
}

impl UserActivity {
    /// Normalize a raw, possibly absent or negative, order count.
    #[must_use]
    pub fn from_raw(order_count: Option<i64>) -> Self {
        let count = order_count.unwrap_or(0).clamp(0, i64::from(u32::MAX));
        Self {
            order_count: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }
}

/// A marketplace account.
///
/// Level and feature flags are derived from `order_count` on every read and
/// are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub order_count: u32,
    /// Explicit interface choice. Always wins over the derived default.
    #[serde(default)]
    pub interface_preference: Option<InterfaceKind>,
    #[serde(default)]
    pub first_order_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_order_at: Option<DateTime<Utc>>,
}

impl Account {
    /// A fresh account with no order history.
    #[must_use]
    pub fn new(id: AccountId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            order_count: 0,
            interface_preference: None,
            first_order_at: None,
            last_order_at: None,
        }
    }

    #[must_use]
    pub const fn activity(&self) -> UserActivity {
        UserActivity {
            order_count: self.order_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_normalizes_raw_counts() {
        assert_eq!(UserActivity::from_raw(None).order_count, 0);
        assert_eq!(UserActivity::from_raw(Some(-4)).order_count, 0);
        assert_eq!(UserActivity::from_raw(Some(7)).order_count, 7);
        assert_eq!(UserActivity::from_raw(Some(i64::MAX)).order_count, u32::MAX);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Consumer, Role::Designer, Role::Producer, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("printer".parse::<Role>().is_err());
    }

    #[test]
    fn test_professional_roles() {
        assert!(Role::Designer.is_professional());
        assert!(Role::Producer.is_professional());
        assert!(!Role::Consumer.is_professional());
        assert!(!Role::Admin.is_professional());
    }

    #[test]
    fn test_account_defaults_when_fields_missing() {
        let account: Account = serde_json::from_str(r#"{"id": 3, "name": "Ada"}"#).unwrap();
        assert_eq!(account.role, Role::Consumer);
        assert_eq!(account.order_count, 0);
        assert!(account.interface_preference.is_none());
    }

    #[test]
    fn test_interface_wire_names() {
        let json = serde_json::to_string(&InterfaceKind::ProfessionalFull).unwrap();
        assert_eq!(json, "\"professional_full\"");
        assert_eq!(
            "consumer_simplified".parse::<InterfaceKind>().unwrap(),
            InterfaceKind::ConsumerSimplified
        );
    }
}
