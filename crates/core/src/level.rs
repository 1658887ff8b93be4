//! Progressive feature unlocking driven by completed order count.
//!
//! | level | name            | reached at |
//! |-------|-----------------|------------|
//! | 1     | Starter         | 0 orders   |
//! | 2     | Regular         | 3 orders   |
//! | 3     | Power User      | 5 orders   |
//! | 4     | Producer Ready  | 10 orders  |
//!
//! Everything here is a pure function of the order count. Nothing is cached
//! between calls, so a lower count immediately yields a lower level.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Account, InterfaceKind, Role, UserActivity};

/// Ordinal engagement tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    Basic = 1,
    Returning = 2,
    Power = 3,
    ProducerEligible = 4,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Self; 4] = [
        Self::Basic,
        Self::Returning,
        Self::Power,
        Self::ProducerEligible,
    ];

    /// Minimum completed orders needed to reach this level.
    #[must_use]
    pub const fn threshold(self) -> u32 {
        match self {
            Self::Basic => 0,
            Self::Returning => 3,
            Self::Power => 5,
            Self::ProducerEligible => 10,
        }
    }

    /// Badge label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "Starter",
            Self::Returning => "Regular",
            Self::Power => "Power User",
            Self::ProducerEligible => "Producer Ready",
        }
    }

    /// The level after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Basic => Some(Self::Returning),
            Self::Returning => Some(Self::Power),
            Self::Power => Some(Self::ProducerEligible),
            Self::ProducerEligible => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Basic),
            2 => Ok(Self::Returning),
            3 => Ok(Self::Power),
            4 => Ok(Self::ProducerEligible),
            _ => Err(format!("invalid level: {value}")),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_u8(), self.name())
    }
}

/// A gated product capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CreateBasicOrders,
    ViewSingleProducer,
    ChooseBetweenProducers,
    ViewOrderHistory,
    AdvancedEditing,
    ViewAllProducerDetails,
    BulkOrdering,
    AccessProducerMode,
    SwitchToProducerDashboard,
}

impl Feature {
    pub const ALL: [Self; 9] = [
        Self::CreateBasicOrders,
        Self::ViewSingleProducer,
        Self::ChooseBetweenProducers,
        Self::ViewOrderHistory,
        Self::AdvancedEditing,
        Self::ViewAllProducerDetails,
        Self::BulkOrdering,
        Self::AccessProducerMode,
        Self::SwitchToProducerDashboard,
    ];

    /// Lowest level at which the feature is available.
    #[must_use]
    pub const fn unlocked_at(self) -> Level {
        match self {
            Self::CreateBasicOrders | Self::ViewSingleProducer => Level::Basic,
            Self::ChooseBetweenProducers | Self::ViewOrderHistory => Level::Returning,
            Self::AdvancedEditing | Self::ViewAllProducerDetails | Self::BulkOrdering => {
                Level::Power
            }
            Self::AccessProducerMode | Self::SwitchToProducerDashboard => Level::ProducerEligible,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateBasicOrders => "create_basic_orders",
            Self::ViewSingleProducer => "view_single_producer",
            Self::ChooseBetweenProducers => "choose_between_producers",
            Self::ViewOrderHistory => "view_order_history",
            Self::AdvancedEditing => "advanced_editing",
            Self::ViewAllProducerDetails => "view_all_producer_details",
            Self::BulkOrdering => "bulk_ordering",
            Self::AccessProducerMode => "access_producer_mode",
            Self::SwitchToProducerDashboard => "switch_to_producer_dashboard",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every feature mapped to whether it is enabled.
///
/// Serializes as a JSON object keyed by feature name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags(BTreeMap<Feature, bool>);

impl FeatureFlags {
    #[must_use]
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.0.get(&feature).copied().unwrap_or(false)
    }

    /// Enabled features in table order.
    pub fn enabled(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0
            .iter()
            .filter_map(|(feature, on)| on.then_some(*feature))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        self.0.iter().map(|(feature, on)| (*feature, *on))
    }
}

/// Map a raw order count to a level. Negative counts count as zero.
#[must_use]
pub fn level_for(order_count: i64) -> Level {
    level_for_activity(UserActivity::from_raw(Some(order_count)))
}

/// Map normalized activity to a level.
#[must_use]
pub fn level_for_activity(activity: UserActivity) -> Level {
    Level::ALL
        .into_iter()
        .rev()
        .find(|level| activity.order_count >= level.threshold())
        .unwrap_or(Level::Basic)
}

/// The fixed feature table for a level. Features accumulate upward.
#[must_use]
pub fn features_for(level: Level) -> FeatureFlags {
    FeatureFlags(
        Feature::ALL
            .into_iter()
            .map(|feature| (feature, level >= feature.unlocked_at()))
            .collect(),
    )
}

/// Whether an account with `order_count` completed orders may use `feature`.
#[must_use]
pub fn has_feature(order_count: i64, feature: Feature) -> bool {
    level_for(order_count) >= feature.unlocked_at()
}

/// Whether the account may switch into producer mode.
#[must_use]
pub fn producer_mode_eligible(order_count: i64) -> bool {
    level_for(order_count) == Level::ProducerEligible
}

/// Distance to the next level, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current_level: Level,
    pub current_orders: u32,
    /// `None` once the top level is reached.
    pub next_level: Option<Level>,
    pub orders_remaining: u32,
    /// `0.0..=100.0`, measured from zero orders rather than from the current
    /// level's threshold.
    pub percent: f64,
}

/// Progress toward the next level.
///
/// The target is the next level's threshold; at the top level there is no
/// target and progress is reported as complete.
#[must_use]
pub fn progress_to_next_level(order_count: i64) -> Progress {
    let activity = UserActivity::from_raw(Some(order_count));
    let current_level = level_for_activity(activity);
    let orders = activity.order_count;

    match current_level.next() {
        Some(next) => {
            let target = next.threshold();
            let percent = (100.0 * f64::from(orders) / f64::from(target)).min(100.0);
            Progress {
                current_level,
                current_orders: orders,
                next_level: Some(next),
                orders_remaining: target.saturating_sub(orders),
                percent,
            }
        }
        None => Progress {
            current_level,
            current_orders: orders,
            next_level: None,
            orders_remaining: 0,
            percent: 100.0,
        },
    }
}

/// The inputs the interface decision needs from the session layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    #[serde(default)]
    pub order_count: Option<i64>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub interface_preference: Option<InterfaceKind>,
}

impl From<&Account> for SessionProfile {
    fn from(account: &Account) -> Self {
        Self {
            order_count: Some(i64::from(account.order_count)),
            role: Some(account.role),
            interface_preference: account.interface_preference,
        }
    }
}

/// Decide which interface to show.
///
/// 1. An explicit preference always wins.
/// 2. Accounts with no orders get the simplified interface.
/// 3. Designers and producers get the full interface.
/// 4. Everyone else gets the simplified interface.
#[must_use]
pub fn resolve_preferred_interface(profile: &SessionProfile) -> InterfaceKind {
    if let Some(preference) = profile.interface_preference {
        return preference;
    }

    if profile.order_count.unwrap_or(0) <= 0 {
        return InterfaceKind::ConsumerSimplified;
    }

    if profile.role.unwrap_or_default().is_professional() {
        return InterfaceKind::ProfessionalFull;
    }

    InterfaceKind::ConsumerSimplified
}

/// Level before and after an order was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub previous: Level,
    pub current: Level,
}

impl LevelChange {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.current > self.previous
    }

    /// Features enabled by `current` that `previous` did not have.
    #[must_use]
    pub fn unlocked_features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|feature| {
                let at = feature.unlocked_at();
                at > self.previous && at <= self.current
            })
            .collect()
    }
}

/// Count one completed order against the account.
///
/// Stamps `first_order_at` on the first order and `last_order_at` on every
/// order.
pub fn record_completed_order(account: &mut Account, at: DateTime<Utc>) -> LevelChange {
    let previous = level_for_activity(account.activity());

    account.order_count = account.order_count.saturating_add(1);
    account.first_order_at.get_or_insert(at);
    account.last_order_at = Some(at);

    LevelChange {
        previous,
        current: level_for_activity(account.activity()),
    }
}

/// Everything a badge or progress bar needs, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: Level,
    pub name: String,
    pub features: FeatureFlags,
    pub progress: Progress,
    pub producer_mode_eligible: bool,
}

impl LevelSummary {
    #[must_use]
    pub fn for_count(order_count: i64) -> Self {
        let progress = progress_to_next_level(order_count);
        let level = progress.current_level;
        Self {
            level,
            name: level.name().to_string(),
            features: features_for(level),
            progress,
            producer_mode_eligible: level == Level::ProducerEligible,
        }
    }

    #[must_use]
    pub fn for_account(account: &Account) -> Self {
        Self::for_count(i64::from(account.order_count))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::AccountId;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for(0), Level::Basic);
        assert_eq!(level_for(2), Level::Basic);
        assert_eq!(level_for(3), Level::Returning);
        assert_eq!(level_for(4), Level::Returning);
        assert_eq!(level_for(5), Level::Power);
        assert_eq!(level_for(9), Level::Power);
        assert_eq!(level_for(10), Level::ProducerEligible);
        assert_eq!(level_for(10_000), Level::ProducerEligible);
    }

    #[test]
    fn test_negative_count_clamps_to_basic() {
        assert_eq!(level_for(-1), Level::Basic);
        assert_eq!(level_for(i64::MIN), Level::Basic);
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut previous = level_for(0);
        for count in 1..=50 {
            let level = level_for(count);
            assert!(level >= previous, "level dropped at {count}");
            previous = level;
        }
    }

    #[test]
    fn test_features_are_cumulative() {
        for feature in Feature::ALL {
            for level in Level::ALL {
                let flags = features_for(level);
                assert_eq!(
                    flags.is_enabled(feature),
                    level >= feature.unlocked_at(),
                    "{feature} at {level}"
                );
            }
        }
    }

    #[test]
    fn test_feature_table() {
        let basic = features_for(Level::Basic);
        assert_eq!(
            basic.enabled().collect::<Vec<_>>(),
            vec![Feature::CreateBasicOrders, Feature::ViewSingleProducer]
        );

        let power = features_for(Level::Power);
        assert!(power.is_enabled(Feature::BulkOrdering));
        assert!(!power.is_enabled(Feature::AccessProducerMode));

        let top = features_for(Level::ProducerEligible);
        assert_eq!(top.enabled().count(), Feature::ALL.len());
    }

    #[test]
    fn test_feature_flags_serialize_by_name() {
        let json = serde_json::to_value(features_for(Level::Returning)).unwrap();
        assert_eq!(json["choose_between_producers"], true);
        assert_eq!(json["advanced_editing"], false);
        assert_eq!(json.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_level_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Level::Power).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Level>("4").unwrap(), Level::ProducerEligible);
        assert!(serde_json::from_str::<Level>("5").is_err());
    }

    #[test]
    fn test_progress_at_zero() {
        let progress = progress_to_next_level(0);
        assert_eq!(progress.current_level, Level::Basic);
        assert_eq!(progress.next_level, Some(Level::Returning));
        assert_eq!(progress.orders_remaining, 3);
        assert!(progress.percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_mid_level() {
        let progress = progress_to_next_level(4);
        assert_eq!(progress.next_level, Some(Level::Power));
        assert_eq!(progress.orders_remaining, 1);
        assert!((progress.percent - 80.0).abs() < 1e-9);

        let progress = progress_to_next_level(7);
        assert_eq!(progress.next_level, Some(Level::ProducerEligible));
        assert_eq!(progress.orders_remaining, 3);
        assert!((progress.percent - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_at_top() {
        for count in [10, 25] {
            let progress = progress_to_next_level(count);
            assert_eq!(progress.next_level, None);
            assert_eq!(progress.orders_remaining, 0);
            assert!((progress.percent - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_progress_never_exceeds_bounds() {
        for count in -5..40 {
            let progress = progress_to_next_level(count);
            assert!((0.0..=100.0).contains(&progress.percent));
        }
    }

    #[test]
    fn test_explicit_preference_wins() {
        let profile = SessionProfile {
            order_count: Some(0),
            role: Some(Role::Designer),
            interface_preference: Some(InterfaceKind::ProfessionalFull),
        };
        assert_eq!(
            resolve_preferred_interface(&profile),
            InterfaceKind::ProfessionalFull
        );

        let profile = SessionProfile {
            order_count: Some(20),
            role: Some(Role::Producer),
            interface_preference: Some(InterfaceKind::ConsumerSimplified),
        };
        assert_eq!(
            resolve_preferred_interface(&profile),
            InterfaceKind::ConsumerSimplified
        );
    }

    #[test]
    fn test_new_accounts_get_simplified_interface() {
        let profile = SessionProfile {
            order_count: None,
            role: Some(Role::Producer),
            interface_preference: None,
        };
        assert_eq!(
            resolve_preferred_interface(&profile),
            InterfaceKind::ConsumerSimplified
        );
    }

    #[test]
    fn test_professionals_with_orders_get_full_interface() {
        for role in [Role::Designer, Role::Producer] {
            let profile = SessionProfile {
                order_count: Some(1),
                role: Some(role),
                interface_preference: None,
            };
            assert_eq!(
                resolve_preferred_interface(&profile),
                InterfaceKind::ProfessionalFull
            );
        }
    }

    #[test]
    fn test_consumers_with_orders_stay_simplified() {
        for role in [None, Some(Role::Consumer), Some(Role::Admin)] {
            let profile = SessionProfile {
                order_count: Some(12),
                role,
                interface_preference: None,
            };
            assert_eq!(
                resolve_preferred_interface(&profile),
                InterfaceKind::ConsumerSimplified
            );
        }
    }

    #[test]
    fn test_record_completed_order() {
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 9, 8, 30, 0).unwrap();
        let mut account = Account::new(AccountId::new(1), "Ada", Role::Consumer);

        let change = record_completed_order(&mut account, first);
        assert_eq!(account.order_count, 1);
        assert!(!change.leveled_up());
        assert_eq!(account.first_order_at, Some(first));

        record_completed_order(&mut account, later);
        let change = record_completed_order(&mut account, later);
        assert_eq!(account.order_count, 3);
        assert_eq!(account.first_order_at, Some(first));
        assert_eq!(account.last_order_at, Some(later));
        assert!(change.leveled_up());
        assert_eq!(
            change.unlocked_features(),
            vec![Feature::ChooseBetweenProducers, Feature::ViewOrderHistory]
        );
    }

    #[test]
    fn test_summary_for_top_level() {
        let summary = LevelSummary::for_count(11);
        assert_eq!(summary.level, Level::ProducerEligible);
        assert_eq!(summary.name, "Producer Ready");
        assert!(summary.producer_mode_eligible);
        assert!(summary.features.is_enabled(Feature::SwitchToProducerDashboard));
        assert!(producer_mode_eligible(11));
        assert!(!producer_mode_eligible(9));
        assert!(has_feature(5, Feature::AdvancedEditing));
        assert!(!has_feature(4, Feature::AdvancedEditing));
    }
}
