//! Subscription plans and per-plan resource limits

use serde::{Deserialize, Serialize};

/// Subscription plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Free,
    Pro,
    Team,
}

impl PlanType {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "team" => Some(Self::Team),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Team => "team",
        }
    }
}

/// Metered resource dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cases,
    AiRequests,
    StorageGb,
    TeamMembers,
}

impl Metric {
    /// Parse from wire/database string value
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "cases" => Some(Self::Cases),
            "ai_requests" => Some(Self::AiRequests),
            "storage_gb" => Some(Self::StorageGb),
            "team_members" => Some(Self::TeamMembers),
            _ => None,
        }
    }

    /// Wire/database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cases => "cases",
            Self::AiRequests => "ai_requests",
            Self::StorageGb => "storage_gb",
            Self::TeamMembers => "team_members",
        }
    }
}

/// Feature flag gated by subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AiAssistant,
    FormAutofill,
    BulkExport,
    PrioritySupport,
}

/// Plan limits configuration for each subscription tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub plan: PlanType,
    /// Maximum number of open cases
    pub max_cases: i64,
    /// Maximum AI requests per billing period
    pub max_ai_requests_per_month: i64,
    /// Maximum document storage in GB
    pub max_storage_gb: i64,
    /// Maximum members per account
    pub max_team_members: i64,
    /// Features enabled on this plan
    pub features: Vec<Feature>,
}

impl PlanLimits {
    /// Get the limits for a given subscription plan
    pub fn from_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => PlanLimits {
                plan: PlanType::Free,
                max_cases: 3,
                max_ai_requests_per_month: 10,
                max_storage_gb: 1,
                max_team_members: 1,
                features: vec![Feature::AiAssistant],
            },
            PlanType::Pro => PlanLimits {
                plan: PlanType::Pro,
                max_cases: 50,
                max_ai_requests_per_month: 500,
                max_storage_gb: 25,
                max_team_members: 5,
                features: vec![
                    Feature::AiAssistant,
                    Feature::FormAutofill,
                    Feature::BulkExport,
                ],
            },
            PlanType::Team => PlanLimits {
                plan: PlanType::Team,
                max_cases: 250,
                max_ai_requests_per_month: 2000,
                max_storage_gb: 100,
                max_team_members: 25,
                features: vec![
                    Feature::AiAssistant,
                    Feature::FormAutofill,
                    Feature::BulkExport,
                    Feature::PrioritySupport,
                ],
            },
        }
    }

    /// Hardcoded free-tier defaults, used when an account has no
    /// subscription or its plan string matches no known tier
    pub fn free_tier() -> Self {
        Self::from_plan(PlanType::Free)
    }

    /// Numeric cap for a metric on this plan
    pub fn limit_for(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Cases => self.max_cases,
            Metric::AiRequests => self.max_ai_requests_per_month,
            Metric::StorageGb => self.max_storage_gb,
            Metric::TeamMembers => self.max_team_members,
        }
    }

    /// Check whether an action consuming `required` more units of `metric`
    /// stays within this plan's cap given `current` usage
    pub fn allows(&self, metric: Metric, current: i64, required: i64) -> bool {
        current + required <= self.limit_for(metric)
    }

    /// Check if a feature is enabled on this plan
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_type_db_roundtrip() {
        assert_eq!(PlanType::from_db("free"), Some(PlanType::Free));
        assert_eq!(PlanType::from_db("pro"), Some(PlanType::Pro));
        assert_eq!(PlanType::from_db("team"), Some(PlanType::Team));
        assert_eq!(PlanType::from_db("enterprise"), None);
        assert_eq!(PlanType::Pro.as_db(), "pro");
    }

    #[test]
    fn test_metric_strings() {
        assert_eq!(Metric::from_str_opt("cases"), Some(Metric::Cases));
        assert_eq!(Metric::from_str_opt("ai_requests"), Some(Metric::AiRequests));
        assert_eq!(Metric::from_str_opt("widgets"), None);
        assert_eq!(Metric::StorageGb.as_str(), "storage_gb");
        assert_eq!(Metric::TeamMembers.as_str(), "team_members");
    }

    #[test]
    fn test_free_plan_limits() {
        let limits = PlanLimits::from_plan(PlanType::Free);
        assert_eq!(limits.max_cases, 3);
        assert_eq!(limits.max_ai_requests_per_month, 10);
        assert_eq!(limits.max_storage_gb, 1);
        assert_eq!(limits.max_team_members, 1);
        assert!(limits.has_feature(Feature::AiAssistant));
        assert!(!limits.has_feature(Feature::BulkExport));
    }

    #[test]
    fn test_pro_plan_limits() {
        let limits = PlanLimits::from_plan(PlanType::Pro);
        assert_eq!(limits.max_cases, 50);
        assert_eq!(limits.max_ai_requests_per_month, 500);
        assert!(limits.has_feature(Feature::FormAutofill));
        assert!(!limits.has_feature(Feature::PrioritySupport));
    }

    #[test]
    fn test_team_plan_limits() {
        let limits = PlanLimits::from_plan(PlanType::Team);
        assert_eq!(limits.max_cases, 250);
        assert_eq!(limits.max_ai_requests_per_month, 2000);
        assert!(limits.has_feature(Feature::PrioritySupport));
    }

    #[test]
    fn test_free_tier_matches_free_plan() {
        assert_eq!(PlanLimits::free_tier(), PlanLimits::from_plan(PlanType::Free));
    }

    #[test]
    fn test_allows_at_boundary() {
        let limits = PlanLimits::from_plan(PlanType::Pro);
        // 499 + 1 = 500, within limit
        assert!(limits.allows(Metric::AiRequests, 499, 1));
        // 499 + 2 = 501, exceeds limit
        assert!(!limits.allows(Metric::AiRequests, 499, 2));
        // exactly at limit already
        assert!(!limits.allows(Metric::AiRequests, 500, 1));
    }

    #[test]
    fn test_limit_for_each_metric() {
        let limits = PlanLimits::from_plan(PlanType::Team);
        assert_eq!(limits.limit_for(Metric::Cases), 250);
        assert_eq!(limits.limit_for(Metric::AiRequests), 2000);
        assert_eq!(limits.limit_for(Metric::StorageGb), 100);
        assert_eq!(limits.limit_for(Metric::TeamMembers), 25);
    }
}
