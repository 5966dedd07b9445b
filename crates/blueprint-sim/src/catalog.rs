//! Mock engagement data used to fill generated jobs.

use std::collections::BTreeMap;

use blueprint_core::model::TimelineEvent;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// What the simulated service knows about one engagement
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementProfile {
    pub customer_name: String,
    pub scenario_count: u32,
    pub notes_count: u32,
    pub transcript_tokens: u64,
    pub risk_score: f64,
    pub automation_confidence: f64,
    pub recommendation_categories: Vec<String>,
    pub timeline: Vec<TimelineEvent>,
}

impl EngagementProfile {
    /// Profile for an engagement the catalog has never heard of
    pub fn placeholder(engagement_id: &str) -> Self {
        Self {
            customer_name: format!("Engagement {}", engagement_id),
            scenario_count: 1,
            notes_count: 0,
            transcript_tokens: 1_200,
            risk_score: 0.32,
            automation_confidence: 0.68,
            recommendation_categories: vec!["Automation".to_string()],
            timeline: Vec::new(),
        }
    }

    /// Share of recommendations backed by a validated scenario, capped at 95%
    pub fn recommendation_coverage(&self) -> f64 {
        f64::from((self.scenario_count * 18 + 40).min(95)) / 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngagementCatalog {
    profiles: BTreeMap<String, EngagementProfile>,
}

impl EngagementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, engagement_id: impl Into<String>, profile: EngagementProfile) -> Self {
        self.profiles.insert(engagement_id.into(), profile);
        self
    }

    /// Catalog seeded with a few demo engagements
    pub fn demo() -> Self {
        let base = Utc.with_ymd_and_hms(2024, 9, 2, 15, 0, 0).single().unwrap_or_else(Utc::now);

        Self::new()
            .with_profile(
                "acme-1",
                EngagementProfile {
                    customer_name: "Acme Financial".to_string(),
                    scenario_count: 3,
                    notes_count: 12,
                    transcript_tokens: 8_400,
                    risk_score: 0.27,
                    automation_confidence: 0.78,
                    recommendation_categories: vec![
                        "Automation".to_string(),
                        "Identity".to_string(),
                        "Detection".to_string(),
                    ],
                    timeline: vec![
                        event(base, 0, "pov", "POV kickoff with security leadership"),
                        event(base, 9, "scenario", "Zero Trust attack simulation validated"),
                        event(base, 21, "trr", "Technical readiness review signed off"),
                    ],
                },
            )
            .with_profile(
                "globex-7",
                EngagementProfile {
                    customer_name: "Globex Logistics".to_string(),
                    scenario_count: 1,
                    notes_count: 4,
                    transcript_tokens: 2_100,
                    risk_score: 0.41,
                    automation_confidence: 0.62,
                    recommendation_categories: vec!["Cloud".to_string()],
                    timeline: vec![event(base, 3, "pov", "Cloud posture POV scoped")],
                },
            )
    }

    /// Profile for `engagement_id`, a placeholder when unknown
    pub fn profile(&self, engagement_id: &str) -> EngagementProfile {
        self.profiles
            .get(engagement_id)
            .cloned()
            .unwrap_or_else(|| EngagementProfile::placeholder(engagement_id))
    }

    pub fn engagement_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

fn event(base: DateTime<Utc>, day: i64, kind: &str, summary: &str) -> TimelineEvent {
    TimelineEvent {
        at: base + Duration::days(day),
        kind: kind.to_string(),
        summary: summary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engagement_gets_placeholder() {
        let profile = EngagementCatalog::demo().profile("initech-3");
        assert_eq!(profile.customer_name, "Engagement initech-3");
        assert!(profile.timeline.is_empty());
    }

    #[test]
    fn test_demo_profiles_are_ordered() {
        let catalog = EngagementCatalog::demo();
        let ids: Vec<_> = catalog.engagement_ids().collect();
        assert_eq!(ids, vec!["acme-1", "globex-7"]);
        assert_eq!(catalog.profile("acme-1").timeline.len(), 3);
    }

    #[test]
    fn test_coverage_is_capped() {
        let mut profile = EngagementProfile::placeholder("x");
        assert!((profile.recommendation_coverage() - 0.58).abs() < 1e-9);
        profile.scenario_count = 10;
        assert!((profile.recommendation_coverage() - 0.95).abs() < 1e-9);
    }
}
