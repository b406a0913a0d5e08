//! # Visibility & Aggregation
//!
//! The two pure functions at the center of the application.
//!
//! ## Filter rules
//!
//! - Pool owners see every contribution, whatever the policy.
//! - `ANONYMOUS` pools show a non-owner only their own contributions.
//! - `PUBLIC` pools (and any policy value we do not recognize) show
//!   contributions flagged visible, plus the viewer's own.
//!
//! Both functions preserve input order, never mutate their input, and never
//! fail: a viewer without an id and an empty contribution list are ordinary
//! inputs, not errors.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Contribution, Pool, PoolVisibility};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub user_id: Uuid,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    pub total: f64,
    pub percentages: Vec<Share>,
}

/// Selects the subset of `contributions` the viewer may see, in input order.
pub fn filter_contributions(
    pool: &Pool,
    contributions: &[Contribution],
    viewer_id: Option<Uuid>,
    is_owner: bool,
) -> Vec<Contribution> {
    if is_owner {
        return contributions.to_vec();
    }

    if pool.contributions_visibility == PoolVisibility::Anonymous {
        return contributions
            .iter()
            .filter(|c| Some(c.user_id) == viewer_id)
            .cloned()
            .collect();
    }

    contributions
        .iter()
        .filter(|c| c.is_visible_to_others || Some(c.user_id) == viewer_id)
        .cloned()
        .collect()
}

/// Total raised plus each contributor's percentage share, grouped in
/// first-occurrence order.
pub fn aggregate(contributions: &[Contribution]) -> PoolSummary {
    let total: f64 = contributions.iter().map(|c| c.amount).sum();

    let mut totals: Vec<(Uuid, f64)> = Vec::new();
    for c in contributions {
        match totals.iter_mut().find(|(id, _)| *id == c.user_id) {
            Some((_, amount)) => *amount += c.amount,
            None => totals.push((c.user_id, c.amount)),
        }
    }

    let percentages = totals
        .into_iter()
        .map(|(user_id, amount)| Share {
            user_id,
            // Explicit zero: a zero total must not divide.
            percentage: if total == 0.0 {
                0.0
            } else {
                (amount / total) * 100.0
            },
        })
        .collect();

    PoolSummary { total, percentages }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{PaymentStatus, PoolStatus};

    fn pool(visibility: PoolVisibility, owner_id: Uuid) -> Pool {
        Pool {
            id: Uuid::new_v4(),
            owner_id,
            title: "Asado fund".into(),
            description: None,
            is_public: true,
            contributions_visibility: visibility,
            status: PoolStatus::Open,
            currency: "ARS".into(),
            target_amount: None,
            deadline: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn contribution(user_id: Uuid, amount: f64, visible: bool) -> Contribution {
        Contribution {
            id: Uuid::new_v4(),
            pool_id: Uuid::new_v4(),
            user_id,
            amount,
            currency: "ARS".into(),
            is_visible_to_others: visible,
            payment_status: PaymentStatus::Paid,
            payment_provider: "MOCK".into(),
            payment_reference: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_sees_all() {
        let owner = Uuid::new_v4();
        let contributions = vec![
            contribution(owner, 10.0, false),
            contribution(Uuid::new_v4(), 20.0, false),
            contribution(Uuid::new_v4(), 30.0, true),
        ];

        for visibility in [PoolVisibility::Public, PoolVisibility::Anonymous] {
            let filtered = filter_contributions(
                &pool(visibility, owner),
                &contributions,
                Some(owner),
                true,
            );
            assert_eq!(filtered.len(), 3);
        }
    }

    #[test]
    fn test_public_shows_flagged_or_own() {
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let another = Uuid::new_v4();
        let contributions = vec![
            contribution(owner, 10.0, false),
            contribution(viewer, 20.0, false),
            contribution(another, 30.0, true),
        ];

        let filtered = filter_contributions(
            &pool(PoolVisibility::Public, owner),
            &contributions,
            Some(viewer),
            false,
        );

        let ids: Vec<Uuid> = filtered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![contributions[1].id, contributions[2].id]);
    }

    #[test]
    fn test_anonymous_shows_only_own() {
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let contributions = vec![
            contribution(owner, 10.0, true),
            contribution(viewer, 20.0, false),
            contribution(Uuid::new_v4(), 30.0, true),
        ];

        let filtered = filter_contributions(
            &pool(PoolVisibility::Anonymous, owner),
            &contributions,
            Some(viewer),
            false,
        );

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].user_id, viewer);
    }

    #[test]
    fn test_unknown_policy_takes_public_branch() {
        // Anything that deserializes outside the two known variants lands on
        // Public, so the filter only ever special-cases Anonymous.
        let parsed: PoolVisibility = serde_json::from_str("\"FRIENDS_ONLY\"").unwrap();
        let owner = Uuid::new_v4();
        let contributions = vec![
            contribution(Uuid::new_v4(), 10.0, true),
            contribution(Uuid::new_v4(), 20.0, false),
        ];

        let filtered = filter_contributions(&pool(parsed, owner), &contributions, None, false);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, contributions[0].id);
    }

    #[test]
    fn test_missing_viewer_tolerated() {
        let owner = Uuid::new_v4();
        let contributions = vec![contribution(Uuid::new_v4(), 10.0, false)];

        let public =
            filter_contributions(&pool(PoolVisibility::Public, owner), &contributions, None, false);
        assert!(public.is_empty());

        let anonymous = filter_contributions(
            &pool(PoolVisibility::Anonymous, owner),
            &contributions,
            None,
            false,
        );
        assert!(anonymous.is_empty());
    }

    #[test]
    fn test_empty_list() {
        let owner = Uuid::new_v4();
        assert!(filter_contributions(&pool(PoolVisibility::Public, owner), &[], None, false)
            .is_empty());
        assert_eq!(aggregate(&[]).total, 0.0);
        assert!(aggregate(&[]).percentages.is_empty());
    }

    #[test]
    fn test_percentages_per_user() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let contributions = vec![
            contribution(a, 50.0, true),
            contribution(b, 50.0, true),
            contribution(a, 100.0, true),
        ];

        let summary = aggregate(&contributions);
        assert_eq!(summary.total, 200.0);
        // First-occurrence order: a then b.
        assert_eq!(summary.percentages.len(), 2);
        assert_eq!(summary.percentages[0].user_id, a);
        assert_eq!(summary.percentages[0].percentage, 75.0);
        assert_eq!(summary.percentages[1].user_id, b);
        assert_eq!(summary.percentages[1].percentage, 25.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let contributions = vec![
            contribution(Uuid::new_v4(), 33.0, true),
            contribution(Uuid::new_v4(), 41.5, true),
            contribution(Uuid::new_v4(), 7.25, true),
        ];

        let summary = aggregate(&contributions);
        let sum: f64 = summary.percentages.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_reports_zero_percentages() {
        let contributions = vec![
            contribution(Uuid::new_v4(), 0.0, true),
            contribution(Uuid::new_v4(), 0.0, true),
        ];

        let summary = aggregate(&contributions);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.percentages.len(), 2);
        for share in &summary.percentages {
            assert_eq!(share.percentage, 0.0);
        }
    }

    #[test]
    fn test_total_matches_arithmetic_sum() {
        let contributions: Vec<Contribution> = (1..=7)
            .map(|i| contribution(Uuid::new_v4(), f64::from(i) * 12.5, i % 2 == 0))
            .collect();

        let expected: f64 = contributions.iter().map(|c| c.amount).sum();
        assert_eq!(aggregate(&contributions).total, expected);
    }
}
