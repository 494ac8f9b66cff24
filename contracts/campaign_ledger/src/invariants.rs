#![allow(dead_code)]

extern crate std;

use std::collections::BTreeMap;

use soroban_sdk::Address;

use crate::types::Campaign;

/// INV-1: Target must always be positive.
pub fn assert_target_positive(campaign: &Campaign) {
    assert!(
        campaign.target > 0,
        "INV-1 violated: campaign {} has non-positive target ({})",
        campaign.id,
        campaign.target
    );
}

/// INV-2: The window opens strictly before it closes.
pub fn assert_window_ordered(campaign: &Campaign) {
    assert!(
        campaign.started_at < campaign.finished_at,
        "INV-2 violated: campaign {} window [{}, {}] is not ordered",
        campaign.id,
        campaign.started_at,
        campaign.finished_at
    );
}

/// INV-3: `funded` equals the sum of recorded contributions.
pub fn assert_funded_matches_contributions(campaign: &Campaign) {
    let sum: i128 = campaign.contributions.iter().map(|c| c.amount).sum();
    assert_eq!(
        campaign.funded, sum,
        "INV-3 violated: campaign {} funded {} but contributions sum to {}",
        campaign.id, campaign.funded, sum
    );
}

/// INV-4: The owner never appears as a contributor on their own campaign.
pub fn assert_owner_not_contributor(campaign: &Campaign) {
    for contribution in campaign.contributions.iter() {
        assert!(
            contribution.contributor != campaign.owner,
            "INV-4 violated: owner contributed to campaign {}",
            campaign.id
        );
    }
}

/// INV-5: Every contribution is strictly positive.
pub fn assert_contributions_positive(campaign: &Campaign) {
    for contribution in campaign.contributions.iter() {
        assert!(
            contribution.amount > 0,
            "INV-5 violated: campaign {} holds a contribution of {}",
            campaign.id,
            contribution.amount
        );
    }
}

/// INV-6: `contributor_count` equals the number of distinct contributors.
pub fn assert_contributor_count(campaign: &Campaign) {
    let distinct = contributed_totals(campaign).len() as u32;
    assert_eq!(
        campaign.contributor_count, distinct,
        "INV-6 violated: campaign {} counts {} contributors, list has {}",
        campaign.id, campaign.contributor_count, distinct
    );
}

/// INV-7: Campaign IDs are sequential starting from 0.
pub fn assert_sequential_ids(campaigns: &[Campaign]) {
    for (i, campaign) in campaigns.iter().enumerate() {
        assert_eq!(
            campaign.id, i as u64,
            "INV-7 violated: expected id {}, got {}",
            i, campaign.id
        );
    }
}

/// INV-8: `funded` never decreases.
pub fn assert_funded_monotonic(before: i128, after: i128) {
    assert!(
        after >= before,
        "INV-8 violated: funded decreased from {} to {}",
        before,
        after
    );
}

/// INV-9: Fields fixed at creation remain unchanged.
pub fn assert_immutable_fields(original: &Campaign, current: &Campaign) {
    assert_eq!(original.id, current.id, "INV-9 violated: campaign id changed");
    assert_eq!(original.owner, current.owner, "INV-9 violated: campaign owner changed");
    assert_eq!(original.target, current.target, "INV-9 violated: campaign target changed");
    assert_eq!(
        original.started_at, current.started_at,
        "INV-9 violated: campaign started_at changed"
    );
    assert_eq!(
        original.finished_at, current.finished_at,
        "INV-9 violated: campaign finished_at changed"
    );
}

/// INV-10: Contributions are append-only: the earlier list is a prefix of the later one.
pub fn assert_contributions_append_only(original: &Campaign, current: &Campaign) {
    assert!(
        current.contributions.len() >= original.contributions.len(),
        "INV-10 violated: campaign {} lost contributions",
        current.id
    );
    for (i, contribution) in original.contributions.iter().enumerate() {
        assert_eq!(
            current.contributions.get(i as u32),
            Some(contribution),
            "INV-10 violated: contribution {} of campaign {} was rewritten",
            i,
            current.id
        );
    }
}

/// INV-11: Nobody is paid more than they are entitled to.
pub fn assert_withdrawn_within_entitlement(campaign: &Campaign, who: &Address, withdrawn: i128) {
    let ceiling = if *who == campaign.owner {
        campaign.funded
    } else {
        contributed_totals(campaign).get(who).copied().unwrap_or(0)
    };
    assert!(
        withdrawn <= ceiling,
        "INV-11 violated: {} withdrawn from campaign {} exceeds entitlement {}",
        withdrawn,
        campaign.id,
        ceiling
    );
}

/// Per-contributor sums recomputed from the contribution list.
pub fn contributed_totals(campaign: &Campaign) -> BTreeMap<Address, i128> {
    let mut totals = BTreeMap::new();
    for contribution in campaign.contributions.iter() {
        *totals.entry(contribution.contributor).or_insert(0) += contribution.amount;
    }
    totals
}

/// Run all stateless campaign invariants.
pub fn assert_all_campaign_invariants(campaign: &Campaign) {
    assert_target_positive(campaign);
    assert_window_ordered(campaign);
    assert_funded_matches_contributions(campaign);
    assert_owner_not_contributor(campaign);
    assert_contributions_positive(campaign);
    assert_contributor_count(campaign);
}
