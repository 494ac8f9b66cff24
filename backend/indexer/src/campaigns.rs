//! Per-campaign read model folded from the indexed event stream.
//!
//! The contract never stores a status, so the phase here is derived from the
//! window bounds and a caller-supplied clock, the same way the contract's
//! `phase_at` query does it.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::events::{EventKind, EventRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Active,
    Finished,
}

impl Phase {
    pub fn at(started_at: i64, finished_at: i64, now: i64) -> Self {
        if now <= started_at {
            Self::NotStarted
        } else if now <= finished_at {
            Self::Active
        } else {
            Self::Finished
        }
    }

    /// Human-readable label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Active => "in progress",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub owner: Option<String>,
    /// Decimal strings, matching how amounts are stored.
    pub target: String,
    pub funded: String,
    pub released: String,
    pub refunded: String,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub contributions: u64,
    pub contributors: usize,
    pub phase: Option<Phase>,
    pub status: Option<&'static str>,
    /// Only known once the window has closed.
    pub outcome: Option<Outcome>,
    /// One-line description, e.g. `Campaign 0 is in progress funded 12/30 owner is G…`.
    pub description: String,
}

#[derive(Default)]
struct Tally {
    owner: Option<String>,
    target: i128,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    funded: i128,
    released: i128,
    refunded: i128,
    contributions: u64,
    contributors: BTreeMap<String, i128>,
}

/// Fold `events` into one summary per campaign, ordered by numeric id.
///
/// Events without a campaign id (admin transfers) are skipped. Campaigns
/// whose `created` event has not been indexed yet still get a summary, with
/// an unknown window and phase.
pub fn summarize(events: &[EventRecord], now: i64) -> Vec<CampaignSummary> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();

    for ev in events {
        let Some(campaign_id) = ev.campaign_id.as_ref() else {
            continue;
        };
        let tally = tallies.entry(campaign_id.clone()).or_default();
        let amount = parse_amount(ev);

        match ev.kind() {
            EventKind::CampaignCreated => {
                tally.owner = ev.actor.clone();
                tally.target = amount;
                tally.started_at = ev.started_at;
                tally.finished_at = ev.finished_at;
            }
            EventKind::CampaignFunded => {
                tally.funded = tally.funded.saturating_add(amount);
                tally.contributions += 1;
                if let Some(actor) = &ev.actor {
                    *tally.contributors.entry(actor.clone()).or_insert(0) += amount;
                }
            }
            EventKind::FundsReleased => tally.released = tally.released.saturating_add(amount),
            EventKind::FundsRefunded => tally.refunded = tally.refunded.saturating_add(amount),
            EventKind::AdminTransferred | EventKind::Unknown => {}
        }
    }

    let mut summaries: Vec<CampaignSummary> = tallies
        .into_iter()
        .map(|(campaign_id, tally)| into_summary(campaign_id, tally, now))
        .collect();
    summaries.sort_by_key(|s| s.campaign_id.parse::<u64>().unwrap_or(u64::MAX));
    summaries
}

/// Summary of a single campaign, if any event mentions it.
pub fn summarize_one(events: &[EventRecord], campaign_id: &str, now: i64) -> Option<CampaignSummary> {
    summarize(events, now)
        .into_iter()
        .find(|s| s.campaign_id == campaign_id)
}

fn into_summary(campaign_id: String, tally: Tally, now: i64) -> CampaignSummary {
    let phase = match (tally.started_at, tally.finished_at) {
        (Some(start), Some(end)) => Some(Phase::at(start, end, now)),
        _ => None,
    };
    let outcome = match phase {
        Some(Phase::Finished) if tally.funded >= tally.target => Some(Outcome::Succeeded),
        Some(Phase::Finished) => Some(Outcome::Failed),
        _ => None,
    };
    let status = phase.map(|p| p.label());
    let description = format!(
        "Campaign {} is {} funded {}/{} owner is {}",
        campaign_id,
        status.unwrap_or("unknown"),
        tally.funded,
        tally.target,
        tally.owner.as_deref().unwrap_or("unknown"),
    );

    CampaignSummary {
        campaign_id,
        owner: tally.owner,
        target: tally.target.to_string(),
        funded: tally.funded.to_string(),
        released: tally.released.to_string(),
        refunded: tally.refunded.to_string(),
        started_at: tally.started_at,
        finished_at: tally.finished_at,
        contributions: tally.contributions,
        contributors: tally.contributors.len(),
        phase,
        status,
        outcome,
        description,
    }
}

fn parse_amount(ev: &EventRecord) -> i128 {
    match ev.amount.as_deref() {
        None => 0,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(event_id = ev.id, amount = raw, "Unparseable amount, counting as 0");
            0
        }),
    }
}
