//! # Types
//!
//! Shared data structures used across all modules of the campaign ledger.
//!
//! ## Config / State split
//!
//! A `Campaign` is internally stored as separate ledger entries:
//!
//! - [`CampaignConfig`]: written once at creation; never mutated.
//! - [`CampaignState`]: written on every contribution.
//! - the contribution list: appended on every contribution.
//!
//! The public API exposes the reconstructed [`Campaign`] struct.
//!
//! ## No stored status
//!
//! Campaigns carry no status field. [`Phase`] is derived from
//! `started_at`, `finished_at` and the ledger timestamp on every read
//! (see [`crate::settlement`]):
//!
//! ```text
//! NotStarted ──► Active ──► Finished
//! ```

use soroban_sdk::{contracttype, Address, Vec};

/// Time-derived lifecycle phase of a campaign.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The window has not opened yet.
    NotStarted,
    /// Inside the funding window.
    Active,
    /// The window has closed; payouts are claimable.
    Finished,
}

/// Settlement result of a finished campaign.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// `funded >= target`: the owner collects everything.
    Succeeded,
    /// `funded < target`: every contributor is refunded.
    Failed,
}

/// One recorded transfer of value into a campaign.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub contributor: Address,
    pub amount: i128,
}

/// Immutable campaign configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignConfig {
    pub id: u64,
    pub owner: Address,
    pub target: i128,
    pub started_at: u64,
    pub finished_at: u64,
}

/// Mutable campaign totals, updated on every contribution.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CampaignState {
    /// Running total of all contributions.
    pub funded: i128,
    /// Number of distinct contributors.
    pub contributor_count: u32,
}

/// Full representation of a funding campaign.
///
/// Used as the public API return type; reconstructed internally from
/// the config, state and contribution entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Campaign {
    /// Sequential identifier, assigned in creation order starting at 0.
    pub id: u64,
    /// Beneficiary of a successful campaign.
    pub owner: Address,
    /// Amount that must be reached for the campaign to succeed.
    pub target: i128,
    /// Ledger timestamp at which funding opens.
    pub started_at: u64,
    /// Ledger timestamp at which funding closes.
    pub finished_at: u64,
    /// Sum of every recorded contribution.
    pub funded: i128,
    /// Number of distinct contributors.
    pub contributor_count: u32,
    /// Contributions in insertion order.
    pub contributions: Vec<Contribution>,
}
