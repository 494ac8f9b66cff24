//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type      | Description                        |
//! |------------------|-----------|------------------------------------|
//! | `Admin`          | `Address` | Ledger administrator               |
//! | `Token`          | `Address` | Asset used for every transfer      |
//! | `CampaignCount`  | `u64`     | Auto-increment campaign ID counter |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                       | Type                | Description                        |
//! |---------------------------|---------------------|------------------------------------|
//! | `Config(id)`              | `CampaignConfig`    | Immutable campaign configuration   |
//! | `State(id)`               | `CampaignState`     | Running totals                     |
//! | `Contributions(id)`       | `Vec<Contribution>` | Append-only contribution list      |
//! | `Contributed(id, addr)`   | `i128`              | Per-identity contributed sum       |
//! | `Withdrawn(id, addr)`     | `i128`              | Per-identity amount already paid   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Missing per-identity entries read as zero.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{Campaign, CampaignConfig, CampaignState, Contribution};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Ledger administrator (Instance).
    Admin,
    /// Token contract used for value transfer (Instance).
    Token,
    /// Global auto-increment counter for campaign IDs (Instance).
    CampaignCount,
    /// Immutable campaign configuration keyed by ID (Persistent).
    Config(u64),
    /// Mutable campaign totals keyed by ID (Persistent).
    State(u64),
    /// Contribution list keyed by ID (Persistent).
    Contributions(u64),
    /// Contributed sum per (campaign, identity) (Persistent).
    Contributed(u64, Address),
    /// Withdrawn sum per (campaign, identity) (Persistent).
    Withdrawn(u64, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Admin)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn get_token(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Token)
}

/// Number of campaigns created so far, which is also the next ID.
pub fn campaign_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::CampaignCount)
        .unwrap_or(0)
}

/// Atomically reads, increments, and stores the campaign counter.
/// Returns the ID to use for the *current* campaign (pre-increment value).
pub fn get_and_increment_campaign_id(env: &Env) -> u64 {
    let current = campaign_count(env);
    env.storage()
        .instance()
        .set(&DataKey::CampaignCount, &(current + 1));
    current
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn read_persistent<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

fn write_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

/// Write the configuration, zeroed state and empty contribution list of a
/// freshly created campaign.
pub fn save_new_campaign(env: &Env, config: &CampaignConfig) {
    write_persistent(env, &DataKey::Config(config.id), config);
    write_persistent(env, &DataKey::State(config.id), &CampaignState::default());
    write_persistent(
        env,
        &DataKey::Contributions(config.id),
        &Vec::<Contribution>::new(env),
    );
}

/// Load only the immutable campaign configuration.
pub fn load_config(env: &Env, id: u64) -> Option<CampaignConfig> {
    read_persistent(env, &DataKey::Config(id))
}

pub fn load_state(env: &Env, id: u64) -> CampaignState {
    read_persistent(env, &DataKey::State(id)).unwrap_or_default()
}

pub fn save_state(env: &Env, id: u64, state: &CampaignState) {
    write_persistent(env, &DataKey::State(id), state);
}

pub fn load_contributions(env: &Env, id: u64) -> Vec<Contribution> {
    read_persistent(env, &DataKey::Contributions(id)).unwrap_or_else(|| Vec::new(env))
}

pub fn append_contribution(env: &Env, id: u64, contribution: Contribution) {
    let mut contributions = load_contributions(env, id);
    contributions.push_back(contribution);
    write_persistent(env, &DataKey::Contributions(id), &contributions);
}

pub fn contributed_of(env: &Env, id: u64, who: &Address) -> i128 {
    read_persistent(env, &DataKey::Contributed(id, who.clone())).unwrap_or(0)
}

pub fn set_contributed(env: &Env, id: u64, who: &Address, amount: i128) {
    write_persistent(env, &DataKey::Contributed(id, who.clone()), &amount);
}

pub fn withdrawn_of(env: &Env, id: u64, who: &Address) -> i128 {
    read_persistent(env, &DataKey::Withdrawn(id, who.clone())).unwrap_or(0)
}

pub fn set_withdrawn(env: &Env, id: u64, who: &Address, amount: i128) {
    write_persistent(env, &DataKey::Withdrawn(id, who.clone()), &amount);
}

/// Load the full `Campaign` by combining config, state and contributions.
pub fn load_campaign(env: &Env, id: u64) -> Option<Campaign> {
    let config = load_config(env, id)?;
    let state = load_state(env, id);
    Some(Campaign {
        id: config.id,
        owner: config.owner,
        target: config.target,
        started_at: config.started_at,
        finished_at: config.finished_at,
        funded: state.funded,
        contributor_count: state.contributor_count,
        contributions: load_contributions(env, id),
    })
}
