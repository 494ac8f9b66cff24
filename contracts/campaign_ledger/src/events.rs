//! # Events
//!
//! Every state change publishes one event. Topics are `(symbol, campaign_id)`
//! so off-chain indexers can filter by campaign; the admin hand-over has only
//! the symbol topic.
//!
//! | Topic      | Data                 |
//! |------------|----------------------|
//! | `created`  | [`CampaignCreated`]  |
//! | `funded`   | [`CampaignFunded`]   |
//! | `released` | [`FundsReleased`]    |
//! | `refunded` | [`FundsRefunded`]    |
//! | `admin`    | [`AdminTransferred`] |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignCreated {
    pub campaign_id: u64,
    pub owner: Address,
    pub target: i128,
    pub started_at: u64,
    pub finished_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignFunded {
    pub campaign_id: u64,
    pub contributor: Address,
    pub amount: i128,
}

/// Owner collected a successful campaign.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsReleased {
    pub campaign_id: u64,
    pub owner: Address,
    pub amount: i128,
}

/// Contributor reclaimed their funds from a failed campaign.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsRefunded {
    pub campaign_id: u64,
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminTransferred {
    pub previous: Address,
    pub current: Address,
}

pub fn emit_campaign_created(env: &Env, event: CampaignCreated) {
    env.events()
        .publish((symbol_short!("created"), event.campaign_id), event);
}

pub fn emit_campaign_funded(env: &Env, event: CampaignFunded) {
    env.events()
        .publish((symbol_short!("funded"), event.campaign_id), event);
}

pub fn emit_funds_released(env: &Env, event: FundsReleased) {
    env.events()
        .publish((symbol_short!("released"), event.campaign_id), event);
}

pub fn emit_funds_refunded(env: &Env, event: FundsRefunded) {
    env.events()
        .publish((symbol_short!("refunded"), event.campaign_id), event);
}

pub fn emit_admin_transferred(env: &Env, event: AdminTransferred) {
    env.events().publish((symbol_short!("admin"),), event);
}
