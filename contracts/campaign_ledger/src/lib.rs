//! # Campaign Ledger Contract
//!
//! A crowdfunding ledger: the administrator opens campaigns with a target and
//! a funding window, anyone but the owner contributes while the window is open,
//! and once it closes the campaign settles lazily on each `withdraw` call.
//!
//! | Phase        | Entry Point(s)                                        |
//! |--------------|-------------------------------------------------------|
//! | Bootstrap    | [`CampaignLedger::init`], `transfer_admin`            |
//! | Creation     | [`CampaignLedger::create_campaign`]                   |
//! | Funding      | [`CampaignLedger::fund`]                              |
//! | Settlement   | [`CampaignLedger::withdraw`]                          |
//! | Queries      | `get_campaign`, `get_campaigns`, `campaign_count`, `phase_of`, `phase_at`, `contributed_of`, `withdrawn_of`, `entitlement_of`, `admin`, `token` |
//!
//! ## Settlement
//!
//! | Outcome                  | Owner                         | Contributor                   |
//! |--------------------------|-------------------------------|-------------------------------|
//! | `funded >= target`       | receives `funded`, once       | `CannotCollectSuccessful`     |
//! | `funded < target`        | `OwnerCannotCollectFailed`    | receives own total, once      |
//!
//! Storage access is delegated to [`storage`]; the time and entitlement rules
//! live in [`settlement`]. Every entry point reads the ledger timestamp once.
//! A returned `Err` rolls back the whole invocation, token transfers included.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, token, Address, Env, Vec};

mod events;
mod settlement;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use events::{AdminTransferred, CampaignCreated, CampaignFunded, FundsRefunded, FundsReleased};
pub use types::{Campaign, CampaignConfig, CampaignState, Contribution, Outcome, Phase};

use settlement::Claim;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    Unauthorized             = 1,
    InvalidDateRange         = 2,
    InvalidOwner             = 3,
    InvalidTarget            = 4,
    StartInPast              = 5,
    NotFound                 = 6,
    NotStarted               = 7,
    AlreadyFinished          = 8,
    OwnerCannotFund          = 9,
    InvalidAmount            = 10,
    NotFinished              = 11,
    CannotCollectSuccessful  = 12,
    OwnerCannotCollectFailed = 13,
    NothingToWithdraw        = 14,
    AlreadyInitialized       = 15,
    NotInitialized           = 16,
    Overflow                 = 17,
}

/// Largest page `get_campaigns` returns in one call.
pub const MAX_PAGE_SIZE: u32 = 20;

#[contract]
pub struct CampaignLedger;

#[contractimpl]
impl CampaignLedger {
    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Initialise the ledger with its administrator and the token every
    /// contribution and payout is denominated in.
    ///
    /// Must be called exactly once after deployment.
    pub fn init(env: Env, admin: Address, token: Address) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();

        storage::set_admin(&env, &admin);
        storage::set_token(&env, &token);
        Ok(())
    }

    /// Hand the administrator role to `new_admin`.
    pub fn transfer_admin(env: Env, current_admin: Address, new_admin: Address) -> Result<(), Error> {
        current_admin.require_auth();
        require_admin(&env, &current_admin)?;

        storage::set_admin(&env, &new_admin);
        events::emit_admin_transferred(
            &env,
            AdminTransferred {
                previous: current_admin,
                current: new_admin,
            },
        );
        Ok(())
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        storage::get_admin(&env).ok_or(Error::NotInitialized)
    }

    pub fn token(env: Env) -> Result<Address, Error> {
        storage::get_token(&env).ok_or(Error::NotInitialized)
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Open a new campaign and return its sequential ID.
    ///
    /// Checks, in order: `caller` is the administrator, `started_at <
    /// finished_at`, `owner` is not the ledger itself, `target > 0`, and
    /// `started_at` is not before the current ledger time.
    pub fn create_campaign(
        env: Env,
        caller: Address,
        owner: Address,
        target: i128,
        started_at: u64,
        finished_at: u64,
    ) -> Result<u64, Error> {
        caller.require_auth();
        require_admin(&env, &caller)?;

        if started_at >= finished_at {
            return Err(Error::InvalidDateRange);
        }
        // The ledger's own address is the custody account and the null owner.
        if owner == env.current_contract_address() {
            return Err(Error::InvalidOwner);
        }
        if target <= 0 {
            return Err(Error::InvalidTarget);
        }
        if started_at < env.ledger().timestamp() {
            return Err(Error::StartInPast);
        }

        let id = storage::get_and_increment_campaign_id(&env);
        let config = CampaignConfig {
            id,
            owner: owner.clone(),
            target,
            started_at,
            finished_at,
        };
        storage::save_new_campaign(&env, &config);

        events::emit_campaign_created(
            &env,
            CampaignCreated {
                campaign_id: id,
                owner,
                target,
                started_at,
                finished_at,
            },
        );
        Ok(id)
    }

    /// Contribute `amount` to an active campaign.
    ///
    /// The tokens move from `contributor` into the ledger's custody in the
    /// same invocation as the bookkeeping.
    pub fn fund(env: Env, campaign_id: u64, contributor: Address, amount: i128) -> Result<(), Error> {
        contributor.require_auth();

        let config = storage::load_config(&env, campaign_id).ok_or(Error::NotFound)?;
        let now = env.ledger().timestamp();
        settlement::check_funding_window(config.started_at, config.finished_at, now)?;

        if contributor == config.owner {
            return Err(Error::OwnerCannotFund);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let mut state = storage::load_state(&env, campaign_id);
        state.funded = state.funded.checked_add(amount).ok_or(Error::Overflow)?;

        let contributed = storage::contributed_of(&env, campaign_id, &contributor);
        if contributed == 0 {
            state.contributor_count += 1;
        }
        let contributed = contributed.checked_add(amount).ok_or(Error::Overflow)?;

        let token = storage::get_token(&env).ok_or(Error::NotInitialized)?;
        token::Client::new(&env, &token).transfer(
            &contributor,
            &env.current_contract_address(),
            &amount,
        );

        storage::set_contributed(&env, campaign_id, &contributor, contributed);
        storage::append_contribution(
            &env,
            campaign_id,
            Contribution {
                contributor: contributor.clone(),
                amount,
            },
        );
        storage::save_state(&env, campaign_id, &state);

        events::emit_campaign_funded(
            &env,
            CampaignFunded {
                campaign_id,
                contributor,
                amount,
            },
        );
        Ok(())
    }

    /// Claim whatever `caller` is owed by a finished campaign and return the
    /// amount paid.
    ///
    /// The payout is recorded before the token transfer is made.
    pub fn withdraw(env: Env, campaign_id: u64, caller: Address) -> Result<i128, Error> {
        caller.require_auth();

        let config = storage::load_config(&env, campaign_id).ok_or(Error::NotFound)?;
        let now = env.ledger().timestamp();
        settlement::check_settled(config.finished_at, now)?;

        let state = storage::load_state(&env, campaign_id);
        let outcome = settlement::outcome(state.funded, config.target);
        let claim = claim_of(&env, &config, &caller);
        let amount = settlement::entitlement(outcome, state.funded, &claim)?;

        storage::set_withdrawn(&env, campaign_id, &caller, claim.withdrawn + amount);

        let token = storage::get_token(&env).ok_or(Error::NotInitialized)?;
        token::Client::new(&env, &token).transfer(&env.current_contract_address(), &caller, &amount);

        match outcome {
            Outcome::Succeeded => events::emit_funds_released(
                &env,
                FundsReleased {
                    campaign_id,
                    owner: caller,
                    amount,
                },
            ),
            Outcome::Failed => events::emit_funds_refunded(
                &env,
                FundsRefunded {
                    campaign_id,
                    contributor: caller,
                    amount,
                },
            ),
        }
        Ok(amount)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_campaign(env: Env, campaign_id: u64) -> Result<Campaign, Error> {
        storage::load_campaign(&env, campaign_id).ok_or(Error::NotFound)
    }

    /// Up to `limit` campaigns starting at ID `start`, in creation order.
    ///
    /// `limit` is capped at [`MAX_PAGE_SIZE`]; page through with
    /// `campaign_count` to enumerate the whole ledger.
    pub fn get_campaigns(env: Env, start: u64, limit: u32) -> Vec<Campaign> {
        let count = storage::campaign_count(&env);
        let end = start
            .saturating_add(limit.min(MAX_PAGE_SIZE) as u64)
            .min(count);

        let mut campaigns = Vec::new(&env);
        for id in start..end {
            if let Some(campaign) = storage::load_campaign(&env, id) {
                campaigns.push_back(campaign);
            }
        }
        campaigns
    }

    pub fn campaign_count(env: Env) -> u64 {
        storage::campaign_count(&env)
    }

    /// Phase of the campaign at the current ledger time.
    pub fn phase_of(env: Env, campaign_id: u64) -> Result<Phase, Error> {
        let now = env.ledger().timestamp();
        Self::phase_at(env, campaign_id, now)
    }

    /// Phase of the campaign at a caller-supplied time.
    pub fn phase_at(env: Env, campaign_id: u64, now: u64) -> Result<Phase, Error> {
        let config = storage::load_config(&env, campaign_id).ok_or(Error::NotFound)?;
        Ok(settlement::phase(config.started_at, config.finished_at, now))
    }

    pub fn contributed_of(env: Env, campaign_id: u64, who: Address) -> i128 {
        storage::contributed_of(&env, campaign_id, &who)
    }

    pub fn withdrawn_of(env: Env, campaign_id: u64, who: Address) -> i128 {
        storage::withdrawn_of(&env, campaign_id, &who)
    }

    /// What `withdraw` would pay `who` right now; zero when it would fail.
    pub fn entitlement_of(env: Env, campaign_id: u64, who: Address) -> Result<i128, Error> {
        let config = storage::load_config(&env, campaign_id).ok_or(Error::NotFound)?;
        if settlement::check_settled(config.finished_at, env.ledger().timestamp()).is_err() {
            return Ok(0);
        }

        let state = storage::load_state(&env, campaign_id);
        let outcome = settlement::outcome(state.funded, config.target);
        let claim = claim_of(&env, &config, &who);
        Ok(settlement::entitlement(outcome, state.funded, &claim).unwrap_or(0))
    }
}

fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin = storage::get_admin(env).ok_or(Error::NotInitialized)?;
    if *caller != admin {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

fn claim_of(env: &Env, config: &CampaignConfig, who: &Address) -> Claim {
    Claim {
        is_owner: *who == config.owner,
        contributed: storage::contributed_of(env, config.id, who),
        withdrawn: storage::withdrawn_of(env, config.id, who),
    }
}
