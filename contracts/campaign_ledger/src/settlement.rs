//! # Settlement rules
//!
//! Pure functions of `(started_at, finished_at, funded, target, now)` that gate
//! `fund` and `withdraw`. Nothing here touches storage.
//!
//! Boundaries:
//!
//! | Check             | Holds when                         |
//! |-------------------|------------------------------------|
//! | display phase     | see [`phase`]                      |
//! | accepts funding   | `started_at <= now < finished_at`  |
//! | settled           | `now > finished_at`                |

use crate::types::{Outcome, Phase};
use crate::Error;

/// Display phase of a campaign window at `now`.
pub fn phase(started_at: u64, finished_at: u64, now: u64) -> Phase {
    if now <= started_at {
        Phase::NotStarted
    } else if now <= finished_at {
        Phase::Active
    } else {
        Phase::Finished
    }
}

/// Gate for `fund`. Reports which side of the window `now` falls on.
pub fn check_funding_window(started_at: u64, finished_at: u64, now: u64) -> Result<(), Error> {
    if now < started_at {
        return Err(Error::NotStarted);
    }
    if now >= finished_at {
        return Err(Error::AlreadyFinished);
    }
    Ok(())
}

/// Gate for `withdraw`.
pub fn check_settled(finished_at: u64, now: u64) -> Result<(), Error> {
    if now > finished_at {
        Ok(())
    } else {
        Err(Error::NotFinished)
    }
}

pub fn outcome(funded: i128, target: i128) -> Outcome {
    if funded >= target {
        Outcome::Succeeded
    } else {
        Outcome::Failed
    }
}

/// What a single identity stands in a finished campaign.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Claim {
    pub is_owner: bool,
    /// Sum of the identity's own contributions.
    pub contributed: i128,
    /// Amount already paid out to the identity.
    pub withdrawn: i128,
}

/// Amount payable to `claim` under `outcome`, or the reason nothing is.
///
/// The owner of a successful campaign is entitled to the full `funded` total;
/// a contributor of a failed campaign to their own contributed sum. Whatever
/// was already withdrawn is subtracted, so a second claim yields
/// [`Error::NothingToWithdraw`].
pub fn entitlement(outcome: Outcome, funded: i128, claim: &Claim) -> Result<i128, Error> {
    let owed = match outcome {
        Outcome::Succeeded if claim.is_owner => funded,
        Outcome::Succeeded if claim.contributed > 0 => return Err(Error::CannotCollectSuccessful),
        Outcome::Succeeded => 0,
        Outcome::Failed if claim.is_owner => return Err(Error::OwnerCannotCollectFailed),
        Outcome::Failed => claim.contributed,
    };

    let payable = owed.saturating_sub(claim.withdrawn);
    if payable <= 0 {
        return Err(Error::NothingToWithdraw);
    }
    Ok(payable)
}
