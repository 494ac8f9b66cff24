//! Canonical event types emitted by the campaign ledger contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/campaign_ledger/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the campaign ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A campaign was opened (`created` topic).
    CampaignCreated,
    /// A contribution was recorded (`funded` topic).
    CampaignFunded,
    /// The owner collected a successful campaign (`released` topic).
    FundsReleased,
    /// A contributor was refunded from a failed campaign (`refunded` topic).
    FundsRefunded,
    /// The administrator role changed hands (`admin` topic).
    AdminTransferred,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::CampaignCreated,
            "funded" => Self::CampaignFunded,
            "released" => Self::FundsReleased,
            "refunded" => Self::FundsRefunded,
            "admin" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignCreated => "campaign_created",
            Self::CampaignFunded => "campaign_funded",
            Self::FundsReleased => "funds_released",
            Self::FundsRefunded => "funds_refunded",
            Self::AdminTransferred => "admin_transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_stored(s: &str) -> Self {
        match s {
            "campaign_created" => Self::CampaignCreated,
            "campaign_funded" => Self::CampaignFunded,
            "funds_released" => Self::FundsReleased,
            "funds_refunded" => Self::FundsRefunded,
            "admin_transferred" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded ledger event, ready to be stored in the database.
///
/// Amounts are kept as decimal strings since the contract uses `i128`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// RPC event id; the deduplication key.
    pub event_id: String,
    pub event_type: String,
    pub campaign_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Window bounds, only present on `campaign_created`.
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub campaign_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}
