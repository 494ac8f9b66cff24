//! Soroban RPC client: polls `getEvents` and decodes campaign ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, LedgerEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

/// One event as returned by `getEvents` with `xdrFormat: "json"`, where
/// topics and data arrive as ScVal JSON (`{"symbol": "funded"}`,
/// `{"map": [{"key": …, "val": …}]}`) instead of base64 XDR.
#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    /// Unique per event across the whole network.
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`      : optional opaque pagination cursor from a previous response.
/// * `limit`       : maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                backoff = back_off(backoff).await;
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    backoff = back_off(backoff).await;
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    if is_hard_error(err.code) {
                        return Err(IndexerError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    backoff = back_off(backoff).await;
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    IndexerError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

/// Sleep for `current` seconds and return the next, doubled, delay.
async fn back_off(current: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(current)).await;
    next_backoff(current)
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

/// Invalid request / unknown method: retrying cannot help.
fn is_hard_error(code: i64) -> bool {
    matches!(code, -32600 | -32601)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`LedgerEvent`] structs.
///
/// Events from failed invocations are dropped: their state changes were
/// rolled back, so they never happened as far as the ledger is concerned.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<LedgerEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<LedgerEvent> {
    let Some(event_id) = raw.id.clone().or_else(|| raw.paging_token.clone()) else {
        warn!(ledger = ?raw.ledger, tx = ?raw.tx_hash, "Event without an id, skipping");
        return None;
    };

    // Leading topic symbol determines the event type.
    let kind = EventKind::from_topic(&scval_string(raw.topic_json.first()?)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let value = &raw.value_json;

    // Every campaign event carries the campaign id as its second topic.
    let campaign_id = match kind {
        EventKind::AdminTransferred | EventKind::Unknown => None,
        _ => raw
            .topic_json
            .get(1)
            .and_then(scval_string)
            .or_else(|| field(value, "campaign_id")),
    };

    let (actor, amount) = match kind {
        EventKind::CampaignCreated => (field(value, "owner"), field(value, "target")),
        EventKind::CampaignFunded | EventKind::FundsRefunded => {
            (field(value, "contributor"), field(value, "amount"))
        }
        EventKind::FundsReleased => (field(value, "owner"), field(value, "amount")),
        EventKind::AdminTransferred => (field(value, "current"), None),
        EventKind::Unknown => (None, None),
    };

    let (started_at, finished_at) = match kind {
        EventKind::CampaignCreated => (
            field(value, "started_at").and_then(|s| s.parse().ok()),
            field(value, "finished_at").and_then(|s| s.parse().ok()),
        ),
        _ => (None, None),
    };

    Some(LedgerEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        campaign_id,
        actor,
        amount,
        started_at,
        finished_at,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Look up `key` in a contract struct, which arrives as an ScVal map keyed by symbols.
fn field(value: &Value, key: &str) -> Option<String> {
    value
        .get("map")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("key").and_then(scval_string).as_deref() == Some(key))
        .and_then(|entry| entry.get("val"))
        .and_then(scval_string)
}

/// Render a scalar ScVal (`{"symbol": …}`, `{"u64": …}`, `{"i128": …}`, …) as a string.
fn scval_string(value: &Value) -> Option<String> {
    let Value::Object(map) = value else {
        return None;
    };
    let (tag, inner) = map.iter().next()?;
    match tag.as_str() {
        "symbol" | "string" | "address" => inner.as_str().map(String::from),
        "u32" | "i32" | "u64" | "i64" | "timepoint" | "duration" | "u128" | "i128" => {
            match inner {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                // Older encoders split 128-bit integers into hi/lo words.
                Value::Object(_) => hi_lo_to_string(inner),
                _ => None,
            }
        }
        _ => None,
    }
}

fn hi_lo_to_string(parts: &Value) -> Option<String> {
    let word = |key: &str| -> Option<i128> {
        match parts.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from)),
            Value::String(s) => s
                .parse::<i64>()
                .map(i128::from)
                .or_else(|_| s.parse::<u64>().map(i128::from))
                .ok(),
            _ => None,
        }
    };
    let hi = word("hi")?;
    let lo = word("lo")?;
    Some(((hi << 64) + lo).to_string())
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(s: &str) -> Value {
        json!({ "symbol": s })
    }

    fn entry(key: &str, val: Value) -> Value {
        json!({ "key": { "symbol": key }, "val": val })
    }

    fn raw_event(id: &str, topics: Vec<Value>, value: Value) -> RawEvent {
        RawEvent {
            topic_json: topics,
            value_json: value,
            contract_id: Some("CONTRACT1".to_string()),
            tx_hash: Some("TX1".to_string()),
            id: Some(id.to_string()),
            ledger: Some(1000),
            ledger_closed_at: Some("2024-01-01T00:00:00Z".to_string()),
            in_successful_contract_call: Some(true),
            paging_token: None,
        }
    }

    #[test]
    fn event_kind_from_topic() {
        assert_eq!(EventKind::from_topic("created"), EventKind::CampaignCreated);
        assert_eq!(EventKind::from_topic("funded"), EventKind::CampaignFunded);
        assert_eq!(EventKind::from_topic("released"), EventKind::FundsReleased);
        assert_eq!(EventKind::from_topic("refunded"), EventKind::FundsRefunded);
        assert_eq!(EventKind::from_topic("admin"), EventKind::AdminTransferred);
        assert_eq!(EventKind::from_topic("something_else"), EventKind::Unknown);
    }

    #[test]
    fn event_kind_stored_name_round_trips() {
        for kind in [
            EventKind::CampaignCreated,
            EventKind::CampaignFunded,
            EventKind::FundsReleased,
            EventKind::FundsRefunded,
            EventKind::AdminTransferred,
        ] {
            assert_eq!(EventKind::from_stored(kind.as_str()), kind);
        }
    }

    #[test]
    fn raw_event_deserializes_from_rpc_json() {
        let body = json!({
            "type": "contract",
            "ledger": 1234,
            "ledgerClosedAt": "2024-01-01T00:00:00Z",
            "contractId": "CCONTRACT",
            "id": "0005299591346393088-0000000001",
            "pagingToken": "0005299591346393088-0000000001",
            "inSuccessfulContractCall": true,
            "txHash": "abcd",
            "topicJson": [{ "symbol": "funded" }, { "u64": "3" }],
            "valueJson": { "map": [
                { "key": { "symbol": "amount" }, "val": { "i128": "750" } },
                { "key": { "symbol": "campaign_id" }, "val": { "u64": "3" } },
                { "key": { "symbol": "contributor" }, "val": { "address": "GALICE" } }
            ] }
        });
        let raw: RawEvent = serde_json::from_value(body).unwrap();

        let ev = &decode_events(&[raw], "CCONTRACT")[0];
        assert_eq!(ev.event_id, "0005299591346393088-0000000001");
        assert_eq!(ev.event_type, "campaign_funded");
        assert_eq!(ev.campaign_id.as_deref(), Some("3"));
        assert_eq!(ev.actor.as_deref(), Some("GALICE"));
        assert_eq!(ev.amount.as_deref(), Some("750"));
        assert_eq!(ev.ledger, 1234);
        assert_eq!(ev.timestamp, 1_704_067_200);
    }

    #[test]
    fn decode_created_event() {
        let raw = raw_event(
            "e1",
            vec![symbol("created"), json!({ "u64": 0 })],
            json!({ "map": [
                entry("campaign_id", json!({ "u64": 0 })),
                entry("finished_at", json!({ "u64": "1700518400" })),
                entry("owner", json!({ "address": "GOWNER" })),
                entry("started_at", json!({ "u64": "1700345600" })),
                entry("target", json!({ "i128": "30" })),
            ] }),
        );

        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.event_type, "campaign_created");
        assert_eq!(ev.campaign_id.as_deref(), Some("0"));
        assert_eq!(ev.actor.as_deref(), Some("GOWNER"));
        assert_eq!(ev.amount.as_deref(), Some("30"));
        assert_eq!(ev.started_at, Some(1_700_345_600));
        assert_eq!(ev.finished_at, Some(1_700_518_400));
    }

    #[test]
    fn decode_refunded_event() {
        let raw = raw_event(
            "e2",
            vec![symbol("refunded"), json!({ "u64": "7" })],
            json!({ "map": [
                entry("amount", json!({ "i128": "15" })),
                entry("campaign_id", json!({ "u64": "7" })),
                entry("contributor", json!({ "address": "GALICE" })),
            ] }),
        );

        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "funds_refunded");
        assert_eq!(ev.campaign_id.as_deref(), Some("7"));
        assert_eq!(ev.actor.as_deref(), Some("GALICE"));
        assert_eq!(ev.amount.as_deref(), Some("15"));
        assert_eq!(ev.started_at, None);
    }

    #[test]
    fn decode_admin_event_has_no_campaign() {
        let raw = raw_event(
            "e3",
            vec![symbol("admin")],
            json!({ "map": [
                entry("current", json!({ "address": "GNEW" })),
                entry("previous", json!({ "address": "GOLD" })),
            ] }),
        );

        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "admin_transferred");
        assert_eq!(ev.campaign_id, None);
        assert_eq!(ev.actor.as_deref(), Some("GNEW"));
    }

    #[test]
    fn i128_hi_lo_parts_are_joined() {
        assert_eq!(
            scval_string(&json!({ "i128": { "hi": 0, "lo": 5000 } })).as_deref(),
            Some("5000")
        );
        assert_eq!(
            scval_string(&json!({ "i128": { "hi": 1, "lo": 0 } })).as_deref(),
            Some("18446744073709551616")
        );
        assert_eq!(
            scval_string(&json!({ "i128": { "hi": -1, "lo": 18446744073709551615u64 } })).as_deref(),
            Some("-1")
        );
    }

    #[test]
    fn non_scalar_values_are_not_strings() {
        assert_eq!(scval_string(&json!({ "vec": [] })), None);
        assert_eq!(scval_string(&json!("plain")), None);
        assert_eq!(field(&json!({ "map": [] }), "amount"), None);
    }

    #[test]
    fn paging_token_stands_in_for_missing_id() {
        let mut raw = raw_event("unused", vec![symbol("funded"), json!({ "u64": "1" })], json!({}));
        raw.id = None;
        raw.paging_token = Some("tok-1".to_string());
        assert_eq!(decode_events(&[raw.clone()], "CONTRACT1")[0].event_id, "tok-1");

        raw.paging_token = None;
        assert!(decode_events(&[raw], "CONTRACT1").is_empty());
    }

    #[test]
    fn failed_invocations_are_skipped() {
        let mut raw = raw_event("e4", vec![symbol("funded"), json!({ "u64": "1" })], json!({}));
        raw.in_successful_contract_call = Some(false);
        assert!(decode_events(&[raw], "CONTRACT1").is_empty());
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(next_backoff(INITIAL_BACKOFF_SECS), 4);
        assert_eq!(next_backoff(32), MAX_BACKOFF_SECS);
        assert_eq!(next_backoff(MAX_BACKOFF_SECS), MAX_BACKOFF_SECS);
    }

    #[test]
    fn only_malformed_requests_are_fatal() {
        assert!(is_hard_error(-32600));
        assert!(is_hard_error(-32601));
        assert!(!is_hard_error(-32603));
    }

    #[test]
    fn params_request_json_xdr_and_use_cursor_instead_of_start_ledger() {
        let fresh = build_params("C1", 50, None, 10);
        assert_eq!(fresh["startLedger"], 50);
        assert_eq!(fresh["xdrFormat"], "json");
        assert_eq!(fresh["filters"][0]["contractIds"][0], "C1");

        let paged = build_params("C1", 50, Some("tok"), 10);
        assert!(paged.get("startLedger").is_none());
        assert_eq!(paged["pagination"]["cursor"], "tok");
        assert_eq!(paged["pagination"]["limit"], 10);
    }

    #[test]
    fn parse_iso_timestamp() {
        let ts = parse_iso_to_unix("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, 1_704_067_200);
    }
}
