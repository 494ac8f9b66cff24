extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger},
    token, vec, Address, Env, IntoVal, TryIntoVal, Val, Vec,
};

use crate::{
    AdminTransferred, CampaignCreated, CampaignFunded, CampaignLedger, CampaignLedgerClient,
    FundsRefunded, FundsReleased,
};

const NOW: u64 = 1_700_000_000;
const DAY: u64 = 86_400;

fn setup() -> (Env, CampaignLedgerClient<'static>, Address, token::Client<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(NOW);
    let contract_id = env.register(CampaignLedger, ());
    let client = CampaignLedgerClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let addr = env.register_stellar_asset_contract_v2(token_admin);
    let token = token::Client::new(&env, &addr.address());
    client.init(&admin, &token.address);
    (env, client, admin, token)
}

fn last_event(env: &Env) -> (Address, Vec<Val>, Val) {
    env.events().all().last().expect("No events found")
}

fn campaign_topics(env: &Env, topic: soroban_sdk::Symbol, campaign_id: u64) -> Vec<Val> {
    vec![env, topic.into_val(env), campaign_id.into_val(env)]
}

#[test]
fn test_campaign_created_event() {
    let (env, client, admin, _) = setup();
    let owner = Address::generate(&env);
    let start = NOW + DAY;
    let end = NOW + 3 * DAY;

    let id = client.create_campaign(&admin, &owner, &500, &start, &end);

    let (contract, topics, data) = last_event(&env);
    assert_eq!(contract, client.address);
    assert_eq!(topics, campaign_topics(&env, symbol_short!("created"), id));

    let event: CampaignCreated = data.try_into_val(&env).unwrap();
    assert_eq!(
        event,
        CampaignCreated {
            campaign_id: id,
            owner,
            target: 500,
            started_at: start,
            finished_at: end,
        }
    );
}

#[test]
fn test_campaign_funded_event() {
    let (env, client, admin, token) = setup();
    let owner = Address::generate(&env);
    let contributor = Address::generate(&env);
    token::StellarAssetClient::new(&env, &token.address).mint(&contributor, &1_000);

    let id = client.create_campaign(&admin, &owner, &5_000, &NOW, &(NOW + DAY));
    client.fund(&id, &contributor, &750);

    let (contract, topics, data) = last_event(&env);
    assert_eq!(contract, client.address);
    assert_eq!(topics, campaign_topics(&env, symbol_short!("funded"), id));

    let event: CampaignFunded = data.try_into_val(&env).unwrap();
    assert_eq!(
        event,
        CampaignFunded {
            campaign_id: id,
            contributor,
            amount: 750,
        }
    );
}

#[test]
fn test_funds_released_event() {
    let (env, client, admin, token) = setup();
    let owner = Address::generate(&env);
    let contributor = Address::generate(&env);
    token::StellarAssetClient::new(&env, &token.address).mint(&contributor, &1_000);

    let id = client.create_campaign(&admin, &owner, &100, &NOW, &(NOW + DAY));
    client.fund(&id, &contributor, &400);
    env.ledger().set_timestamp(NOW + DAY + 1);
    client.withdraw(&id, &owner);

    let (_, topics, data) = last_event(&env);
    assert_eq!(topics, campaign_topics(&env, symbol_short!("released"), id));

    let event: FundsReleased = data.try_into_val(&env).unwrap();
    assert_eq!(
        event,
        FundsReleased {
            campaign_id: id,
            owner,
            amount: 400,
        }
    );
}

#[test]
fn test_funds_refunded_event() {
    let (env, client, admin, token) = setup();
    let owner = Address::generate(&env);
    let contributor = Address::generate(&env);
    token::StellarAssetClient::new(&env, &token.address).mint(&contributor, &1_000);

    let id = client.create_campaign(&admin, &owner, &5_000, &NOW, &(NOW + DAY));
    client.fund(&id, &contributor, &40);
    client.fund(&id, &contributor, &2);
    env.ledger().set_timestamp(NOW + 2 * DAY);
    client.withdraw(&id, &contributor);

    let (_, topics, data) = last_event(&env);
    assert_eq!(topics, campaign_topics(&env, symbol_short!("refunded"), id));

    let event: FundsRefunded = data.try_into_val(&env).unwrap();
    assert_eq!(
        event,
        FundsRefunded {
            campaign_id: id,
            contributor,
            amount: 42,
        }
    );
}

#[test]
fn test_admin_transferred_event() {
    let (env, client, admin, _) = setup();
    let successor = Address::generate(&env);

    client.transfer_admin(&admin, &successor);

    let (_, topics, data) = last_event(&env);
    assert_eq!(topics, vec![&env, symbol_short!("admin").into_val(&env)]);

    let event: AdminTransferred = data.try_into_val(&env).unwrap();
    assert_eq!(
        event,
        AdminTransferred {
            previous: admin,
            current: successor,
        }
    );
}
