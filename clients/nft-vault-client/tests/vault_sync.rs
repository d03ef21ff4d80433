mod common;

use common::*;
use nft_vault_client::events::SyncEvent;
use nft_vault_client::{FetchOutcome, SyncError};
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

#[tokio::test]
async fn test_vault_fetch_is_cached_under_vault_key() {
    let harness = Harness::new();
    harness.plant_vault(1_000, 2_000);
    let controller = harness.controller();
    controller.observe(harness.connected());
    let program = program_addresses();

    assert_eq!(controller.refresh_vault().await, FetchOutcome::Committed);

    // One existence check; owner and layout are checked on that same response
    assert_eq!(harness.ledger.total_account_calls(), 1);
    assert_eq!(harness.ledger.account_calls(&program.vault), 1);

    let record = harness.session.vault.get(&program.vault);
    assert_eq!(record.data, Some(vault_state(1_000)));
    assert_eq!(record.error, None);
    assert!(!record.is_loading);
    assert_eq!(record.last_fetched_at_key, Some(program.vault));
    assert!(record.is_fresh());
    assert!(harness
        .session
        .drain_events()
        .contains(&SyncEvent::RecordCommitted { store: "vault" }));
}

#[tokio::test]
async fn test_missing_vault_is_not_found() {
    let harness = Harness::new();
    let controller = harness.controller();
    controller.observe(harness.connected());
    let program = program_addresses();

    let outcome = controller.refresh_vault().await;

    let expected = SyncError::NotFound {
        address: program.vault,
    };
    assert_eq!(outcome, FetchOutcome::Failed(expected.clone()));
    let record = harness.session.vault.get(&program.vault);
    assert_eq!(record.error, Some(expected));
    assert!(record.is_absent());
    assert!(record.alert().is_none());
}

#[tokio::test]
async fn test_foreign_owner_is_an_ownership_mismatch() {
    let harness = Harness::new();
    let program = program_addresses();
    let foreign = Pubkey::new_unique();
    harness
        .ledger
        .put_account(program.vault, record_account(&vault_state(1), &foreign));
    let controller = harness.controller();
    controller.observe(harness.connected());

    controller.refresh_vault().await;

    let record = harness.session.vault.get(&program.vault);
    assert_eq!(
        record.error,
        Some(SyncError::OwnershipMismatch {
            address: program.vault,
            expected: PROGRAM_ID,
            actual: foreign,
        })
    );
    assert!(record.alert().is_some());
    assert!(!record.is_absent());
}

#[tokio::test]
async fn test_unexpected_layout_is_a_deserialization_error() {
    let harness = Harness::new();
    let program = program_addresses();
    harness.ledger.put_account(
        program.vault,
        Account {
            lamports: INITIAL_LAMPORTS,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            owner: PROGRAM_ID,
            executable: false,
            rent_epoch: 0,
        },
    );
    let controller = harness.controller();
    controller.observe(harness.connected());

    controller.refresh_vault().await;

    let record = harness.session.vault.get(&program.vault);
    match record.error {
        Some(SyncError::Deserialization { address, .. }) => assert_eq!(address, program.vault),
        other => panic!("expected a deserialization error, got {other:?}"),
    }
    assert_eq!(record.data, None);
}

#[tokio::test]
async fn test_network_failure_keeps_previous_data() {
    let harness = Harness::new();
    harness.plant_vault(1_000, 0);
    let controller = harness.controller();
    controller.observe(harness.connected());
    let program = program_addresses();
    controller.refresh_vault().await;

    controller.request_refresh().unwrap();
    harness.ledger.fail(program.vault);
    let outcome = controller.refresh_vault().await;

    assert!(matches!(outcome, FetchOutcome::Failed(SyncError::Network(_))));
    let record = harness.session.vault.get(&program.vault);
    assert_eq!(record.data, Some(vault_state(1_000)));
    assert!(matches!(record.alert(), Some(SyncError::Network(_))));

    // Transient failures are retried on the next trigger
    assert!(harness.session.vault.needs_fetch(&program.vault));
    harness.ledger.heal(&program.vault);
    assert_eq!(controller.refresh_vault().await, FetchOutcome::Committed);
    assert!(harness.session.vault.get(&program.vault).error.is_none());
}

#[tokio::test]
async fn test_overlapping_refreshes_issue_one_fetch() {
    let harness = Harness::new();
    harness.plant_vault(1_000, 0);
    let controller = harness.controller();
    controller.observe(harness.connected());
    let program = program_addresses();
    harness.ledger.hold(program.vault);

    let (first, second, ()) = tokio::join!(
        controller.refresh_vault(),
        controller.refresh_vault(),
        async {
            harness.ledger.wait_requested().await;
            assert!(harness.session.vault.get(&program.vault).is_loading);
            harness.ledger.release();
        }
    );

    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|outcome| matches!(outcome, FetchOutcome::InFlight));
    assert_eq!(outcomes, vec![FetchOutcome::Committed, FetchOutcome::InFlight]);
    assert_eq!(harness.ledger.account_calls(&program.vault), 1);
    assert!(!harness.session.vault.is_in_flight(&program.vault));
}

#[tokio::test]
async fn test_in_flight_vault_does_not_block_collection() {
    let harness = Harness::new();
    harness.plant_vault(1_000, 0);
    let program = program_addresses();
    harness
        .ledger
        .put(program.collection, &collection(&[(nft_mint(9), 1)]));
    let controller = harness.controller();
    controller.observe(harness.connected());
    harness.ledger.hold(program.vault);

    let (vault, ()) = tokio::join!(controller.refresh_vault(), async {
        harness.ledger.wait_requested().await;
        // Vault is still waiting on the ledger
        assert_eq!(controller.refresh_collection().await, FetchOutcome::Committed);
        harness.ledger.release();
    });

    assert_eq!(vault, FetchOutcome::Committed);
    assert!(harness.session.collection.data(&program.collection).is_some());
}

#[tokio::test]
async fn test_vault_result_after_disconnect_is_discarded() {
    let harness = Harness::new();
    harness.plant_vault(1_000, 0);
    let controller = harness.controller();
    controller.observe(harness.connected());
    let program = program_addresses();
    harness.ledger.hold(program.vault);

    let (outcome, ()) = tokio::join!(controller.refresh_vault(), async {
        harness.ledger.wait_requested().await;
        controller.observe(nft_vault_client::ConnectionState::disconnected());
        controller.observe(harness.connected());
        harness.ledger.release();
    });

    assert_eq!(outcome, FetchOutcome::Discarded);
    assert!(!harness.session.vault.get(&program.vault).has_been_fetched());
}
