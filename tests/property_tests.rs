//! Property-based tests for the shrinkage invariants.

mod common;

use common::{date, TestApp};
use galletas_api::{
    db,
    entities::cookie_batch,
    errors::ServiceError,
    forms::{RecordShrinkage, ShrinkageKind},
    services::{catalog, shrinkage},
};
use proptest::prelude::*;
use sea_orm::{EntityTrait, TransactionTrait};

fn batches_strategy() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(0i32..30, 1..4)
}

fn requests_strategy() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(1i32..25, 1..12)
}

/// Applies every request in order and returns the final batch quantities and
/// how many requests were accepted.
async fn run_sequence(batches: &[i32], requests: &[i32]) -> (Vec<i32>, usize, i32) {
    let app = TestApp::new().await;
    let recipe = app.seed_recipe("Base", true).await;
    let cookie = app.seed_cookie("Chocolate", &recipe).await;
    for (i, quantity) in batches.iter().enumerate() {
        app.seed_batch(cookie.id, &format!("2024-01-{:02}", i + 1), *quantity)
            .await;
    }

    let mut accepted = 0;
    let mut drawn = 0;
    for &quantity in requests {
        let eligible = catalog::eligible_for_shrinkage(app.db()).await.unwrap();
        let txn = app.db().begin().await.unwrap();
        let outcome = shrinkage::record_shrinkage(
            &txn,
            &eligible,
            RecordShrinkage {
                cookie_id: cookie.id,
                quantity,
                kind: ShrinkageKind::Other,
                description: "prop".to_string(),
                date: date("2024-06-01"),
            },
        )
        .await;
        match db::finish_transaction(txn, outcome).await {
            Ok(_) => {
                accepted += 1;
                drawn += quantity;
            }
            Err(
                ServiceError::InsufficientStock { .. }
                | ServiceError::NoAvailableBatch { .. }
                | ServiceError::NotEligible(_),
            ) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    let remaining = cookie_batch::Entity::find()
        .all(app.db())
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.quantity)
        .collect();
    (remaining, accepted, drawn)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn batch_stock_never_goes_negative(batches in batches_strategy(), requests in requests_strategy()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (remaining, accepted, drawn) = runtime.block_on(run_sequence(&batches, &requests));

        prop_assert!(remaining.iter().all(|q| *q >= 0), "negative batch: {:?}", remaining);
        prop_assert!(accepted <= requests.len());
        let before: i32 = batches.iter().sum();
        let after: i32 = remaining.iter().sum();
        prop_assert_eq!(before - after, drawn);
    }
}
