//! Engine operation tests: link read-your-writes, roster idempotence,
//! privileged-op gating, and query views

mod common;

use chrono::Utc;
use common::{test_context, MockSource};
use warera_tax::db::players;
use warera_tax::engine::{force_sync, request_link, set_automation_multiplier, set_tax_rule};
use warera_tax::queries::{dashboard, player_detail};
use warera_tax::status::TaxStatus;
use warera_tax::sync::sync_roster;
use warera_tax::Error;

#[tokio::test]
async fn link_is_visible_before_durable_commit() {
    let (ctx, pool, _dir) = test_context().await;
    players::insert_stub_if_absent(&pool, "w1", "Alice").await.unwrap();

    let ack = request_link(&ctx, "alice", "123").await.unwrap();
    assert_eq!(ack.player_id, "w1");
    assert_eq!(ack.display_name, "Alice");

    // No flush: the durable write may not have been attempted yet, but
    // the dashboard already shows the binding
    let board = dashboard(&ctx, 0).await.unwrap();
    let row = board.rows.iter().find(|r| r.player_id == "w1").unwrap();
    assert_eq!(row.display, "123");
    assert_eq!(row.linked_identity.as_deref(), Some("123"));
}

#[tokio::test]
async fn link_unknown_name_is_rejected_as_invalid_input() {
    let (ctx, _pool, _dir) = test_context().await;
    let result = request_link(&ctx, "nobody", "123").await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn link_empty_name_is_invalid() {
    let (ctx, _pool, _dir) = test_context().await;
    let result = request_link(&ctx, "   ", "123").await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn admin_operations_require_privilege() {
    let (ctx, _pool, _dir) = test_context().await;

    assert!(matches!(
        set_tax_rule(&ctx, false, 5, 9, 6.0).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        set_automation_multiplier(&ctx, false, 0.75).await,
        Err(Error::Unauthorized(_))
    ));

    assert!(set_tax_rule(&ctx, true, 5, 9, 6.0).await.is_ok());
    assert!(set_automation_multiplier(&ctx, true, 0.75).await.is_ok());
}

#[tokio::test]
async fn admin_operations_validate_arguments() {
    let (ctx, _pool, _dir) = test_context().await;

    assert!(matches!(
        set_tax_rule(&ctx, true, 9, 5, 6.0).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        set_tax_rule(&ctx, true, 5, 9, -1.0).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        set_automation_multiplier(&ctx, true, -0.5).await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn roster_sync_twice_adds_nothing_new() {
    let (ctx, pool, _dir) = test_context().await;
    let source = MockSource::default()
        .with_player("w1", "Alice", 5, &[])
        .with_player("w2", "Bob", 9, &[])
        .with_player("w3", "Carol", 12, &[]);

    let added = sync_roster(&ctx, &source).await.unwrap();
    assert_eq!(added, 3);

    let added_again = sync_roster(&ctx, &source).await.unwrap();
    assert_eq!(added_again, 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn roster_sync_skips_failing_member_and_continues() {
    let (ctx, pool, _dir) = test_context().await;
    let mut source = MockSource::default()
        .with_player("w1", "Alice", 5, &[])
        .with_player("w2", "Bob", 9, &[])
        .with_player("w3", "Carol", 12, &[]);
    // w1 is on the first page, w3 on the second: the failure must
    // abort neither the rest of its page nor the pages after it
    source.failing_profiles.insert("w1".to_string());

    let added = sync_roster(&ctx, &source).await.unwrap();
    assert_eq!(added, 2);

    assert!(players::get(&pool, "w1").await.unwrap().is_none());
    assert!(players::get(&pool, "w2").await.unwrap().is_some());
    assert!(players::get(&pool, "w3").await.unwrap().is_some());

    // Once the profile recovers, the next pass picks the member up
    source.failing_profiles.clear();
    let added = sync_roster(&ctx, &source).await.unwrap();
    assert_eq!(added, 1);
    assert!(players::get(&pool, "w1").await.unwrap().is_some());
}

#[tokio::test]
async fn roster_sync_ends_pass_gracefully_on_page_failure() {
    let (ctx, pool, _dir) = test_context().await;
    let mut source = MockSource::default()
        .with_player("w1", "Alice", 5, &[])
        .with_player("w2", "Bob", 9, &[])
        .with_player("w3", "Carol", 12, &[]);
    // Second page (offset 2) fails: the first page's members are kept
    // and the pass still returns Ok
    source.failing_pages.insert(2);

    let added = sync_roster(&ctx, &source).await.unwrap();
    assert_eq!(added, 2);
    assert!(players::get(&pool, "w3").await.unwrap().is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn dashboard_orders_and_counts_categories() {
    let (ctx, _pool, _dir) = test_context().await;
    let source = MockSource::default()
        .with_player("w1", "zoe", 12, &[])
        .with_player("w2", "Adam", 12, &[])
        .with_player("w3", "Mia", 20, &[])
        .with_player("w4", "Leo", 2, &[])
        .with_payment("w3", 29.0, Utc::now())
        .with_payment("w2", 5.0, Utc::now());

    sync_roster(&ctx, &source).await.unwrap();
    force_sync(&ctx, &source).await.unwrap();

    let board = dashboard(&ctx, 10).await.unwrap();
    // Level 2 player filtered out; level DESC then name ASC ignoring case
    let names: Vec<&str> = board.rows.iter().map(|r| r.display.as_str()).collect();
    assert_eq!(names, vec!["Mia", "Adam", "zoe"]);

    assert_eq!(board.counts.total, 3);
    assert_eq!(board.counts.paid, 1); // Mia: due 29, paid 29
    assert_eq!(board.counts.partial, 1); // Adam: due 15.75, paid 5
    assert_eq!(board.counts.unpaid, 1); // zoe
    assert_eq!(board.counts.legend, 0);
}

#[tokio::test]
async fn player_detail_reports_remaining_due() {
    let (ctx, _pool, _dir) = test_context().await;
    let source = MockSource::default()
        .with_player("w1", "Alice", 5, &[2, 4])
        .with_payment("w1", 3.0, Utc::now());

    sync_roster(&ctx, &source).await.unwrap();
    force_sync(&ctx, &source).await.unwrap();

    let detail = player_detail(&ctx, "ALICE").await.unwrap().unwrap();
    assert_eq!(detail.level, 5);
    assert_eq!(detail.automation_levels, vec![2, 4]);
    assert_eq!(detail.computed_due, 8.25);
    assert_eq!(detail.amount_paid, 3.0);
    assert_eq!(detail.remaining, 5.25);
    assert_eq!(detail.status, TaxStatus::Partial);

    assert!(player_detail(&ctx, "nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn overpayment_shows_as_legend() {
    let (ctx, _pool, _dir) = test_context().await;
    let source = MockSource::default()
        .with_player("w1", "Alice", 5, &[])
        .with_payment("w1", 100.0, Utc::now());

    sync_roster(&ctx, &source).await.unwrap();
    force_sync(&ctx, &source).await.unwrap();

    let board = dashboard(&ctx, 0).await.unwrap();
    assert_eq!(board.rows[0].status, TaxStatus::Legend);
    assert_eq!(board.counts.legend, 1);
}
