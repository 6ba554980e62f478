//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc, Weekday};
use tandem_core::{
  participant::{Participant, ParticipantId},
  stats::PairingRecord,
  store::{PairingLedger, ParticipantStore, ReviewStore, SecretStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn participant(i: usize) -> Participant {
  Participant::new(i.to_string(), format!("p{i}@example.com"), format!("P{i}"))
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_list_roundtrip() {
  let s = store().await;

  let mut p = participant(0);
  p.schedule = vec![Weekday::Tue, Weekday::Thu];
  p.is_skipping_tomorrow = true;
  p.currently_in_cohort = true;
  s.upsert(&p).await.unwrap();

  let all = s.list_all().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0], p);
}

#[tokio::test]
async fn upsert_replaces_the_stored_record() {
  let s = store().await;

  let mut p = participant(0);
  s.upsert(&p).await.unwrap();

  p.display_name = "Renamed".into();
  p.currently_in_cohort = true;
  s.upsert(&p).await.unwrap();

  let all = s.list_all().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].display_name, "Renamed");
  assert!(all[0].currently_in_cohort);
}

#[tokio::test]
async fn delete_removes_the_participant() {
  let s = store().await;
  s.upsert(&participant(0)).await.unwrap();
  s.upsert(&participant(1)).await.unwrap();

  s.delete(&ParticipantId::new("0")).await.unwrap();

  let all = s.list_all().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].email, "p1@example.com");
}

#[tokio::test]
async fn eligibility_respects_subscription_skip_and_schedule() {
  let s = store().await;

  let available = participant(0); // Mon–Fri default schedule
  s.upsert(&available).await.unwrap();

  let mut unsubscribed = participant(1);
  unsubscribed.is_subscribed = false;
  s.upsert(&unsubscribed).await.unwrap();

  let mut skipping = participant(2);
  skipping.is_skipping_tomorrow = true;
  s.upsert(&skipping).await.unwrap();

  let mut weekends_only = participant(3);
  weekends_only.schedule = vec![Weekday::Sat, Weekday::Sun];
  s.upsert(&weekends_only).await.unwrap();

  let eligible = s.list_eligible_for(Weekday::Wed).await.unwrap();
  assert_eq!(eligible.len(), 1);
  assert_eq!(eligible[0].email, "p0@example.com");

  let weekend = s.list_eligible_for(Weekday::Sat).await.unwrap();
  assert_eq!(weekend.len(), 1);
  assert_eq!(weekend[0].email, "p3@example.com");
}

#[tokio::test]
async fn skip_flags_list_and_clear() {
  let s = store().await;

  let mut skipping = participant(0);
  skipping.is_skipping_tomorrow = true;
  s.upsert(&skipping).await.unwrap();
  s.upsert(&participant(1)).await.unwrap();

  let skippers = s.list_skipping().await.unwrap();
  assert_eq!(skippers.len(), 1);
  assert_eq!(skippers[0].email, "p0@example.com");

  s.clear_skip_flag(&skippers[0].id).await.unwrap();
  assert!(s.list_skipping().await.unwrap().is_empty());

  // Clearing again is a no-op.
  s.clear_skip_flag(&skippers[0].id).await.unwrap();
  assert!(s.list_skipping().await.unwrap().is_empty());
}

// ─── Pairing ledger ──────────────────────────────────────────────────────────

#[tokio::test]
async fn trailing_weekly_total_sums_only_the_last_seven_days() {
  let s = store().await;
  let now = Utc::now();

  s.record(PairingRecord { recorded_at: now - Duration::days(1), pair_count: 3 })
    .await
    .unwrap();
  s.record(PairingRecord { recorded_at: now - Duration::days(6), pair_count: 4 })
    .await
    .unwrap();
  s.record(PairingRecord { recorded_at: now - Duration::days(8), pair_count: 9 })
    .await
    .unwrap();

  assert_eq!(s.trailing_weekly_total(now).await.unwrap(), 7);
}

#[tokio::test]
async fn weekly_total_is_zero_with_no_records() {
  let s = store().await;
  assert_eq!(s.trailing_weekly_total(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn zero_count_records_are_kept() {
  let s = store().await;
  let now = Utc::now();

  s.record(PairingRecord { recorded_at: now, pair_count: 0 })
    .await
    .unwrap();

  assert_eq!(s.trailing_weekly_total(now).await.unwrap(), 0);
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sample_returns_none_when_empty() {
  let s = store().await;
  assert!(s.sample().await.unwrap().is_none());
}

#[tokio::test]
async fn sample_returns_one_of_the_stored_reviews() {
  let s = store().await;
  s.add_review("loved it").await.unwrap();
  s.add_review("pairing every day kept me going").await.unwrap();

  let review = s.sample().await.unwrap().unwrap();
  assert!(
    ["loved it", "pairing every day kept me going"]
      .contains(&review.content.as_str())
  );
}

// ─── Secrets ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn secrets_roundtrip_and_overwrite() {
  let s = store().await;
  s.put_secret("chat", "api-key", "first").await.unwrap();
  s.put_secret("chat", "api-key", "second").await.unwrap();

  assert_eq!(s.get_secret("chat", "api-key").await.unwrap(), "second");
}

#[tokio::test]
async fn missing_secret_is_an_error() {
  let s = store().await;
  let err = s.get_secret("chat", "api-key").await.unwrap_err();
  assert!(matches!(err, crate::Error::SecretNotFound { .. }));
}
