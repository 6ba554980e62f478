//! Storage traits consumed by the jobs.
//!
//! Implemented by storage backends (e.g. `tandem-store-sqlite`). The jobs
//! depend on these abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc, Weekday};

use crate::{
  participant::{Participant, ParticipantId},
  review::Review,
  stats::PairingRecord,
};

/// Secret-store coordinates of the chat transport api key.
pub const CHAT_CREDENTIAL: (&str, &str) = ("chat", "api-key");
/// Secret-store coordinates of the cohort roster access token.
pub const COHORT_CREDENTIAL: (&str, &str) = ("cohort", "access-token");

// ─── Participants ────────────────────────────────────────────────────────────

/// Abstraction over the participant repository.
pub trait ParticipantStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Everyone eligible to pair on `day`: subscribed, scheduled for that
  /// weekday, and not marked as skipping.
  fn list_eligible_for(
    &self,
    day: Weekday,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Everyone currently marked as skipping the next matching day.
  fn list_skipping(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Reset a participant's skip flag. Idempotent — a skip applies to exactly
  /// one day.
  fn clear_skip_flag<'a>(
    &'a self,
    id: &'a ParticipantId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Insert or fully replace the stored record for `participant.id`.
  fn upsert<'a>(
    &'a self,
    participant: &'a Participant,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    id: &'a ParticipantId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Pairing statistics ──────────────────────────────────────────────────────

/// Append-only record of per-run pair counts.
pub trait PairingLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn record(
    &self,
    entry: PairingRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Sum of pair counts recorded in the 7 days leading up to `now`.
  fn trailing_weekly_total(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// One review drawn uniformly at random, or `None` if none exist yet.
  fn sample(
    &self,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + '_;
}

// ─── Secrets ─────────────────────────────────────────────────────────────────

/// Short-lived credentials for the notification transport and the roster API.
pub trait SecretStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_secret<'a>(
    &'a self,
    namespace: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
