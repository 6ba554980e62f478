//! The weekly checkin: summarise pairing activity and post it to a shared
//! stream.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::{
  message,
  service::Notifier,
  store::{
    CHAT_CREDENTIAL, PairingLedger, ParticipantStore, ReviewStore, SecretStore,
  },
};

/// Summary of one checkin run.
#[derive(Debug, Serialize)]
pub struct CheckinReport {
  pub participants: usize,
  pub weekly_pairs: u32,
  pub posted:       bool,
  pub errors:       Vec<String>,
}

pub struct CheckinReporter<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  /// Stream and topic the digest is published under.
  stream:   String,
  topic:    String,
}

impl<S, N> CheckinReporter<S, N>
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore,
  N: Notifier,
{
  pub fn new(
    store: Arc<S>,
    notifier: Arc<N>,
    stream: impl Into<String>,
    topic: impl Into<String>,
  ) -> Self {
    Self { store, notifier, stream: stream.into(), topic: topic.into() }
  }

  /// Assemble and publish the weekly digest. Every fetch failure falls back
  /// to a neutral value; the post is attempted regardless.
  pub async fn run(&self) -> CheckinReport {
    let mut errors = Vec::new();
    let now = Utc::now();

    let weekly_pairs = match self.store.trailing_weekly_total(now).await {
      Ok(total) => total,
      Err(e) => {
        tracing::warn!("could not read the weekly pairing total: {e}");
        errors.push(format!("weekly total: {e}"));
        0
      }
    };

    let participants = match self.store.list_all().await {
      Ok(list) => list.len(),
      Err(e) => {
        tracing::warn!("could not count participants: {e}");
        errors.push(format!("list all: {e}"));
        0
      }
    };

    let review = match self.store.sample().await {
      Ok(Some(review)) => review.content,
      Ok(None) => message::REVIEW_FALLBACK.to_string(),
      Err(e) => {
        tracing::warn!("could not sample a review: {e}");
        errors.push(format!("sample review: {e}"));
        message::REVIEW_FALLBACK.to_string()
      }
    };

    let digest =
      message::checkin_digest(now.date_naive(), participants, weekly_pairs, &review);

    let credential = match self
      .store
      .get_secret(CHAT_CREDENTIAL.0, CHAT_CREDENTIAL.1)
      .await
    {
      Ok(key) => key,
      Err(e) => {
        tracing::warn!("could not fetch the chat credential: {e}");
        errors.push(format!("chat credential: {e}"));
        String::new()
      }
    };

    let posted = match self
      .notifier
      .post_to_topic(&credential, &self.stream, &self.topic, &digest)
      .await
    {
      Ok(()) => {
        tracing::info!(stream = %self.stream, "checkin digest posted");
        true
      }
      Err(e) => {
        tracing::warn!("could not post the checkin digest: {e}");
        errors.push(format!("post digest: {e}"));
        false
      }
    };

    CheckinReport { participants, weekly_pairs, posted, errors }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    participant::Participant,
    stats::PairingRecord,
    testing::{MemoryStore, RecordingNotifier},
  };

  fn fixture() -> (Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::default());
    store.set_secret("chat", "api-key", "s3cret");
    (store, Arc::new(RecordingNotifier::default()))
  }

  #[tokio::test]
  async fn digest_embeds_counts_and_review() {
    let (store, notifier) = fixture();
    store.insert(Participant::new("1", "a@example.com", "A"));
    store.insert(Participant::new("2", "b@example.com", "B"));
    store.push_ledger(PairingRecord {
      recorded_at: Utc::now() - Duration::days(2),
      pair_count:  5,
    });
    store.add_review("pairing made my batch");

    let job =
      CheckinReporter::new(store, notifier.clone(), "checkins", "pairing");
    let report = job.run().await;

    assert!(report.posted);
    assert_eq!(report.participants, 2);
    assert_eq!(report.weekly_pairs, 5);

    let posts = notifier.topic_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].stream, "checkins");
    assert_eq!(posts[0].topic, "pairing");
    assert!(posts[0].text.contains("subscribed to pairing: 2"));
    assert!(posts[0].text.contains("last week: 5"));
    assert!(posts[0].text.contains("pairing made my batch"));
  }

  #[tokio::test]
  async fn missing_review_falls_back_to_stock_line() {
    let (store, notifier) = fixture();

    let job =
      CheckinReporter::new(store, notifier.clone(), "checkins", "pairing");
    let report = job.run().await;

    assert!(report.posted);
    assert!(notifier.topic_posts()[0].text.contains(message::REVIEW_FALLBACK));
  }

  #[tokio::test]
  async fn publish_failure_is_reported_not_retried() {
    let (store, notifier) = fixture();
    notifier.fail_sends(true);

    let job =
      CheckinReporter::new(store, notifier.clone(), "checkins", "pairing");
    let report = job.run().await;

    assert!(!report.posted);
    assert_eq!(report.errors.len(), 1);
    assert!(notifier.topic_posts().is_empty());
  }
}
