//! In-memory collaborator doubles for job tests.

use std::{
  collections::{HashMap, HashSet},
  sync::Mutex,
};

use chrono::{DateTime, Duration, Utc, Weekday};

use crate::{
  participant::{Participant, ParticipantId},
  review::Review,
  service::{CohortDirectory, Notifier},
  stats::PairingRecord,
  store::{PairingLedger, ParticipantStore, ReviewStore, SecretStore},
};

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct StubError(pub String);

impl std::fmt::Display for StubError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "stub error: {}", self.0)
  }
}

impl std::error::Error for StubError {}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// Implements all four storage traits over plain `Mutex`-guarded vectors.
#[derive(Default)]
pub struct MemoryStore {
  participants:    Mutex<Vec<Participant>>,
  ledger:          Mutex<Vec<PairingRecord>>,
  reviews:         Mutex<Vec<Review>>,
  secrets:         Mutex<HashMap<(String, String), String>>,
  failing_upserts: Mutex<HashSet<String>>,
}

impl MemoryStore {
  pub fn insert(&self, participant: Participant) {
    self.participants.lock().unwrap().push(participant);
  }

  pub fn all_participants(&self) -> Vec<Participant> {
    self.participants.lock().unwrap().clone()
  }

  pub fn ledger_entries(&self) -> Vec<PairingRecord> {
    self.ledger.lock().unwrap().clone()
  }

  pub fn push_ledger(&self, entry: PairingRecord) {
    self.ledger.lock().unwrap().push(entry);
  }

  pub fn add_review(&self, content: &str) {
    self.reviews.lock().unwrap().push(Review {
      content:      content.to_string(),
      submitted_at: Utc::now(),
    });
  }

  pub fn set_secret(&self, namespace: &str, key: &str, value: &str) {
    self
      .secrets
      .lock()
      .unwrap()
      .insert((namespace.to_string(), key.to_string()), value.to_string());
  }

  pub fn remove_secret(&self, namespace: &str, key: &str) {
    self
      .secrets
      .lock()
      .unwrap()
      .remove(&(namespace.to_string(), key.to_string()));
  }

  /// Make `upsert` fail for the participant with this email.
  pub fn fail_upsert_for(&self, email: &str) {
    self.failing_upserts.lock().unwrap().insert(email.to_string());
  }
}

impl ParticipantStore for MemoryStore {
  type Error = StubError;

  // The weekday filter is exercised against the real store; the double
  // ignores it so job tests don't depend on the wall-clock day.
  async fn list_eligible_for(&self, _day: Weekday) -> Result<Vec<Participant>, StubError> {
    Ok(
      self
        .participants
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.is_subscribed && !p.is_skipping_tomorrow)
        .cloned()
        .collect(),
    )
  }

  async fn list_skipping(&self) -> Result<Vec<Participant>, StubError> {
    Ok(
      self
        .participants
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.is_skipping_tomorrow)
        .cloned()
        .collect(),
    )
  }

  async fn clear_skip_flag(&self, id: &ParticipantId) -> Result<(), StubError> {
    let mut participants = self.participants.lock().unwrap();
    match participants.iter_mut().find(|p| &p.id == id) {
      Some(p) => {
        p.is_skipping_tomorrow = false;
        Ok(())
      }
      None => Err(StubError(format!("no participant {id}"))),
    }
  }

  async fn list_all(&self) -> Result<Vec<Participant>, StubError> {
    Ok(self.participants.lock().unwrap().clone())
  }

  async fn upsert(&self, participant: &Participant) -> Result<(), StubError> {
    if self.failing_upserts.lock().unwrap().contains(&participant.email) {
      return Err(StubError(format!("upsert refused for {}", participant.email)));
    }
    let mut participants = self.participants.lock().unwrap();
    match participants.iter_mut().find(|p| p.id == participant.id) {
      Some(p) => *p = participant.clone(),
      None => participants.push(participant.clone()),
    }
    Ok(())
  }

  async fn delete(&self, id: &ParticipantId) -> Result<(), StubError> {
    self.participants.lock().unwrap().retain(|p| &p.id != id);
    Ok(())
  }
}

impl PairingLedger for MemoryStore {
  type Error = StubError;

  async fn record(&self, entry: PairingRecord) -> Result<(), StubError> {
    self.ledger.lock().unwrap().push(entry);
    Ok(())
  }

  async fn trailing_weekly_total(&self, now: DateTime<Utc>) -> Result<u32, StubError> {
    let cutoff = now - Duration::days(7);
    Ok(
      self
        .ledger
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.recorded_at > cutoff)
        .map(|entry| entry.pair_count)
        .sum(),
    )
  }
}

impl ReviewStore for MemoryStore {
  type Error = StubError;

  async fn sample(&self) -> Result<Option<Review>, StubError> {
    // "Random" is first-wins here; sampling uniformity is the backend's
    // concern, not the jobs'.
    Ok(self.reviews.lock().unwrap().first().cloned())
  }
}

impl SecretStore for MemoryStore {
  type Error = StubError;

  async fn get_secret(&self, namespace: &str, key: &str) -> Result<String, StubError> {
    self
      .secrets
      .lock()
      .unwrap()
      .get(&(namespace.to_string(), key.to_string()))
      .cloned()
      .ok_or_else(|| StubError(format!("no secret {namespace}/{key}")))
  }
}

// ─── RecordingNotifier ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentDirect {
  pub credential: String,
  pub recipients: Vec<String>,
  pub text:       String,
}

#[derive(Debug, Clone)]
pub struct TopicPost {
  pub credential: String,
  pub stream:     String,
  pub topic:      String,
  pub text:       String,
}

/// Records every delivery; can be switched to fail all sends.
#[derive(Default)]
pub struct RecordingNotifier {
  direct: Mutex<Vec<SentDirect>>,
  posts:  Mutex<Vec<TopicPost>>,
  fail:   Mutex<bool>,
}

impl RecordingNotifier {
  pub fn direct_messages(&self) -> Vec<SentDirect> {
    self.direct.lock().unwrap().clone()
  }

  pub fn topic_posts(&self) -> Vec<TopicPost> {
    self.posts.lock().unwrap().clone()
  }

  pub fn fail_sends(&self, fail: bool) {
    *self.fail.lock().unwrap() = fail;
  }
}

impl Notifier for RecordingNotifier {
  type Error = StubError;

  async fn send_direct_message(
    &self,
    credential: &str,
    recipients: &[String],
    text: &str,
  ) -> Result<(), StubError> {
    if *self.fail.lock().unwrap() {
      return Err(StubError("send refused".into()));
    }
    self.direct.lock().unwrap().push(SentDirect {
      credential: credential.to_string(),
      recipients: recipients.to_vec(),
      text:       text.to_string(),
    });
    Ok(())
  }

  async fn post_to_topic(
    &self,
    credential: &str,
    stream: &str,
    topic: &str,
    text: &str,
  ) -> Result<(), StubError> {
    if *self.fail.lock().unwrap() {
      return Err(StubError("post refused".into()));
    }
    self.posts.lock().unwrap().push(TopicPost {
      credential: credential.to_string(),
      stream:     stream.to_string(),
      topic:      topic.to_string(),
      text:       text.to_string(),
    });
    Ok(())
  }
}

// ─── StaticDirectory ─────────────────────────────────────────────────────────

/// A cohort directory with a fixed roster and week flag.
pub struct StaticDirectory {
  pub active:      HashSet<String>,
  pub second_week: bool,
  pub fail:        bool,
}

impl StaticDirectory {
  pub fn with_active(emails: &[&str]) -> Self {
    Self {
      active:      emails.iter().map(|e| e.to_string()).collect(),
      second_week: false,
      fail:        false,
    }
  }

  pub fn failing() -> Self {
    Self { active: HashSet::new(), second_week: false, fail: true }
  }
}

impl CohortDirectory for StaticDirectory {
  type Error = StubError;

  async fn active_addresses(&self, _credential: &str) -> Result<HashSet<String>, StubError> {
    if self.fail {
      return Err(StubError("roster unavailable".into()));
    }
    Ok(self.active.clone())
  }

  async fn is_second_week(&self, _credential: &str) -> Result<bool, StubError> {
    if self.fail {
      return Err(StubError("roster unavailable".into()));
    }
    Ok(self.second_week)
  }
}
