//! Batch lifecycle: reconcile each participant's stored cohort-presence
//! snapshot against the roster service, and (optionally) offboard people
//! whose batch has ended.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
  message,
  participant::Participant,
  service::{CohortDirectory, Notifier},
  store::{CHAT_CREDENTIAL, COHORT_CREDENTIAL, ParticipantStore, SecretStore},
};

/// What to do when a participant was in the cohort last period but is not
/// any more.
///
/// `DryRun` logs the decision and changes nothing beyond the presence
/// snapshot. `Enforce` deletes the participant and sends the offboarding
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffboardingMode {
  #[default]
  DryRun,
  Enforce,
}

/// Summary of one lifecycle run.
#[derive(Debug, Serialize)]
pub struct LifecycleReport {
  pub processed:  usize,
  /// Participants who were in the cohort last period but are not now.
  pub departed:   usize,
  /// Participants actually deleted (always 0 in `DryRun`).
  pub offboarded: usize,
  pub errors:     Vec<String>,
}

pub struct BatchLifecycle<S, D, N> {
  store:     Arc<S>,
  directory: Arc<D>,
  notifier:  Arc<N>,
  mode:      OffboardingMode,
}

impl<S, D, N> BatchLifecycle<S, D, N>
where
  S: ParticipantStore + SecretStore,
  D: CohortDirectory,
  N: Notifier,
{
  pub fn new(
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    mode: OffboardingMode,
  ) -> Self {
    Self { store, directory, notifier, mode }
  }

  /// Reconcile every participant against the current cohort roster.
  ///
  /// A failure on one participant is logged and collected; the loop
  /// continues to the next. There is no all-or-nothing transaction across
  /// the roster.
  pub async fn run(&self) -> LifecycleReport {
    let mut errors = Vec::new();

    let token = match self
      .store
      .get_secret(COHORT_CREDENTIAL.0, COHORT_CREDENTIAL.1)
      .await
    {
      Ok(token) => token,
      Err(e) => {
        tracing::warn!("could not fetch the roster access token: {e}");
        errors.push(format!("roster token: {e}"));
        String::new()
      }
    };

    let active = match self.directory.active_addresses(&token).await {
      Ok(set) => set,
      Err(e) => {
        tracing::warn!("could not fetch the active cohort roster: {e}");
        errors.push(format!("roster fetch: {e}"));
        Default::default()
      }
    };

    let everyone = match self.store.list_all().await {
      Ok(list) => list,
      Err(e) => {
        tracing::warn!("could not list participants: {e}");
        errors.push(format!("list all: {e}"));
        Vec::new()
      }
    };

    let chat_key = if self.mode == OffboardingMode::Enforce {
      match self.store.get_secret(CHAT_CREDENTIAL.0, CHAT_CREDENTIAL.1).await {
        Ok(key) => key,
        Err(e) => {
          tracing::warn!("could not fetch the chat credential: {e}");
          errors.push(format!("chat credential: {e}"));
          String::new()
        }
      }
    } else {
      String::new()
    };

    let processed = everyone.len();
    let mut departed = 0;
    let mut offboarded = 0;

    for mut participant in everyone {
      let is_active_now = active.contains(&participant.email);
      let was_active = participant.currently_in_cohort;
      tracing::debug!(
        email = %participant.email,
        was_active,
        is_active_now,
        "cohort presence",
      );

      // In the cohort last period but not now: they graduated or left.
      if was_active && !is_active_now {
        departed += 1;
        match self.mode {
          OffboardingMode::DryRun => {
            tracing::info!(email = %participant.email, "end of batch; would offboard");
          }
          OffboardingMode::Enforce => {
            if self.offboard(&participant, &chat_key, &mut errors).await {
              offboarded += 1;
              // The row is gone; there is no snapshot left to update.
              continue;
            }
          }
        }
      }

      participant.currently_in_cohort = is_active_now;
      if let Err(e) = self.store.upsert(&participant).await {
        tracing::warn!(email = %participant.email, "could not update cohort snapshot: {e}");
        errors.push(format!("update {}: {e}", participant.email));
      }
    }

    tracing::info!(processed, departed, offboarded, "lifecycle run complete");
    LifecycleReport { processed, departed, offboarded, errors }
  }

  /// Delete the participant and tell them; returns whether the delete
  /// succeeded. The offboarding message is only sent for a completed delete.
  async fn offboard(
    &self,
    participant: &Participant,
    chat_key: &str,
    errors: &mut Vec<String>,
  ) -> bool {
    if let Err(e) = self.store.delete(&participant.id).await {
      tracing::warn!(email = %participant.email, "could not offboard: {e}");
      errors.push(format!("offboard {}: {e}", participant.email));
      return false;
    }
    tracing::info!(email = %participant.email, "offboarded at end of batch");

    if let Err(e) = self
      .notifier
      .send_direct_message(
        chat_key,
        std::slice::from_ref(&participant.email),
        message::OFFBOARDED,
      )
      .await
    {
      tracing::warn!(email = %participant.email, "could not send offboarding message: {e}");
      errors.push(format!("notify {}: {e}", participant.email));
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::testing::{MemoryStore, RecordingNotifier, StaticDirectory};

  fn participant(i: usize, in_cohort: bool) -> Participant {
    let mut p = Participant::new(
      i.to_string(),
      format!("p{i}@example.com"),
      format!("P{i}"),
    );
    p.currently_in_cohort = in_cohort;
    p
  }

  fn fixture(
    active: &[&str],
  ) -> (Arc<MemoryStore>, Arc<StaticDirectory>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::default());
    store.set_secret("cohort", "access-token", "tok");
    store.set_secret("chat", "api-key", "s3cret");
    let directory = Arc::new(StaticDirectory::with_active(active));
    (store, directory, Arc::new(RecordingNotifier::default()))
  }

  #[tokio::test]
  async fn presence_snapshot_follows_the_roster() {
    let (store, directory, notifier) = fixture(&["p0@example.com"]);
    store.insert(participant(0, true)); // still on the roster: stays true
    store.insert(participant(1, true)); // gone from the roster: flips to false
    store.insert(participant(2, false)); // never on the roster: stays false

    let job = BatchLifecycle::new(
      store.clone(),
      directory,
      notifier,
      OffboardingMode::DryRun,
    );
    let report = job.run().await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.departed, 1);
    assert_eq!(report.offboarded, 0);

    let find = |email: &str| {
      store
        .all_participants()
        .into_iter()
        .find(|p| p.email == email)
        .unwrap()
    };
    assert!(find("p0@example.com").currently_in_cohort);
    assert!(!find("p1@example.com").currently_in_cohort);
    assert!(!find("p2@example.com").currently_in_cohort);
  }

  #[tokio::test]
  async fn dry_run_neither_deletes_nor_notifies() {
    let (store, directory, notifier) = fixture(&[]);
    store.insert(participant(0, true));

    let job = BatchLifecycle::new(
      store.clone(),
      directory,
      notifier.clone(),
      OffboardingMode::DryRun,
    );
    let report = job.run().await;

    assert_eq!(report.departed, 1);
    assert_eq!(report.offboarded, 0);
    assert_eq!(store.all_participants().len(), 1);
    assert!(notifier.direct_messages().is_empty());
  }

  #[tokio::test]
  async fn enforce_deletes_and_sends_the_offboarding_message() {
    let (store, directory, notifier) = fixture(&["p1@example.com"]);
    store.insert(participant(0, true)); // departed
    store.insert(participant(1, true)); // still here

    let job = BatchLifecycle::new(
      store.clone(),
      directory,
      notifier.clone(),
      OffboardingMode::Enforce,
    );
    let report = job.run().await;

    assert_eq!(report.offboarded, 1);
    let remaining = store.all_participants();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].email, "p1@example.com");

    let sent = notifier.direct_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["p0@example.com"]);
    assert_eq!(sent[0].text, message::OFFBOARDED);
  }

  #[tokio::test]
  async fn roster_fetch_failure_empties_the_roster_but_still_updates() {
    let (store, _, notifier) = fixture(&[]);
    let directory = Arc::new(StaticDirectory::failing());
    store.insert(participant(0, true));

    let job = BatchLifecycle::new(
      store.clone(),
      directory,
      notifier,
      OffboardingMode::DryRun,
    );
    let report = job.run().await;

    assert!(!report.errors.is_empty());
    // With an empty roster everyone reads as departed; the snapshot still
    // flips to false.
    assert!(!store.all_participants()[0].currently_in_cohort);
  }

  #[tokio::test]
  async fn one_failed_update_does_not_block_the_rest() {
    let (store, directory, notifier) = fixture(&[]);
    store.insert(participant(0, true));
    store.insert(participant(1, true));
    store.fail_upsert_for("p0@example.com");

    let job = BatchLifecycle::new(
      store.clone(),
      directory,
      notifier,
      OffboardingMode::DryRun,
    );
    let report = job.run().await;

    assert_eq!(report.errors.len(), 1);
    let p1 = store
      .all_participants()
      .into_iter()
      .find(|p| p.email == "p1@example.com")
      .unwrap();
    assert!(!p1.currently_in_cohort);
  }
}
