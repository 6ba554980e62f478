//! The daily matching run: fetch the eligible roster, reset skip flags,
//! shuffle, pair, notify, record.
//!
//! Collaborator failures never abort a run. Each one is logged and collected
//! into the returned [`MatchReport`]; remaining work proceeds best-effort.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Datelike as _, Duration, Utc};
use rand::{SeedableRng as _, rngs::StdRng};
use serde::Serialize;

use crate::{
  message, pairing,
  service::Notifier,
  stats::PairingRecord,
  store::{CHAT_CREDENTIAL, PairingLedger, ParticipantStore, SecretStore},
};

/// Summary of one matching run, returned to the trigger endpoint.
#[derive(Debug, Serialize)]
pub struct MatchReport {
  pub eligible:           usize,
  pub pairs_made:         u32,
  pub had_odd_one_out:    bool,
  pub skip_flags_cleared: usize,
  pub errors:             Vec<String>,
}

/// The matching engine. One instance lives for the whole process; its rng is
/// seeded once at construction, so successive runs draw fresh randomness.
pub struct Matchmaker<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  rng:      Mutex<StdRng>,
}

impl<S, N> Matchmaker<S, N>
where
  S: ParticipantStore + PairingLedger + SecretStore,
  N: Notifier,
{
  /// `seed` pins the shuffle for deterministic tests; production passes
  /// `None` and seeds from the OS.
  pub fn new(store: Arc<S>, notifier: Arc<N>, seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_os_rng(),
    };
    Self { store, notifier, rng: Mutex::new(rng) }
  }

  /// Run one daily matching round.
  pub async fn run(&self) -> MatchReport {
    let mut errors = Vec::new();

    let tomorrow = (Utc::now() + Duration::days(1)).weekday();

    let eligible = match self.store.list_eligible_for(tomorrow).await {
      Ok(list) => list,
      Err(e) => {
        tracing::warn!("could not list eligible participants: {e}");
        errors.push(format!("list eligible: {e}"));
        Vec::new()
      }
    };

    let skippers = match self.store.list_skipping().await {
      Ok(list) => list,
      Err(e) => {
        tracing::warn!("could not list skipping participants: {e}");
        errors.push(format!("list skipping: {e}"));
        Vec::new()
      }
    };

    // A skip applies to exactly one day; reset every flag we saw.
    let mut skip_flags_cleared = 0;
    for skipper in &skippers {
      match self.store.clear_skip_flag(&skipper.id).await {
        Ok(()) => skip_flags_cleared += 1,
        Err(e) => {
          tracing::warn!(id = %skipper.id, "could not clear skip flag: {e}");
          errors.push(format!("clear skip for {}: {e}", skipper.id));
        }
      }
    }

    if eligible.is_empty() {
      tracing::info!("no one is signed up to pair tomorrow; no matches made");
      return MatchReport {
        eligible: 0,
        pairs_made: 0,
        had_odd_one_out: false,
        skip_flags_cleared,
        errors,
      };
    }

    // At-least-attempt policy: a failed credential fetch is logged and the
    // run continues with whatever value we have.
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

    let eligible_count = eligible.len();
    let drawn = {
      let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
      pairing::draw(eligible, &mut *rng)
    };

    if let Some(odd) = &drawn.odd_one_out {
      tracing::info!(email = %odd.email, "odd roster size; one person sits out");
      if let Err(e) = self
        .notifier
        .send_direct_message(
          &credential,
          std::slice::from_ref(&odd.email),
          message::ODD_ONE_OUT,
        )
        .await
      {
        tracing::warn!(email = %odd.email, "could not send odd-one-out message: {e}");
        errors.push(format!("notify {}: {e}", odd.email));
      }
    }

    for (a, b) in &drawn.pairs {
      let recipients = [a.email.clone(), b.email.clone()];
      match self
        .notifier
        .send_direct_message(&credential, &recipients, message::MATCHED)
        .await
      {
        Ok(()) => tracing::info!("matched {} with {}", a.email, b.email),
        Err(e) => {
          tracing::warn!("could not notify {} and {}: {e}", a.email, b.email);
          errors.push(format!("notify {} and {}: {e}", a.email, b.email));
        }
      }
    }

    let pairs_made = drawn.pair_count();
    let entry = PairingRecord { recorded_at: Utc::now(), pair_count: pairs_made };
    if let Err(e) = self.store.record(entry).await {
      tracing::warn!("could not record the pairing stat: {e}");
      errors.push(format!("record stat: {e}"));
    }

    tracing::info!(pairs = pairs_made, "matching run complete");
    MatchReport {
      eligible: eligible_count,
      pairs_made,
      had_odd_one_out: drawn.odd_one_out.is_some(),
      skip_flags_cleared,
      errors,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::{participant::Participant, testing::{MemoryStore, RecordingNotifier}};

  fn fixture(n: usize) -> (Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::default());
    store.set_secret("chat", "api-key", "s3cret");
    for i in 0..n {
      store.insert(Participant::new(
        i.to_string(),
        format!("p{i}@example.com"),
        format!("P{i}"),
      ));
    }
    (store, Arc::new(RecordingNotifier::default()))
  }

  #[tokio::test]
  async fn empty_roster_has_no_side_effects_twice() {
    let (store, notifier) = fixture(0);
    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));

    for _ in 0..2 {
      let report = job.run().await;
      assert_eq!(report.eligible, 0);
      assert_eq!(report.pairs_made, 0);
      assert!(report.errors.is_empty());
    }
    assert!(notifier.direct_messages().is_empty());
    assert!(store.ledger_entries().is_empty());
  }

  #[tokio::test]
  async fn single_participant_gets_the_odd_one_out_message() {
    let (store, notifier) = fixture(1);
    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));

    let report = job.run().await;
    assert_eq!(report.pairs_made, 0);
    assert!(report.had_odd_one_out);

    let sent = notifier.direct_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["p0@example.com"]);
    assert_eq!(sent[0].text, message::ODD_ONE_OUT);

    // Pairing proceeded, so a zero-count record is written.
    let ledger = store.ledger_entries();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].pair_count, 0);
  }

  #[tokio::test]
  async fn four_participants_make_two_pairs() {
    let (store, notifier) = fixture(4);
    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));

    let report = job.run().await;
    assert_eq!(report.eligible, 4);
    assert_eq!(report.pairs_made, 2);
    assert!(!report.had_odd_one_out);

    let sent = notifier.direct_messages();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.recipients.len() == 2));
    assert!(sent.iter().all(|m| m.text == message::MATCHED));
    assert!(sent.iter().all(|m| m.credential == "s3cret"));

    assert_eq!(store.ledger_entries()[0].pair_count, 2);
  }

  #[tokio::test]
  async fn five_participants_make_two_pairs_and_one_odd_one_out() {
    let (store, notifier) = fixture(5);
    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));

    let report = job.run().await;
    assert_eq!(report.pairs_made, 2);
    assert!(report.had_odd_one_out);

    let sent = notifier.direct_messages();
    let odd: Vec<_> = sent.iter().filter(|m| m.text == message::ODD_ONE_OUT).collect();
    let matched: Vec<_> = sent.iter().filter(|m| m.text == message::MATCHED).collect();
    assert_eq!(odd.len(), 1);
    assert_eq!(odd[0].recipients.len(), 1);
    assert_eq!(matched.len(), 2);

    assert_eq!(store.ledger_entries()[0].pair_count, 2);
  }

  #[tokio::test]
  async fn skip_flags_are_cleared_even_for_unmatched_skippers() {
    let (store, notifier) = fixture(2);
    let mut skipper = Participant::new("9", "skip@example.com", "Skip");
    skipper.is_skipping_tomorrow = true;
    store.insert(skipper);

    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));
    let report = job.run().await;

    assert_eq!(report.skip_flags_cleared, 1);
    assert_eq!(report.pairs_made, 1); // the skipper was not eligible
    let all = store.all_participants();
    assert!(all.iter().all(|p| !p.is_skipping_tomorrow));
  }

  #[tokio::test]
  async fn same_seed_draws_the_same_pairs() {
    let (store_a, notifier_a) = fixture(8);
    let (store_b, notifier_b) = fixture(8);

    Matchmaker::new(store_a, notifier_a.clone(), Some(99)).run().await;
    Matchmaker::new(store_b, notifier_b.clone(), Some(99)).run().await;

    let recipients = |n: &RecordingNotifier| {
      n.direct_messages().iter().map(|m| m.recipients.clone()).collect::<Vec<_>>()
    };
    assert_eq!(recipients(&notifier_a), recipients(&notifier_b));
  }

  #[tokio::test]
  async fn send_failures_do_not_stop_the_run() {
    let (store, notifier) = fixture(4);
    notifier.fail_sends(true);

    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));
    let report = job.run().await;

    // Both sends were attempted and failed; the stat was still recorded.
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.pairs_made, 2);
    assert_eq!(store.ledger_entries().len(), 1);
  }

  #[tokio::test]
  async fn missing_credential_still_attempts_delivery() {
    let (store, notifier) = fixture(2);
    store.remove_secret("chat", "api-key");

    let job = Matchmaker::new(store.clone(), notifier.clone(), Some(1));
    let report = job.run().await;

    assert_eq!(report.errors.len(), 1);
    let sent = notifier.direct_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].credential, "");
  }
}
