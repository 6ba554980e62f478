//! The cohort welcome announcement, gated to the second week of a batch.
//!
//! Week one is left quiet: people are still in orientation and have not had
//! time to think about projects yet.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  message,
  service::{CohortDirectory, Notifier},
  store::{CHAT_CREDENTIAL, COHORT_CREDENTIAL, SecretStore},
};

/// Summary of one announcer run.
#[derive(Debug, Serialize)]
pub struct AnnounceReport {
  pub second_week: bool,
  pub posted:      bool,
  pub errors:      Vec<String>,
}

pub struct CohortAnnouncer<S, D, N> {
  store:        Arc<S>,
  directory:    Arc<D>,
  notifier:     Arc<N>,
  stream:       String,
  topic:        String,
  /// When false (the default), a second-week hit is logged but nothing is
  /// published.
  post_welcome: bool,
}

impl<S, D, N> CohortAnnouncer<S, D, N>
where
  S: SecretStore,
  D: CohortDirectory,
  N: Notifier,
{
  pub fn new(
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    stream: impl Into<String>,
    topic: impl Into<String>,
    post_welcome: bool,
  ) -> Self {
    Self {
      store,
      directory,
      notifier,
      stream: stream.into(),
      topic: topic.into(),
      post_welcome,
    }
  }

  /// Check the week gate and (when enabled) publish the welcome broadcast.
  /// Mutates no state either way.
  pub async fn run(&self) -> AnnounceReport {
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

    let second_week = match self.directory.is_second_week(&token).await {
      Ok(flag) => flag,
      Err(e) => {
        tracing::warn!("could not check the cohort week: {e}");
        errors.push(format!("week check: {e}"));
        false
      }
    };

    if !second_week {
      tracing::info!("not the second week of a cohort; no welcome posted");
      return AnnounceReport { second_week: false, posted: false, errors };
    }

    if !self.post_welcome {
      tracing::info!("second week of a cohort; welcome post is disabled, logging only");
      return AnnounceReport { second_week: true, posted: false, errors };
    }

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
      .post_to_topic(&credential, &self.stream, &self.topic, &message::welcome_post())
      .await
    {
      Ok(()) => {
        tracing::info!(stream = %self.stream, "welcome broadcast posted");
        true
      }
      Err(e) => {
        tracing::warn!("could not post the welcome broadcast: {e}");
        errors.push(format!("post welcome: {e}"));
        false
      }
    };

    AnnounceReport { second_week: true, posted, errors }
  }
}
