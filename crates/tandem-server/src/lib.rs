//! HTTP layer for the tandem pairing service.
//!
//! Exposes an axum [`Router`] with the four scheduler-triggered endpoints,
//! backed by any combination of storage backend, notification transport, and
//! cohort directory.

pub mod cron;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::post};
use serde::Deserialize;
use tandem_core::{
  announce::CohortAnnouncer,
  checkin::CheckinReporter,
  lifecycle::{BatchLifecycle, OffboardingMode},
  matchmaker::Matchmaker,
  service::{CohortDirectory, Notifier},
  store::{PairingLedger, ParticipantStore, ReviewStore, SecretStore},
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// Base URL of the chat platform, e.g. `https://example.zulipchat.com`.
  pub chat_base_url:   String,
  /// The bot account the notification transport authenticates as.
  pub bot_email:       String,
  /// Base URL of the cohort roster API.
  pub roster_base_url: String,

  pub checkin_stream: String,
  pub checkin_topic:  String,
  pub welcome_stream: String,
  pub welcome_topic:  String,

  /// What the lifecycle job does with departed participants.
  #[serde(default)]
  pub offboarding:  OffboardingMode,
  /// Whether the second-week announcement is actually published.
  #[serde(default)]
  pub post_welcome: bool,
  /// Operational override: acknowledge triggers but run nothing.
  #[serde(default)]
  pub maintenance:  bool,
  /// Pins the shuffle; only meant for tests and debugging.
  #[serde(default)]
  pub rng_seed:     Option<u64>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers: the four jobs, wired
/// once at startup.
pub struct AppState<S, N, D> {
  pub matchmaker: Arc<Matchmaker<S, N>>,
  pub lifecycle:  Arc<BatchLifecycle<S, D, N>>,
  pub checkin:    Arc<CheckinReporter<S, N>>,
  pub announcer:  Arc<CohortAnnouncer<S, D, N>>,
  pub config:     Arc<ServerConfig>,
}

impl<S, N, D> Clone for AppState<S, N, D> {
  fn clone(&self) -> Self {
    Self {
      matchmaker: self.matchmaker.clone(),
      lifecycle:  self.lifecycle.clone(),
      checkin:    self.checkin.clone(),
      announcer:  self.announcer.clone(),
      config:     self.config.clone(),
    }
  }
}

impl<S, N, D> AppState<S, N, D>
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore,
  N: Notifier,
  D: CohortDirectory,
{
  pub fn new(
    store: Arc<S>,
    notifier: Arc<N>,
    directory: Arc<D>,
    config: ServerConfig,
  ) -> Self {
    let config = Arc::new(config);
    Self {
      matchmaker: Arc::new(Matchmaker::new(
        store.clone(),
        notifier.clone(),
        config.rng_seed,
      )),
      lifecycle:  Arc::new(BatchLifecycle::new(
        store.clone(),
        directory.clone(),
        notifier.clone(),
        config.offboarding,
      )),
      checkin:    Arc::new(CheckinReporter::new(
        store.clone(),
        notifier.clone(),
        config.checkin_stream.clone(),
        config.checkin_topic.clone(),
      )),
      announcer:  Arc::new(CohortAnnouncer::new(
        store,
        directory,
        notifier,
        config.welcome_stream.clone(),
        config.welcome_topic.clone(),
        config.post_welcome,
      )),
      config,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the trigger endpoints.
pub fn router<S, N, D>(state: AppState<S, N, D>) -> Router
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore + 'static,
  N: Notifier + 'static,
  D: CohortDirectory + 'static,
{
  Router::new()
    .route("/cron/match", post(handlers::matchmake::<S, N, D>))
    .route("/cron/endofbatch", post(handlers::endofbatch::<S, N, D>))
    .route("/cron/checkin", post(handlers::checkin::<S, N, D>))
    .route("/cron/welcome", post(handlers::welcome::<S, N, D>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
