//! Trigger handlers — one per scheduled job.
//!
//! Each handler is a thin shell: check the maintenance override, run the
//! job, and return its report. Job-level failures are already collected into
//! the report; a trigger only fails outright when the scheduler marker is
//! missing.

use axum::{
  Json,
  extract::State,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tandem_core::{
  service::{CohortDirectory, Notifier},
  store::{PairingLedger, ParticipantStore, ReviewStore, SecretStore},
};

use crate::{AppState, cron::CronTriggered};

/// `Some(response)` when the operator has switched the service off.
fn maintenance_gate<S, N, D>(state: &AppState<S, N, D>) -> Option<Response> {
  if state.config.maintenance {
    tracing::warn!("maintenance mode is on; trigger acknowledged but not run");
    Some(Json(json!({ "status": "maintenance" })).into_response())
  } else {
    None
  }
}

pub async fn matchmake<S, N, D>(
  _cron: CronTriggered,
  State(state): State<AppState<S, N, D>>,
) -> Response
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore + 'static,
  N: Notifier + 'static,
  D: CohortDirectory + 'static,
{
  if let Some(response) = maintenance_gate(&state) {
    return response;
  }
  let report = state.matchmaker.run().await;
  Json(json!({ "status": "ok", "report": report })).into_response()
}

pub async fn endofbatch<S, N, D>(
  _cron: CronTriggered,
  State(state): State<AppState<S, N, D>>,
) -> Response
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore + 'static,
  N: Notifier + 'static,
  D: CohortDirectory + 'static,
{
  if let Some(response) = maintenance_gate(&state) {
    return response;
  }
  let report = state.lifecycle.run().await;
  Json(json!({ "status": "ok", "report": report })).into_response()
}

pub async fn checkin<S, N, D>(
  _cron: CronTriggered,
  State(state): State<AppState<S, N, D>>,
) -> Response
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore + 'static,
  N: Notifier + 'static,
  D: CohortDirectory + 'static,
{
  if let Some(response) = maintenance_gate(&state) {
    return response;
  }
  let report = state.checkin.run().await;
  Json(json!({ "status": "ok", "report": report })).into_response()
}

pub async fn welcome<S, N, D>(
  _cron: CronTriggered,
  State(state): State<AppState<S, N, D>>,
) -> Response
where
  S: ParticipantStore + PairingLedger + ReviewStore + SecretStore + 'static,
  N: Notifier + 'static,
  D: CohortDirectory + 'static,
{
  if let Some(response) = maintenance_gate(&state) {
    return response;
  }
  let report = state.announcer.run().await;
  Json(json!({ "status": "ok", "report": report })).into_response()
}
