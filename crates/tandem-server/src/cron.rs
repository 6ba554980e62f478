//! The trusted-scheduler-origin gate.
//!
//! Every trigger endpoint requires the scheduler marker header. Anything
//! else gets a bare 404, indistinguishable from an unknown path — no error
//! detail leaks to public traffic.

use axum::{
  extract::FromRequestParts,
  http::{StatusCode, request::Parts},
};

/// Header the internal scheduler stamps on every trigger request.
pub const CRON_HEADER: &str = "x-scheduler-cron";

/// Zero-size marker: present in the handler means the request came from the
/// scheduler.
#[derive(Debug)]
pub struct CronTriggered;

impl<S> FromRequestParts<S> for CronTriggered
where
  S: Send + Sync,
{
  type Rejection = StatusCode;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let from_scheduler = parts
      .headers
      .get(CRON_HEADER)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|v| v == "true");

    if from_scheduler {
      Ok(CronTriggered)
    } else {
      tracing::warn!(uri = %parts.uri, "trigger without the scheduler marker; replying not found");
      Err(StatusCode::NOT_FOUND)
    }
  }
}
