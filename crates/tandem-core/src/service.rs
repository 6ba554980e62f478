//! Remote collaborator traits: the notification transport and the cohort
//! roster service.
//!
//! Implemented by `tandem-clients` against the real HTTP APIs; substituted
//! with recording doubles in job tests. Delivery is fire-and-log — callers
//! never retry a failed send.

use std::{collections::HashSet, future::Future};

/// Outbound chat messaging.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// One direct message addressed to every listed recipient at once.
  fn send_direct_message<'a>(
    &'a self,
    credential: &'a str,
    recipients: &'a [String],
    text: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Publish to a shared stream under the given topic.
  fn post_to_topic<'a>(
    &'a self,
    credential: &'a str,
    stream: &'a str,
    topic: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Who is currently active in the cohort, and where in the cohort we are.
pub trait CohortDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Contact addresses of everyone currently active in the cohort.
  fn active_addresses<'a>(
    &'a self,
    credential: &'a str,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + 'a;

  fn is_second_week<'a>(
    &'a self,
    credential: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
