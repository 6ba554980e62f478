//! Participant — one subscriber of the pairing service.
//!
//! Participants are created and deleted by the (external) command layer; the
//! jobs in this crate only read them, flip the daily skip flag, and refresh
//! the cohort-presence snapshot.

use chrono::Weekday;

/// The chat platform's permanent user id. Opaque and stable; never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// One subscriber of the pairing service.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
  pub id:           ParticipantId,
  /// Contact address on the chat platform; also the key the cohort roster
  /// reports people under.
  pub email:        String,
  pub display_name: String,

  /// Owned by the command layer; consumed by eligibility queries.
  pub is_subscribed: bool,
  /// Weekdays this participant pairs on. Owned by the command layer.
  pub schedule:      Vec<Weekday>,

  /// Set by the command layer, cleared by the matchmaker after every run.
  /// A skip applies to exactly one day.
  pub is_skipping_tomorrow: bool,
  /// Snapshot of last-known cohort presence; refreshed by the lifecycle job
  /// for every participant on every run.
  pub currently_in_cohort:  bool,
}

impl Participant {
  /// A fresh subscriber with the default weekday schedule.
  pub fn new(
    id: impl Into<String>,
    email: impl Into<String>,
    display_name: impl Into<String>,
  ) -> Self {
    Self {
      id:                   ParticipantId::new(id),
      email:                email.into(),
      display_name:         display_name.into(),
      is_subscribed:        true,
      schedule:             vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
      ],
      is_skipping_tomorrow: false,
      currently_in_cohort:  false,
    }
  }

  pub fn pairs_on(&self, day: Weekday) -> bool {
    self.schedule.contains(&day)
  }
}
