//! Column encodings and raw row types.

use chrono::{DateTime, Utc, Weekday};
use tandem_core::participant::{Participant, ParticipantId};

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "monday",
    Weekday::Tue => "tuesday",
    Weekday::Wed => "wednesday",
    Weekday::Thu => "thursday",
    Weekday::Fri => "friday",
    Weekday::Sat => "saturday",
    Weekday::Sun => "sunday",
  }
}

fn weekday_from_name(name: &str) -> Result<Weekday> {
  match name {
    "monday" => Ok(Weekday::Mon),
    "tuesday" => Ok(Weekday::Tue),
    "wednesday" => Ok(Weekday::Wed),
    "thursday" => Ok(Weekday::Thu),
    "friday" => Ok(Weekday::Fri),
    "saturday" => Ok(Weekday::Sat),
    "sunday" => Ok(Weekday::Sun),
    other => Err(Error::UnknownWeekday(other.to_string())),
  }
}

/// JSON array of lowercase day names, e.g. `["monday","friday"]`.
pub fn encode_schedule(schedule: &[Weekday]) -> Result<String> {
  let names: Vec<&str> = schedule.iter().copied().map(weekday_name).collect();
  Ok(serde_json::to_string(&names)?)
}

pub fn decode_schedule(s: &str) -> Result<Vec<Weekday>> {
  let names: Vec<String> = serde_json::from_str(s)?;
  names.iter().map(|name| weekday_from_name(name)).collect()
}

/// A `participants` row as read straight out of SQLite.
pub struct RawParticipant {
  pub participant_id:       String,
  pub email:                String,
  pub display_name:         String,
  pub is_subscribed:        bool,
  pub schedule:             String,
  pub is_skipping_tomorrow: bool,
  pub currently_in_cohort:  bool,
}

impl RawParticipant {
  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      id:                   ParticipantId::new(self.participant_id),
      email:                self.email,
      display_name:         self.display_name,
      is_subscribed:        self.is_subscribed,
      schedule:             decode_schedule(&self.schedule)?,
      is_skipping_tomorrow: self.is_skipping_tomorrow,
      currently_in_cohort:  self.currently_in_cohort,
    })
  }
}
