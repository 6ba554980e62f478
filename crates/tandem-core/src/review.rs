//! Review — a free-text testimonial, sampled at random for checkin digests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A testimonial submitted through the command layer. Read-only to the jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub content:      String,
  pub submitted_at: DateTime<Utc>,
}
