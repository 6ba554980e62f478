//! Pairing statistics — one append-only record per matching run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many pairs one matching run produced. Never updated after the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRecord {
  pub recorded_at: DateTime<Utc>,
  pub pair_count:  u32,
}
