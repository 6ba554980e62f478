//! [`SqliteStore`] — the SQLite implementation of the storage traits.

use std::path::Path;

use chrono::{DateTime, Duration, Utc, Weekday};
use rusqlite::OptionalExtension as _;

use tandem_core::{
  participant::{Participant, ParticipantId},
  review::Review,
  stats::PairingRecord,
  store::{PairingLedger, ParticipantStore, ReviewStore, SecretStore},
};

use crate::{
  Error, Result,
  encode::{RawParticipant, decode_dt, encode_dt, encode_schedule},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Every tandem store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

fn raw_participant(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawParticipant> {
  Ok(RawParticipant {
    participant_id:       row.get(0)?,
    email:                row.get(1)?,
    display_name:         row.get(2)?,
    is_subscribed:        row.get(3)?,
    schedule:             row.get(4)?,
    is_skipping_tomorrow: row.get(5)?,
    currently_in_cohort:  row.get(6)?,
  })
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_participants(&self, sql: &'static str) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], raw_participant)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  /// Store or replace a secret. Written by the operator tooling, read by the
  /// jobs through [`SecretStore`].
  pub async fn put_secret(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
    let namespace = namespace.to_owned();
    let key = key.to_owned();
    let value = value.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO secrets (namespace, key, value) VALUES (?1, ?2, ?3)",
          rusqlite::params![namespace, key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Append a review. Reviews arrive through the command layer; the jobs
  /// only sample them.
  pub async fn add_review(&self, content: &str) -> Result<()> {
    let content = content.to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (content, submitted_at) VALUES (?1, ?2)",
          rusqlite::params![content, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ParticipantStore impl ───────────────────────────────────────────────────

impl ParticipantStore for SqliteStore {
  type Error = Error;

  async fn list_eligible_for(&self, day: Weekday) -> Result<Vec<Participant>> {
    let mut eligible = self
      .select_participants(
        "SELECT participant_id, email, display_name, is_subscribed, schedule, \
           is_skipping_tomorrow, currently_in_cohort \
         FROM participants \
         WHERE is_subscribed = 1 AND is_skipping_tomorrow = 0",
      )
      .await?;

    // The schedule lives in a JSON column; filter it after decoding.
    eligible.retain(|p| p.pairs_on(day));
    Ok(eligible)
  }

  async fn list_skipping(&self) -> Result<Vec<Participant>> {
    self
      .select_participants(
        "SELECT participant_id, email, display_name, is_subscribed, schedule, \
           is_skipping_tomorrow, currently_in_cohort \
         FROM participants \
         WHERE is_skipping_tomorrow = 1",
      )
      .await
  }

  async fn clear_skip_flag(&self, id: &ParticipantId) -> Result<()> {
    let id_str = id.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE participants SET is_skipping_tomorrow = 0 WHERE participant_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_all(&self) -> Result<Vec<Participant>> {
    self
      .select_participants(
        "SELECT participant_id, email, display_name, is_subscribed, schedule, \
           is_skipping_tomorrow, currently_in_cohort \
         FROM participants",
      )
      .await
  }

  async fn upsert(&self, participant: &Participant) -> Result<()> {
    let id_str = participant.id.as_str().to_owned();
    let email = participant.email.clone();
    let display_name = participant.display_name.clone();
    let is_subscribed = participant.is_subscribed;
    let schedule_str = encode_schedule(&participant.schedule)?;
    let is_skipping = participant.is_skipping_tomorrow;
    let in_cohort = participant.currently_in_cohort;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO participants (
             participant_id, email, display_name,
             is_subscribed, schedule, is_skipping_tomorrow, currently_in_cohort
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            email,
            display_name,
            is_subscribed,
            schedule_str,
            is_skipping,
            in_cohort,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, id: &ParticipantId) -> Result<()> {
    let id_str = id.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM participants WHERE participant_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PairingLedger impl ──────────────────────────────────────────────────────

impl PairingLedger for SqliteStore {
  type Error = Error;

  async fn record(&self, entry: PairingRecord) -> Result<()> {
    let at_str = encode_dt(entry.recorded_at);
    let count = entry.pair_count;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pairing_stats (recorded_at, pair_count) VALUES (?1, ?2)",
          rusqlite::params![at_str, count],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn trailing_weekly_total(&self, now: DateTime<Utc>) -> Result<u32> {
    let cutoff_str = encode_dt(now - Duration::days(7));

    let total: i64 = self
      .conn
      .call(move |conn| {
        let total = conn.query_row(
          "SELECT COALESCE(SUM(pair_count), 0) FROM pairing_stats WHERE recorded_at > ?1",
          rusqlite::params![cutoff_str],
          |row| row.get(0),
        )?;
        Ok(total)
      })
      .await?;

    Ok(total as u32)
  }
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = Error;

  async fn sample(&self) -> Result<Option<Review>> {
    let raw: Option<(String, String)> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT content, submitted_at FROM reviews ORDER BY RANDOM() LIMIT 1",
              [],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(content, at_str)| {
        Ok(Review { content, submitted_at: decode_dt(&at_str)? })
      })
      .transpose()
  }
}

// ─── SecretStore impl ────────────────────────────────────────────────────────

impl SecretStore for SqliteStore {
  type Error = Error;

  async fn get_secret(&self, namespace: &str, key: &str) -> Result<String> {
    let ns = namespace.to_owned();
    let k = key.to_owned();

    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM secrets WHERE namespace = ?1 AND key = ?2",
              rusqlite::params![ns, k],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    value.ok_or_else(|| Error::SecretNotFound {
      namespace: namespace.to_owned(),
      key:       key.to_owned(),
    })
  }
}
