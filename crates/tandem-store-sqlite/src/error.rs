//! Error type for `tandem-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown weekday in stored schedule: {0:?}")]
  UnknownWeekday(String),

  #[error("secret not found: {namespace}/{key}")]
  SecretNotFound { namespace: String, key: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
