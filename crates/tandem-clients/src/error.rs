//! Error type for `tandem-clients`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{endpoint} returned {status}: {detail}")]
  Status {
    endpoint: &'static str,
    status:   reqwest::StatusCode,
    detail:   String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
