//! [`CohortClient`] — the cohort roster service.
//!
//! Answers two questions: who is active in the cohort right now, and is this
//! the second week of the current batch.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tandem_core::service::CohortDirectory;

use crate::{Error, Result};

pub struct CohortClient {
  http:     reqwest::Client,
  base_url: String,
}

#[derive(Debug, Deserialize)]
struct Profile {
  email: String,
}

#[derive(Debug, Deserialize)]
struct Batch {
  start_date: NaiveDate,
}

/// The second week covers days 7 through 13 after the batch start.
fn is_day_in_second_week(start: NaiveDate, today: NaiveDate) -> bool {
  let days = (today - start).num_days();
  (7..14).contains(&days)
}

impl CohortClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      http:     reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  async fn get_json<T: serde::de::DeserializeOwned>(
    &self,
    endpoint: &'static str,
    credential: &str,
  ) -> Result<T> {
    let url = format!("{}/api/v1/{endpoint}", self.base_url);
    let response = self
      .http
      .get(&url)
      .query(&[("access_token", credential)])
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail: String =
        response.text().await.unwrap_or_default().chars().take(200).collect();
      return Err(Error::Status { endpoint, status, detail });
    }
    Ok(response.json().await?)
  }
}

impl CohortDirectory for CohortClient {
  type Error = Error;

  async fn active_addresses(&self, credential: &str) -> Result<HashSet<String>> {
    let profiles: Vec<Profile> = self.get_json("profiles", credential).await?;
    Ok(profiles.into_iter().map(|p| p.email).collect())
  }

  async fn is_second_week(&self, credential: &str) -> Result<bool> {
    // Batches come newest-first; the head is the current one.
    let batches: Vec<Batch> = self.get_json("batches", credential).await?;
    let Some(current) = batches.first() else {
      return Ok(false);
    };
    Ok(is_day_in_second_week(current.start_date, Utc::now().date_naive()))
  }
}
