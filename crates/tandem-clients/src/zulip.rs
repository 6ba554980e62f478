//! [`ZulipClient`] — the notification transport, speaking the Zulip
//! messages API.
//!
//! Authentication is HTTP basic auth with the bot's email and the api key
//! fetched per run from the secret store; the client itself holds no
//! credentials.

use tandem_core::service::Notifier;

use crate::{Error, Result};

pub struct ZulipClient {
  http:      reqwest::Client,
  base_url:  String,
  bot_email: String,
}

impl ZulipClient {
  pub fn new(base_url: impl Into<String>, bot_email: impl Into<String>) -> Self {
    Self {
      http:      reqwest::Client::new(),
      base_url:  base_url.into().trim_end_matches('/').to_string(),
      bot_email: bot_email.into(),
    }
  }

  async fn send(&self, credential: &str, form: &[(&str, &str)]) -> Result<()> {
    let url = format!("{}/api/v1/messages", self.base_url);
    let response = self
      .http
      .post(&url)
      .basic_auth(&self.bot_email, Some(credential))
      .form(form)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail: String =
        response.text().await.unwrap_or_default().chars().take(200).collect();
      return Err(Error::Status { endpoint: "messages", status, detail });
    }
    Ok(())
  }
}

impl Notifier for ZulipClient {
  type Error = Error;

  async fn send_direct_message(
    &self,
    credential: &str,
    recipients: &[String],
    text: &str,
  ) -> Result<()> {
    // `to` is a JSON array of addresses; one message reaches all of them.
    let to = serde_json::to_string(recipients).unwrap_or_default();
    self
      .send(credential, &[("type", "direct"), ("to", &to), ("content", text)])
      .await
  }

  async fn post_to_topic(
    &self,
    credential: &str,
    stream: &str,
    topic: &str,
    text: &str,
  ) -> Result<()> {
    self
      .send(
        credential,
        &[("type", "stream"), ("to", stream), ("topic", topic), ("content", text)],
      )
      .await
  }
}
