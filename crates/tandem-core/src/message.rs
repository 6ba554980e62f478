//! Notification text: the fixed direct messages and the composed stream
//! posts.

use chrono::NaiveDate;

pub const ODD_ONE_OUT: &str = "Hi! An odd number of people signed up to pair \
today, which means one person goes without a partner, and the draw landed on \
you. I'm sorry! It isn't personal, the selection is entirely random. \
Hopefully it doesn't happen again too soon. Enjoy your day!";

pub const MATCHED: &str =
  "Hi you two! You've been matched for pairing today :)\n\nHave fun!";

pub const OFFBOARDED: &str = "Hi! You've been unsubscribed from pairing.\n\n\
This happens at the end of every batch. If you'd like to keep pairing, just \
send me a message that says `subscribe`.\n\nBe well!";

/// Shown in the checkin digest when no reviews have been submitted yet.
pub const REVIEW_FALLBACK: &str =
  "No reviews yet. Send me `review <your words>` to add one!";

/// The weekly checkin post: current date, subscriber count, trailing weekly
/// pair count, and one sampled review.
pub fn checkin_digest(
  date: NaiveDate,
  participants: usize,
  weekly_pairs: u32,
  review: &str,
) -> String {
  format!(
    "**{} checkin**\n\n\
     * Participants currently subscribed to pairing: {participants}\n\n\
     * Pairings made in the last week: {weekly_pairs}\n\n\
     **Randomly selected review**\n\n\
     * {review}",
    date.format("%B %-d, %Y"),
  )
}

/// The one-time welcome broadcast, posted during the second week of a cohort.
pub fn welcome_post() -> String {
  "Greetings! I'm the pairing bot, and my mission is to match people up to \
   work on things together.\n\n\
   **How to get started**\n\n\
   * Send me a private message with the word `subscribe` and I'll match you \
   with another subscriber each day.\n\n\
   * Don't want to pair every day? Set your days with `schedule tuesday \
   friday` and I'll only match you then.\n\n\
   * Send me `help` for the full list of commands.\n\n\
   Questions or feedback? Reply to this topic."
    .to_string()
}
