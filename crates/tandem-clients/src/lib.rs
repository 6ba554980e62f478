//! HTTP clients for the remote collaborators: the chat platform's messaging
//! API ([`ZulipClient`]) and the cohort roster API ([`CohortClient`]).
//!
//! Both implement the corresponding `tandem-core` service traits, so the jobs
//! never see `reqwest` directly.

pub mod cohort;
pub mod error;
pub mod zulip;

pub use cohort::CohortClient;
pub use error::{Error, Result};
pub use zulip::ZulipClient;
