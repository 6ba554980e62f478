//! The pairing draw: shuffle a roster uniformly, peel off the odd one out,
//! and pair the rest in consecutive twos.
//!
//! Kept free of IO so the matchmaker's counting properties can be exercised
//! with a seeded rng.

use rand::{Rng, seq::SliceRandom};

use crate::participant::Participant;

/// The outcome of one draw over an eligible roster.
#[derive(Debug)]
pub struct Pairing {
  /// Pairs in shuffled order: positions (0,1), (2,3), … of the permutation.
  pub pairs:       Vec<(Participant, Participant)>,
  /// The single unpaired participant when the roster had odd length.
  pub odd_one_out: Option<Participant>,
}

impl Pairing {
  pub fn pair_count(&self) -> u32 {
    self.pairs.len() as u32
  }
}

/// Apply a uniform random permutation to `roster` and pair consecutive
/// entries.
///
/// The odd one out is removed *after* the shuffle, so when the roster has odd
/// length every participant is equally likely to sit out.
pub fn draw<R: Rng + ?Sized>(mut roster: Vec<Participant>, rng: &mut R) -> Pairing {
  roster.shuffle(rng);

  let odd_one_out = if roster.len() % 2 != 0 { roster.pop() } else { None };

  let mut pairs = Vec::with_capacity(roster.len() / 2);
  let mut iter = roster.into_iter();
  while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
    pairs.push((a, b));
  }

  Pairing { pairs, odd_one_out }
}
