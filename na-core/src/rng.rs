//! The random source. Every sampling call takes one of these explicitly;
//! nothing in the workspace keeps a global generator.

use rand::{RngCore, SeedableRng};
use rand_isaac::Isaac64Rng;

pub type Rand = Isaac64Rng;

pub fn seeded(seed: u64) -> Rand {
  Isaac64Rng::seed_from_u64(seed)
}

/// `count` independent generators derived from one seed. Stream `i` is
/// the same for a given seed no matter how many threads consume them.
pub fn substreams(seed: u64, count: usize) -> Vec<Rand> {
  let mut root = seeded(seed);
  (0..count)
    .map(|_| {
      let mut s = <Rand as SeedableRng>::Seed::default();
      root.fill_bytes(s.as_mut());
      Rand::from_seed(s)
    })
    .collect()
}
