extern crate na_chronology as chrono;
extern crate na_core as nac;
extern crate na_twin as twin;
extern crate ndarray as nd;
extern crate pbr;
extern crate rand;

#[cfg(test)]
extern crate na_operators as ops;
#[cfg(test)]
extern crate na_random as na_rand;

use nd::{ArrayView, Ix1, Ix2};

pub mod data;
pub mod progress;

/// A simulated reference run: the trajectory and what was seen of it.
pub trait ModelTruth<E> {
  fn times(&self) -> ArrayView<E, Ix1>;
  fn truth(&self) -> ArrayView<E, Ix2>;
  fn obs_times(&self) -> ArrayView<E, Ix1>;
  fn observations(&self) -> ArrayView<E, Ix2>;
}
