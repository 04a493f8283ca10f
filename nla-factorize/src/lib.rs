
extern crate ndarray as nd;
extern crate num_traits;
extern crate thiserror;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub use cholesky::*;

pub mod cholesky;
