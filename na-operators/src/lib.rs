//! The linear pieces of the twin experiment: the forecast matrix and the
//! observation selection.

extern crate na_core as nac;
extern crate na_random as na_rand;
extern crate ndarray as nd;
extern crate rand;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub use forecast::{build_matrix, LinearForecastOperator};
pub use observation::{equi_spaced_integers, ObservationOperator};

pub mod forecast;
pub mod observation;
