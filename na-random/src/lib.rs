//! Random vectors: Gaussian draws with a prescribed covariance, custom
//! samplers, and the sinusoidal fields used to build spatially correlated
//! noise.

extern crate na_core as nac;
extern crate nla_factorize as nla;
extern crate ndarray as nd;
extern crate ndarray_rand as nd_rand;
extern crate rand;
extern crate rand_distr;
extern crate rayon;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub use covariance::{Covariance, Diagonal};
pub use model::{RandomVectorModel, Sampling, SamplingFn};
pub use sinusoidal::{SinusoidalSampler, SpectralCovariance};
pub use stats::{anomalies, empirical_covariance, sample_mean};

pub mod covariance;
pub mod model;
pub mod sinusoidal;
pub mod stats;
