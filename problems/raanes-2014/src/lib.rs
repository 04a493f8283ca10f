//! Linear advection twin experiment after Raanes et al. (2014): a damped
//! upwind shift of smooth random fields on a periodic 1000 point grid,
//! observed at 40 equi-spaced points every fifth step.

extern crate na_chronology as chrono;
extern crate na_core as nac;
extern crate na_operators as ops;
extern crate na_random as na_rand;
extern crate na_twin as twin;
extern crate rand;
extern crate serde;
extern crate util;

#[cfg(test)]
extern crate ndarray as nd;

use rand::Rng;
use serde::{Deserialize, Serialize};

use chrono::Chronology;
use na_rand::{Covariance, RandomVectorModel, SinusoidalSampler, SpectralCovariance};
use nac::{rng, Result};
use ops::{LinearForecastOperator, ObservationOperator};
use twin::{ExperimentAssembly, ForwardModel, ObservationModel};

pub use util::data::{simulate_twin, TwinData};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Raanes2014Setup {
  pub m: usize,
  pub p: usize,
  pub dt: f64,
  pub dk_obs: usize,
  pub horizon: f64,
  pub burn_in: f64,

  /// Variance of each observation error.
  pub obs_variance: f64,

  pub init_wnum: usize,
  /// Amplitude multiplying the initial sinusoidal field.
  pub init_scale: f64,

  pub noise_wnum: usize,
  /// Sample count for the process noise covariance, `2 * noise_wnum + 1`
  /// when unset.
  pub noise_samples: Option<usize>,
  /// Multiplies the (centered, normalized) spectral covariance.
  pub noise_scale: f64,

  pub damping: f64,
  pub wave_speed: f64,
  pub dx: f64,

  pub rand_seed: u64,
}
impl Default for Raanes2014Setup {
  fn default() -> Self {
    Raanes2014Setup {
      m: 1000,
      p: 40,
      dt: 1.0,
      dk_obs: 5,
      horizon: 500.0,
      burn_in: 60.0,

      obs_variance: 0.01,

      init_wnum: 25,
      init_scale: 5.0f64.sqrt() / 10.0,

      noise_wnum: 25,
      noise_samples: None,
      // 5 * (1/10)^2
      noise_scale: 0.05,

      damping: 0.98,
      wave_speed: -1.0,
      dx: 1.0,

      rand_seed: 1,
    }
  }
}

impl Raanes2014Setup {
  pub fn chronology(&self) -> Result<Chronology> {
    Chronology::new(self.dt, self.dk_obs, self.horizon, self.burn_in)
  }

  /// The spectral process noise covariance. Draws from `rng`.
  pub fn process_noise<R>(&self, rng: &mut R) -> Result<Covariance>
    where R: Rng + ?Sized,
  {
    let mut spec = SpectralCovariance::new(self.m, self.noise_wnum)
      .scale(self.noise_scale);
    if let Some(n) = self.noise_samples {
      spec = spec.samples(n);
    }
    spec.build(rng)
  }

  /// Full experiment with the spectral process noise.
  pub fn assemble<R>(&self, rng: &mut R) -> Result<ExperimentAssembly>
    where R: Rng + ?Sized,
  {
    let q = self.process_noise(rng)?;
    self.assemble_with_covariance(q)
  }

  /// Full experiment with a process noise covariance from elsewhere, e.g.
  /// `Covariance::dense` of a stored empirical matrix.
  pub fn assemble_with_covariance(&self, q: Covariance) -> Result<ExperimentAssembly> {
    let chronology = self.chronology()?;

    let f = LinearForecastOperator::new(self.m, self.wave_speed, self.dx,
                                        self.dt, self.damping)?;
    let forward = ForwardModel::new(f, RandomVectorModel::gaussian(q))?;

    let r = Covariance::scalar(self.p, self.obs_variance)?;
    let h = ObservationOperator::equi_spaced(self.m, self.p, RandomVectorModel::gaussian(r))?;

    let initial = SinusoidalSampler::new(self.m, self.init_wnum)?
      .into_model(self.init_scale)?;

    ExperimentAssembly::new(chronology, forward, ObservationModel::new(h), initial)
  }

  /// Seeds the generator from `rand_seed`, assembles and runs the truth.
  pub fn simulate(&self, report: bool) -> Result<(ExperimentAssembly, TwinData)> {
    let mut rand = rng::seeded(self.rand_seed);
    let assembly = self.assemble(&mut rand)?;
    let data = simulate_twin(&assembly, &mut rand, report)?;
    Ok((assembly, data))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::Array;

  fn small() -> Raanes2014Setup {
    Raanes2014Setup {
      m: 100,
      p: 10,
      horizon: 50.0,
      burn_in: 10.0,
      init_wnum: 5,
      noise_wnum: 5,
      ..Default::default()
    }
  }

  #[test]
  fn default_experiment() {
    let setup = Raanes2014Setup::default();
    let a = setup.assemble(&mut rng::seeded(setup.rand_seed)).unwrap();

    assert_eq!(a.dim(), 1000);
    assert_eq!(a.chronology().steps(), 500);
    assert_eq!(a.chronology().k_obs(), 88);
    assert_eq!(a.forward().model().courant(), -1.0);
    assert_eq!(a.forward().model().damping(), 0.98);

    let idx = a.observation().operator().indices();
    assert_eq!(idx.len(), 40);
    assert_eq!(idx[0], 12);
    assert_eq!(idx[39], 987);

    let q = a.forward().noise().covariance().unwrap();
    assert_eq!(q.factor().unwrap().dim(), (51, 1000));
  }

  #[test]
  fn default_process_noise_loses_one_direction_to_centering() {
    let setup = Raanes2014Setup {
      m: 200,
      ..Default::default()
    };
    let q = setup.process_noise(&mut rng::seeded(2)).unwrap();
    let dense = Covariance::dense(q.full().view()).unwrap();
    assert_eq!(dense.rank(), 2 * setup.noise_wnum);
  }

  #[test]
  fn loaded_covariance_replaces_spectral_noise() {
    let setup = small();
    let c = Array::eye(setup.m) * 0.02;
    let q = Covariance::dense(c.view()).unwrap();
    let a = setup.assemble_with_covariance(q).unwrap();
    assert_eq!(a.forward().noise().covariance().unwrap().rank(), setup.m);

    let wrong = Covariance::scalar(setup.m + 1, 0.02).unwrap();
    assert!(setup.assemble_with_covariance(wrong).unwrap_err().is_configuration());
  }

  #[test]
  fn small_run_is_reproducible() {
    let setup = small();
    let (a, x) = setup.simulate(false).unwrap();
    let (_, y) = setup.simulate(false).unwrap();

    assert_eq!(x.truth.dim(), (51, 100));
    assert_eq!(x.observations.dim(), (a.chronology().k_obs(), 10));
    assert_eq!(x.obs_steps, vec![15, 20, 25, 30, 35, 40, 45, 50]);
    assert_eq!(x.truth, y.truth);
    assert_eq!(x.observations, y.observations);

    let other = Raanes2014Setup { rand_seed: 2, ..small() };
    let (_, z) = other.simulate(false).unwrap();
    assert!(x.truth != z.truth);
  }

  #[test]
  fn bad_schedule_is_a_configuration_error() {
    let setup = Raanes2014Setup { burn_in: 600.0, ..Default::default() };
    assert!(setup.chronology().unwrap_err().is_configuration());
    let setup = Raanes2014Setup { dt: 2.0, ..small() };
    assert!(setup.assemble(&mut rng::seeded(1)).unwrap_err().is_configuration());
  }

  #[test]
  fn loads_from_json() {
    let setup: Raanes2014Setup = serde_json::from_str(r#"{ "m": 200, "p": 20, "rand_seed": 9 }"#)
      .unwrap();
    assert_eq!(setup.m, 200);
    assert_eq!(setup.p, 20);
    assert_eq!(setup.rand_seed, 9);
    assert_eq!(setup.dk_obs, 5);
    assert_eq!(setup.noise_samples, None);

    let huge = format!(r#"{{ "noise_wnum": {} }}"#, ::std::usize::MAX);
    let setup: Raanes2014Setup = serde_json::from_str(&huge).unwrap();
    assert!(setup.assemble(&mut rng::seeded(1)).unwrap_err().is_invalid_argument());

    let text = serde_json::to_string(&Raanes2014Setup::default()).unwrap();
    let back: Raanes2014Setup = serde_json::from_str(&text).unwrap();
    assert_eq!(back, Raanes2014Setup::default());
  }
}
