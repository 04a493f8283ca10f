//! Wires a chronology, a forward model, an observation model and an
//! initial condition into one validated experiment. Nothing here computes;
//! the records are what an assimilation method drives step by step.

extern crate na_chronology as chrono;
extern crate na_core as nac;
extern crate na_operators as ops;
extern crate na_random as na_rand;
extern crate ndarray as nd;
extern crate rand;

use nd::{Array, ArrayView, Ix2};
use rand::Rng;

use chrono::Chronology;
use na_rand::RandomVectorModel;
use nac::{Error, Result};
use ops::{LinearForecastOperator, ObservationOperator};

/// Deterministic part of a forward model, batched over ensemble rows.
pub trait Dynamics: Send + Sync {
  fn dim(&self) -> usize;
  /// The only step size `step` accepts, if the model is tied to one.
  fn fixed_dt(&self) -> Option<f64> { None }
  fn step(&self, x: ArrayView<f64, Ix2>, t: f64, dt: f64) -> Result<Array<f64, Ix2>>;
}

impl Dynamics for LinearForecastOperator {
  fn dim(&self) -> usize { LinearForecastOperator::dim(self) }
  fn fixed_dt(&self) -> Option<f64> { Some(self.dt()) }
  fn step(&self, x: ArrayView<f64, Ix2>, t: f64, dt: f64) -> Result<Array<f64, Ix2>> {
    LinearForecastOperator::step(self, x, t, dt)
  }
}

/// `x_{k+1} = step(x_k, t, dt) + sqrt(dt) q_k`, `q_k` drawn from `noise`,
/// so the noise covariance is per unit time.
#[derive(Debug, Clone)]
pub struct ForwardModel<M = LinearForecastOperator> {
  model: M,
  noise: RandomVectorModel,
}

impl<M> ForwardModel<M>
  where M: Dynamics,
{
  pub fn new(model: M, noise: RandomVectorModel) -> Result<ForwardModel<M>> {
    if noise.dim() != model.dim() {
      return Err(Error::config(format!("process noise has dimension {}, state has dimension {}",
                                       noise.dim(), model.dim())));
    }
    Ok(ForwardModel {
      model: model,
      noise: noise,
    })
  }

  pub fn dim(&self) -> usize { self.model.dim() }
  pub fn model(&self) -> &M { &self.model }
  pub fn noise(&self) -> &RandomVectorModel { &self.noise }

  pub fn step(&self, x: ArrayView<f64, Ix2>, t: f64, dt: f64) -> Result<Array<f64, Ix2>> {
    self.model.step(x, t, dt)
  }

  /// `step` plus one process noise draw per member.
  pub fn step_noisy<R>(&self, x: ArrayView<f64, Ix2>, t: f64, dt: f64,
                       rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    let mut next = self.step(x, t, dt)?;
    let mut q = self.noise.sample(next.nrows(), rng)?;
    if dt != 1.0 {
      q *= dt.sqrt();
    }
    next += &q;
    Ok(next)
  }
}

/// `y = H x + r`, `r` drawn from the operator's noise model.
#[derive(Debug, Clone)]
pub struct ObservationModel {
  operator: ObservationOperator,
}

impl ObservationModel {
  pub fn new(operator: ObservationOperator) -> ObservationModel {
    ObservationModel {
      operator: operator,
    }
  }

  pub fn p(&self) -> usize { self.operator.obs_dim() }
  pub fn operator(&self) -> &ObservationOperator { &self.operator }
  pub fn noise(&self) -> &RandomVectorModel { self.operator.noise() }

  pub fn observe(&self, x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
    self.operator.observe(x)
  }
  pub fn observe_noisy<R>(&self, x: ArrayView<f64, Ix2>, rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    self.operator.observe_noisy(x, rng)
  }
}

/// A validated twin experiment.
#[derive(Debug, Clone)]
pub struct ExperimentAssembly<M = LinearForecastOperator> {
  chronology: Chronology,
  forward: ForwardModel<M>,
  observation: ObservationModel,
  initial: RandomVectorModel,
}

impl<M> ExperimentAssembly<M>
  where M: Dynamics,
{
  pub fn new(chronology: Chronology,
             forward: ForwardModel<M>,
             observation: ObservationModel,
             initial: RandomVectorModel) -> Result<ExperimentAssembly<M>>
  {
    let m = forward.dim();
    let h = observation.operator();
    if h.state_dim() != m {
      return Err(Error::config(format!("observation operator expects dimension {}, state has {}",
                                       h.state_dim(), m)));
    }
    if let Some(&i) = h.indices().iter().find(|&&i| i >= m) {
      return Err(Error::config(format!("observed index {} out of range for m = {}", i, m)));
    }
    if observation.noise().dim() != observation.p() {
      return Err(Error::config(format!("observation noise has dimension {}, p = {}",
                                       observation.noise().dim(), observation.p())));
    }
    if initial.dim() != m {
      return Err(Error::config(format!("initial condition has dimension {}, state has {}",
                                       initial.dim(), m)));
    }
    if let Some(dt) = forward.model().fixed_dt() {
      if (dt - chronology.dt()).abs() > ::std::f64::EPSILON * dt.max(1.0) {
        return Err(Error::config(format!("forecast built for dt = {}, chronology steps by {}",
                                         dt, chronology.dt())));
      }
    }

    Ok(ExperimentAssembly {
      chronology: chronology,
      forward: forward,
      observation: observation,
      initial: initial,
    })
  }

  pub fn dim(&self) -> usize { self.forward.dim() }
  pub fn chronology(&self) -> &Chronology { &self.chronology }
  pub fn forward(&self) -> &ForwardModel<M> { &self.forward }
  pub fn observation(&self) -> &ObservationModel { &self.observation }
  pub fn initial(&self) -> &RandomVectorModel { &self.initial }
}

#[cfg(test)]
mod test {
  use super::*;
  use na_rand::Covariance;
  use nac::rng::seeded;

  fn gaussian(m: usize, var: f64) -> RandomVectorModel {
    RandomVectorModel::gaussian(Covariance::scalar(m, var).unwrap())
  }
  fn shift(m: usize, dt: f64) -> LinearForecastOperator {
    LinearForecastOperator::new(m, -1.0, 1.0, dt, 1.0).unwrap()
  }
  fn obs(m: usize, p: usize) -> ObservationModel {
    ObservationModel::new(ObservationOperator::equi_spaced(m, p, gaussian(p, 0.01)).unwrap())
  }

  #[test]
  fn assembles_consistent_pieces() {
    let chrono = Chronology::new(1.0, 5, 100.0, 10.0).unwrap();
    let fwd = ForwardModel::new(shift(50, 1.0), gaussian(50, 0.1)).unwrap();
    let a = ExperimentAssembly::new(chrono, fwd, obs(50, 5), gaussian(50, 1.0)).unwrap();
    assert_eq!(a.dim(), 50);
    assert_eq!(a.observation().p(), 5);
    assert_eq!(a.forward().noise().dim(), 50);
  }

  #[test]
  fn process_noise_must_match_state() {
    let err = ForwardModel::new(shift(50, 1.0), gaussian(49, 0.1)).unwrap_err();
    assert!(err.is_configuration());
  }

  #[test]
  fn rejects_mismatched_pieces() {
    let chrono = Chronology::new(1.0, 5, 100.0, 10.0).unwrap();
    let fwd = || ForwardModel::new(shift(50, 1.0), gaussian(50, 0.1)).unwrap();

    let err = ExperimentAssembly::new(chrono, fwd(), obs(60, 5), gaussian(50, 1.0)).unwrap_err();
    assert!(err.is_configuration());
    let err = ExperimentAssembly::new(chrono, fwd(), obs(50, 5), gaussian(40, 1.0)).unwrap_err();
    assert!(err.is_configuration());

    let half = Chronology::new(0.5, 5, 100.0, 10.0).unwrap();
    let err = ExperimentAssembly::new(half, fwd(), obs(50, 5), gaussian(50, 1.0)).unwrap_err();
    assert!(err.is_configuration());
  }

  #[test]
  fn noisy_step_adds_process_noise() {
    let fwd = ForwardModel::new(shift(8, 1.0), gaussian(8, 0.0)).unwrap();
    let x = nd::arr2(&[[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]]);
    let a = fwd.step_noisy(x.view(), 0.0, 1.0, &mut seeded(1)).unwrap();
    assert_eq!(a, fwd.step(x.view(), 0.0, 1.0).unwrap());
    assert_eq!(a[[0, 0]], 1.0);

    let fwd = ForwardModel::new(shift(8, 1.0), gaussian(8, 0.5)).unwrap();
    let b = fwd.step_noisy(x.view(), 0.0, 1.0, &mut seeded(1)).unwrap();
    let c = fwd.step_noisy(x.view(), 0.0, 1.0, &mut seeded(1)).unwrap();
    assert_eq!(b, c);
    assert!(b != a);
    assert!(fwd.step(x.view(), 0.0, 2.0).unwrap_err().is_configuration());
  }

  #[test]
  fn process_noise_scales_with_sqrt_dt() {
    let m = 4;
    let n = 20_000;
    let fwd = ForwardModel::new(shift(m, 0.25), gaussian(m, 1.0)).unwrap();
    let x: Array<f64, Ix2> = Array::zeros((n, m));
    let y = fwd.step_noisy(x.view(), 0.0, 0.25, &mut seeded(4)).unwrap();
    for col in y.columns() {
      let var = col.iter().map(|v| v * v).sum::<f64>() / n as f64;
      assert!((var - 0.25).abs() < 0.02, "variance {}", var);
    }
  }
}
