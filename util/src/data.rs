use nd::{s, Array, ArrayView, Axis, Ix1, Ix2};
use rand::Rng;

use chrono::Tick;
use nac::Result;
use twin::{Dynamics, ExperimentAssembly, ForwardModel};

use crate::progress::ReportingIterator;
use crate::ModelTruth;

/// Output of one twin run. Row `k` of `truth` is the state at `times[k]`,
/// row `i` of `observations` was taken at `obs_times[i]`.
#[derive(Debug, Clone)]
pub struct TwinData {
  pub times: Array<f64, Ix1>,
  pub truth: Array<f64, Ix2>,
  pub obs_steps: Vec<usize>,
  pub obs_times: Array<f64, Ix1>,
  pub observations: Array<f64, Ix2>,
  pub burn_in_steps: usize,
}

impl TwinData {
  /// Truth from the end of burn-in on.
  pub fn recorded(&self) -> ArrayView<f64, Ix2> {
    self.truth.slice(s![self.burn_in_steps.., ..])
  }
  /// Truth at the observation steps, one row per observation.
  pub fn observed_truth(&self) -> Array<f64, Ix2> {
    self.truth.select(Axis(0), &self.obs_steps[..])
  }
}

impl ModelTruth<f64> for TwinData {
  fn times(&self) -> ArrayView<f64, Ix1> { self.times.view() }
  fn truth(&self) -> ArrayView<f64, Ix2> { self.truth.view() }
  fn obs_times(&self) -> ArrayView<f64, Ix1> { self.obs_times.view() }
  fn observations(&self) -> ArrayView<f64, Ix2> { self.observations.view() }
}

/// Runs the truth through the whole schedule and observes it.
///
/// The initial state is one draw from the initial-condition model. Each
/// step goes through the noisy forward model; at observation steps the new
/// state is observed with noise.
pub fn simulate_twin<M, R>(assembly: &ExperimentAssembly<M>, rng: &mut R,
                           report: bool) -> Result<TwinData>
  where M: Dynamics,
        R: Rng + ?Sized,
{
  let chrono = assembly.chronology();
  let forward = assembly.forward();
  let observation = assembly.observation();

  let steps = chrono.steps();
  let mut truth = Array::zeros((steps + 1, assembly.dim()));
  let mut observations = Array::zeros((chrono.k_obs(), observation.p()));

  let mut x = assembly.initial().sample(1, rng)?;
  truth.row_mut(0).assign(&x.row(0));

  let ticks = ReportingIterator::new(chrono.ticker(), "truth", report);
  for tick in ticks {
    x = forward.step_noisy(x.view(), tick.t - tick.dt, tick.dt, rng)?;
    truth.row_mut(tick.k).assign(&x.row(0));

    if let Some(k_obs) = tick.k_obs {
      let y = observation.observe_noisy(x.view(), rng)?;
      observations.row_mut(k_obs).assign(&y.row(0));
    }
  }

  Ok(TwinData {
    times: chrono.times(),
    truth: truth,
    obs_steps: chrono.obs_steps(),
    obs_times: chrono.obs_times(),
    observations: observations,
    burn_in_steps: chrono.burn_in_steps(),
  })
}

/// Pushes every member of `ensemble` through the given ticks, with
/// process noise.
pub fn forecast_ensemble<M, I, R>(forward: &ForwardModel<M>,
                                  ensemble: Array<f64, Ix2>,
                                  ticks: I,
                                  rng: &mut R) -> Result<Array<f64, Ix2>>
  where M: Dynamics,
        I: IntoIterator<Item = Tick>,
        R: Rng + ?Sized,
{
  let mut e = ensemble;
  for tick in ticks {
    e = forward.step_noisy(e.view(), tick.t - tick.dt, tick.dt, rng)?;
  }
  Ok(e)
}
